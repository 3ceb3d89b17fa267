use std::path::PathBuf;

use thiserror::Error;

use crate::patch::ByteRange;

/// Everything that can make a rewrite (or its configuration) fail.
///
/// A statement the matcher does not recognize is never an error; only a file
/// that cannot be parsed at all, a plan that cannot be applied, or a bad rule
/// table ends up here.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The parser could not build a tree for the file.
    #[error("failed to parse {file} at byte {offset}: {message}")]
    Parse {
        file: String,
        message: String,
        offset: usize,
    },

    /// Two replacements cover overlapping text, or are not in descending order.
    #[error("overlapping edits at {first} and {second}")]
    OverlappingEdits { first: ByteRange, second: ByteRange },

    /// A replacement lies outside the source, or splits a character.
    #[error("edit {range} is out of bounds for source of length {len}")]
    OutOfBounds { range: ByteRange, len: usize },

    #[error("invalid rule table: {0}")]
    InvalidRules(String),

    #[error("malformed rule table: {0}")]
    RulesFormat(#[from] serde_json::Error),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type RewriteResult<T> = Result<T, RewriteError>;
