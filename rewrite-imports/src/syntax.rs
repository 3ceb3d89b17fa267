//! Parsing source text into an swc module whose spans map back to byte
//! offsets in the caller's original string.

use swc_core::{
    common::{sync::Lrc, BytePos, FileName, Globals, SourceMap, Span, Spanned, GLOBALS},
    ecma::{
        ast::{EsVersion, Module, ModuleItem},
        parser::{parse_file_as_module, EsSyntax, Syntax, TsSyntax},
    },
};
use tracing::warn;

use crate::error::{RewriteError, RewriteResult};
use crate::patch::ByteRange;

const BOM: char = '\u{feff}';

/// A parsed file. Owns the tree for the duration of one rewrite.
pub struct SyntaxTree {
    module: Module,
    // Position swc assigned to the first byte of the parsed text.
    start_pos: BytePos,
    // Bytes stripped from the front of the caller's text before parsing.
    offset: usize,
}

impl SyntaxTree {
    /// Parse `source`, picking the dialect from `file_name`'s extension.
    ///
    /// Diagnostics the parser recovers from are logged and ignored; only a
    /// file it cannot build a tree for is an error.
    pub fn parse(source: &str, file_name: &str) -> RewriteResult<Self> {
        let (body, offset) = match source.strip_prefix(BOM) {
            Some(rest) => (rest, BOM.len_utf8()),
            None => (source, 0),
        };

        let cm: Lrc<SourceMap> = Default::default();
        let fm = cm.new_source_file(
            Lrc::new(FileName::Custom(file_name.to_string())),
            body.to_string(),
        );
        let start_pos = fm.start_pos;

        let mut recovered = vec![];
        let parsed = GLOBALS.set(&Globals::new(), || {
            parse_file_as_module(
                &fm,
                syntax_for(file_name),
                EsVersion::EsNext,
                None,
                &mut recovered,
            )
        });

        for diag in &recovered {
            warn!(
                file = file_name,
                offset = to_offset(start_pos, offset, diag.span().lo),
                "recovered parse error: {}",
                diag.kind().msg()
            );
        }

        let module = parsed.map_err(|err| RewriteError::Parse {
            file: file_name.to_string(),
            offset: to_offset(start_pos, offset, err.span().lo),
            message: err.kind().msg().to_string(),
        })?;

        Ok(Self {
            module,
            start_pos,
            offset,
        })
    }

    /// Top-level statements, in source order.
    pub fn statements(&self) -> &[ModuleItem] {
        &self.module.body
    }

    /// Byte range of `span` in the original source text.
    pub fn range_of(&self, span: Span) -> ByteRange {
        ByteRange::new(
            to_offset(self.start_pos, self.offset, span.lo),
            to_offset(self.start_pos, self.offset, span.hi),
        )
    }
}

fn to_offset(start_pos: BytePos, offset: usize, pos: BytePos) -> usize {
    pos.0.saturating_sub(start_pos.0) as usize + offset
}

fn syntax_for(file_name: &str) -> Syntax {
    let ext = file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match ext {
        "js" | "jsx" | "mjs" | "cjs" => Syntax::Es(EsSyntax {
            jsx: true,
            decorators: true,
            decorators_before_export: true,
            ..Default::default()
        }),
        "tsx" => Syntax::Typescript(TsSyntax {
            tsx: true,
            decorators: true,
            ..Default::default()
        }),
        _ => Syntax::Typescript(TsSyntax {
            decorators: true,
            ..Default::default()
        }),
    }
}
