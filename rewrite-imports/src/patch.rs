//! Byte-range splicing of a [`RewritePlan`] into the original source.
//!
//! Replacements are applied back-to-front so that each splice leaves the
//! offsets of the remaining (earlier) replacements valid. Leading insertions
//! do not depend on any offset and go in once all splices are done, ahead of
//! everything except a byte order mark and a `#!` interpreter line.

use std::fmt;

use crate::error::{RewriteError, RewriteResult};
use crate::planner::RewritePlan;

// -----------------------------------------------------------------------------
// Ranges
// -----------------------------------------------------------------------------

/// Half-open byte range `start..end` into a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            start <= end,
            "range start ({}) must be <= end ({})",
            start,
            end
        );
        ByteRange { start, end }
    }

    /// Like [`ByteRange::new`], but `None` instead of a panic when `start > end`.
    pub fn try_new(start: usize, end: usize) -> Option<Self> {
        (start <= end).then_some(ByteRange { start, end })
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Adjacent ranges (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &ByteRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &ByteRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub(crate) fn as_range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.start, self.end)
    }
}

/// Replace the text at `range` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub range: ByteRange,
    pub text: String,
}

// -----------------------------------------------------------------------------
// Application
// -----------------------------------------------------------------------------

/// Apply `plan` to `source` and return the new text.
///
/// The plan's replacements must be sorted by descending start offset and must
/// not overlap; the planner guarantees both. A plan that breaks either rule,
/// or that points outside `source` or into the middle of a character, is
/// rejected before any text is touched.
pub fn apply_plan(source: &str, plan: &RewritePlan) -> RewriteResult<String> {
    validate(source, plan)?;

    let mut text = source.to_string();
    for replacement in &plan.text_replacements {
        text.replace_range(replacement.range.as_range(), &replacement.text);
    }

    if plan.leading_insertions.is_empty() {
        return Ok(text);
    }

    let newline = line_ending(&text);
    let (head, body) = text.split_at(insertion_point(&text));
    let prefix_len: usize = plan
        .leading_insertions
        .iter()
        .map(|l| l.len() + newline.len())
        .sum();

    let mut out = String::with_capacity(prefix_len + text.len() + newline.len());
    out.push_str(head);
    // Interpreter line with nothing after it.
    if !head.is_empty() && !head.ends_with('\n') && head != BOM {
        out.push_str(newline);
    }
    for line in &plan.leading_insertions {
        out.push_str(line);
        out.push_str(newline);
    }
    out.push_str(body);
    Ok(out)
}

const BOM: &str = "\u{feff}";

/// Byte offset where leading insertions go: past a byte order mark and a
/// `#!` line, both of which must stay first.
fn insertion_point(text: &str) -> usize {
    let bom = if text.starts_with(BOM) { BOM.len() } else { 0 };
    if !text[bom..].starts_with("#!") {
        return bom;
    }
    text[bom..]
        .find('\n')
        .map_or(text.len(), |i| bom + i + 1)
}

/// The line terminator the first line of `text` uses.
fn line_ending(text: &str) -> &'static str {
    match text.find('\n') {
        Some(i) if text[..i].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

fn validate(source: &str, plan: &RewritePlan) -> RewriteResult<()> {
    let len = source.len();
    for replacement in &plan.text_replacements {
        let range = replacement.range;
        if range.end > len
            || !source.is_char_boundary(range.start)
            || !source.is_char_boundary(range.end)
        {
            return Err(RewriteError::OutOfBounds { range, len });
        }
    }

    // Descending order: every range must end at or before the start of the
    // range applied just before it.
    for pair in plan.text_replacements.windows(2) {
        let (later, earlier) = (pair[0].range, pair[1].range);
        if earlier.end > later.start {
            return Err(RewriteError::OverlappingEdits {
                first: earlier,
                second: later,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replacement(start: usize, end: usize, text: &str) -> Replacement {
        Replacement {
            range: ByteRange::new(start, end),
            text: text.to_string(),
        }
    }

    fn plan(replacements: Vec<Replacement>, insertions: &[&str]) -> RewritePlan {
        RewritePlan {
            text_replacements: replacements,
            leading_insertions: insertions.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_byte_range_overlap() {
        let a = ByteRange::new(0, 5);
        assert!(a.overlaps(&ByteRange::new(4, 8)));
        assert!(!a.overlaps(&ByteRange::new(5, 8)));
        assert!(a.contains(&ByteRange::new(1, 4)));
        assert!(!a.contains(&ByteRange::new(1, 6)));
        assert_eq!(a.len(), 5);
        assert!(ByteRange::new(3, 3).is_empty());
    }

    #[test]
    #[should_panic(expected = "must be <= end")]
    fn test_byte_range_rejects_inverted() {
        ByteRange::new(4, 2);
    }

    #[test]
    fn test_apply_descending_replacements() {
        let source = "require('a'); require('b');";
        let result = apply_plan(
            source,
            &plan(vec![replacement(23, 24, "bbb"), replacement(9, 10, "aaa")], &[]),
        )
        .unwrap();
        assert_eq!(result, "require('aaa'); require('bbb');");
    }

    #[test]
    fn test_apply_prepends_insertions_in_order() {
        let source = "body\n";
        let result = apply_plan(source, &plan(vec![], &["first", "  second"])).unwrap();
        assert_eq!(result, "first\n  second\nbody\n");
    }

    #[test]
    fn test_try_new() {
        assert_eq!(ByteRange::try_new(2, 4), Some(ByteRange::new(2, 4)));
        assert_eq!(ByteRange::try_new(4, 2), None);
    }

    #[test]
    fn test_insertions_follow_interpreter_line() {
        let source = "#!/usr/bin/env node\nbody\n";
        let result = apply_plan(source, &plan(vec![], &["first"])).unwrap();
        assert_eq!(result, "#!/usr/bin/env node\nfirst\nbody\n");
    }

    #[test]
    fn test_insertions_after_bare_interpreter_line() {
        let result = apply_plan("#!/bin/node", &plan(vec![], &["first"])).unwrap();
        assert_eq!(result, "#!/bin/node\nfirst\n");
    }

    #[test]
    fn test_insertions_follow_byte_order_mark() {
        let source = "\u{feff}#!/usr/bin/env node\r\nbody\r\n";
        let result = apply_plan(source, &plan(vec![], &["first"])).unwrap();
        assert_eq!(result, "\u{feff}#!/usr/bin/env node\r\nfirst\r\nbody\r\n");

        let result = apply_plan("\u{feff}body\n", &plan(vec![], &["first"])).unwrap();
        assert_eq!(result, "\u{feff}first\nbody\n");
    }

    #[test]
    fn test_insertions_reuse_crlf() {
        let source = "body\r\nmore\r\n";
        let result = apply_plan(source, &plan(vec![], &["first", "second"])).unwrap();
        assert_eq!(result, "first\r\nsecond\r\nbody\r\nmore\r\n");
    }

    #[test]
    fn test_empty_plan_is_identity() {
        let source = "const x = 1;\n";
        assert_eq!(apply_plan(source, &RewritePlan::default()).unwrap(), source);
    }

    #[test]
    fn test_adjacent_replacements_allowed() {
        let result = apply_plan(
            "abcdef",
            &plan(vec![replacement(3, 6, "X"), replacement(0, 3, "Y")], &[]),
        )
        .unwrap();
        assert_eq!(result, "YX");
    }

    #[test]
    fn test_overlapping_replacements_rejected() {
        let err = apply_plan(
            "abcdef",
            &plan(vec![replacement(2, 5, "X"), replacement(0, 3, "Y")], &[]),
        )
        .unwrap_err();
        assert!(matches!(err, RewriteError::OverlappingEdits { .. }));
    }

    #[test]
    fn test_ascending_order_rejected() {
        let err = apply_plan(
            "abcdef",
            &plan(vec![replacement(0, 1, "X"), replacement(4, 5, "Y")], &[]),
        )
        .unwrap_err();
        assert!(matches!(err, RewriteError::OverlappingEdits { .. }));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let err = apply_plan("abc", &plan(vec![replacement(1, 9, "X")], &[])).unwrap_err();
        match err {
            RewriteError::OutOfBounds { range, len } => {
                assert_eq!(range, ByteRange::new(1, 9));
                assert_eq!(len, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_split_character_rejected() {
        // 'é' is two bytes; offset 1 falls inside it.
        let err = apply_plan("é", &plan(vec![replacement(1, 2, "e")], &[])).unwrap_err();
        assert!(matches!(err, RewriteError::OutOfBounds { .. }));
    }
}
