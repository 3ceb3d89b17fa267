use tracing::trace;

use crate::matcher::ModuleReference;
use crate::patch::Replacement;
use crate::rules::RewriteRules;

/// The edits for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewritePlan {
    /// Sorted by descending start offset; never overlapping.
    pub text_replacements: Vec<Replacement>,
    /// Whole lines to put ahead of the file, top to bottom.
    pub leading_insertions: Vec<String>,
}

impl RewritePlan {
    pub fn is_empty(&self) -> bool {
        self.text_replacements.is_empty() && self.leading_insertions.is_empty()
    }
}

/// Resolve each reference against `rules` and collect the resulting edits.
pub fn plan_rewrites<R: RewriteRules + ?Sized>(
    references: &[ModuleReference],
    rules: &R,
) -> RewritePlan {
    let mut plan = RewritePlan::default();

    for reference in references {
        let path = reference.literal_text.as_str();

        match (rules.updated_location(path), reference.path_range()) {
            (Some(updated), Some(range)) if updated != path => {
                trace!(from = path, to = updated.as_str(), "rewriting module path");
                plan.text_replacements.push(Replacement {
                    range,
                    text: escape_in_literal(&updated, reference.quote),
                });
            }
            (Some(_), _) => trace!(path, "module path kept as is"),
            (None, _) => {}
        }

        let relocated = reference
            .bound_symbols()
            .iter()
            .filter_map(|b| b.imported_name.as_deref())
            .filter_map(|symbol| rules.relocated_import(path, symbol));
        for import in relocated {
            let line = format!("{}{}", reference.indent, import);
            if !plan.leading_insertions.contains(&line) {
                plan.leading_insertions.push(line);
            }
        }
    }

    // Back to front, so splicing one never moves the next.
    plan.text_replacements
        .sort_by(|a, b| b.range.start.cmp(&a.range.start));
    plan
}

/// `path` as it must be written between two `quote` characters.
fn escape_in_literal(path: &str, quote: char) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '\\' || c == quote {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
