//! Rewrites imports of the fragmented `@aws-cdk/*` packages to their
//! consolidated `aws-cdk-lib` locations.
//!
//! The rewrite is a text patch, not a re-print: only the module path inside
//! each recognized import's string literal changes, plus one import line at
//! the top of the file for every symbol that moved to a package of its own.
//!
//! ```
//! let out = rewrite_imports::rewrite_imports(
//!     "import * as ddb from '@aws-cdk/aws-dynamodb';\n",
//! )?;
//! assert_eq!(out, "import * as ddb from 'aws-cdk-lib/aws-dynamodb';\n");
//! # Ok::<(), rewrite_imports::RewriteError>(())
//! ```

use tracing::debug;

pub mod error;
pub mod matcher;
pub mod patch;
pub mod planner;
pub mod rules;
pub mod syntax;

pub use error::{RewriteError, RewriteResult};
pub use matcher::{collect_references, ImportShape, ModuleReference, SymbolBinding};
pub use patch::{apply_plan, ByteRange, Replacement};
pub use planner::{plan_rewrites, RewritePlan};
pub use rules::{Relocation, RewriteRules, RuleTable};
pub use syntax::SyntaxTree;

/// File name assumed when the caller has none; selects the TypeScript dialect.
pub const DEFAULT_FILE_NAME: &str = "index.ts";

// -----------------------------------------------------------------------------
// Rewriter
// -----------------------------------------------------------------------------

/// Parses, plans and patches one file at a time against a fixed rule set.
///
/// Holds no per-file state, so a single instance can be shared across
/// threads whenever `R` is `Sync`.
#[derive(Debug, Clone, Default)]
pub struct ImportRewriter<R = RuleTable> {
    rules: R,
}

impl<R: RewriteRules> ImportRewriter<R> {
    pub fn new(rules: R) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Compute the edits for `source` without applying them.
    pub fn plan(&self, source: &str, file_name: &str) -> RewriteResult<RewritePlan> {
        let tree = SyntaxTree::parse(source, file_name)?;
        let references = collect_references(&tree, source);
        let plan = plan_rewrites(&references, &self.rules);
        debug!(
            file = file_name,
            references = references.len(),
            replacements = plan.text_replacements.len(),
            insertions = plan.leading_insertions.len(),
            "planned rewrite"
        );
        Ok(plan)
    }

    /// Rewrite `source`. A file with nothing to rewrite comes back unchanged.
    pub fn rewrite(&self, source: &str, file_name: &str) -> RewriteResult<String> {
        let plan = self.plan(source, file_name)?;
        apply_plan(source, &plan)
    }
}

/// Rewrite `source` with the default rule table, treating it as TypeScript.
pub fn rewrite_imports(source: &str) -> RewriteResult<String> {
    ImportRewriter::<RuleTable>::default().rewrite(source, DEFAULT_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_then_apply_matches_rewrite() {
        let source = "import { Construct, Stack } from '@aws-cdk/core';\nimport '@aws-cdk/aws-iam';\n";
        let rewriter: ImportRewriter = ImportRewriter::default();
        let plan = rewriter.plan(source, "stack.ts").unwrap();
        assert_eq!(plan.text_replacements.len(), 2);
        assert_eq!(plan.leading_insertions.len(), 1);
        assert_eq!(
            apply_plan(source, &plan).unwrap(),
            rewriter.rewrite(source, "stack.ts").unwrap()
        );
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(rewrite_imports("").unwrap(), "");
    }

    #[test]
    fn test_rewriter_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ImportRewriter<RuleTable>>();
    }
}
