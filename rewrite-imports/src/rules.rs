//! Where legacy modules went.
//!
//! [`RewriteRules`] is the seam the planner consults; [`RuleTable`] is the
//! stock implementation. Its default values describe the `@aws-cdk/*` to
//! `aws-cdk-lib` consolidation, and every field can be overridden from JSON.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{RewriteError, RewriteResult};

// -----------------------------------------------------------------------------
// Strategy
// -----------------------------------------------------------------------------

pub trait RewriteRules {
    /// New module path for `module_path`, or `None` to leave it alone.
    fn updated_location(&self, module_path: &str) -> Option<String>;

    /// Import statement to add when `symbol` (by exported name) is imported
    /// from `module_path` but now lives in a package of its own.
    fn relocated_import(&self, module_path: &str, symbol: &str) -> Option<String>;
}

impl<R: RewriteRules + ?Sized> RewriteRules for &R {
    fn updated_location(&self, module_path: &str) -> Option<String> {
        (**self).updated_location(module_path)
    }

    fn relocated_import(&self, module_path: &str, symbol: &str) -> Option<String> {
        (**self).relocated_import(module_path, symbol)
    }
}

// -----------------------------------------------------------------------------
// Rule table
// -----------------------------------------------------------------------------

/// One exported symbol that left `module` for `package`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relocation {
    pub module: String,
    pub symbol: String,
    pub package: String,
}

impl Relocation {
    pub fn import_statement(&self) -> String {
        format!("import {{ {} }} from '{}';", self.symbol, self.package)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleTable {
    /// Paths starting with this are candidates for rewriting.
    pub legacy_prefix: String,
    /// Paths that are never touched even though they carry the prefix.
    pub exemptions: BTreeSet<String>,
    /// The aggregator module that maps straight onto `consolidated_root`.
    pub root_module: String,
    pub consolidated_root: String,
    /// Paths that keep their current name.
    pub passthrough: BTreeSet<String>,
    pub relocations: Vec<Relocation>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            legacy_prefix: "@aws-cdk/".to_string(),
            exemptions: ["@aws-cdk/cloudformation-diff"]
                .into_iter()
                .map(String::from)
                .collect(),
            root_module: "@aws-cdk/core".to_string(),
            consolidated_root: "aws-cdk-lib".to_string(),
            passthrough: ["@aws-cdk/assert", "@aws-cdk/assert/jest"]
                .into_iter()
                .map(String::from)
                .collect(),
            relocations: vec![Relocation {
                module: "@aws-cdk/core".to_string(),
                symbol: "Construct".to_string(),
                package: "constructs".to_string(),
            }],
        }
    }
}

impl RuleTable {
    /// Parse a JSON rule table. Missing fields keep their default values.
    pub fn from_json_str(json: &str) -> RewriteResult<Self> {
        let table: RuleTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    pub fn load(path: &Path) -> RewriteResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| RewriteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Reject tables whose output could match them again, or that name
    /// empty modules.
    pub fn validate(&self) -> RewriteResult<()> {
        if self.legacy_prefix.is_empty() {
            return Err(RewriteError::InvalidRules(
                "legacyPrefix must not be empty".to_string(),
            ));
        }
        if self.consolidated_root.is_empty() {
            return Err(RewriteError::InvalidRules(
                "consolidatedRoot must not be empty".to_string(),
            ));
        }
        if self.consolidated_root.starts_with(&self.legacy_prefix) {
            return Err(RewriteError::InvalidRules(format!(
                "consolidatedRoot '{}' starts with legacyPrefix '{}'",
                self.consolidated_root, self.legacy_prefix
            )));
        }
        for r in &self.relocations {
            if r.module.is_empty() || r.symbol.is_empty() || r.package.is_empty() {
                return Err(RewriteError::InvalidRules(format!(
                    "incomplete relocation {:?}",
                    r
                )));
            }
        }
        Ok(())
    }
}

impl RewriteRules for RuleTable {
    fn updated_location(&self, module_path: &str) -> Option<String> {
        let suffix = module_path.strip_prefix(self.legacy_prefix.as_str())?;
        if self.exemptions.contains(module_path) {
            trace!(module_path, "exempt from rewriting");
            return None;
        }
        if module_path == self.root_module {
            return Some(self.consolidated_root.clone());
        }
        if self.passthrough.contains(module_path) {
            return Some(module_path.to_string());
        }
        Some(format!("{}/{}", self.consolidated_root, suffix))
    }

    fn relocated_import(&self, module_path: &str, symbol: &str) -> Option<String> {
        self.relocations
            .iter()
            .find(|r| r.module == module_path && r.symbol == symbol)
            .map(Relocation::import_statement)
    }
}
