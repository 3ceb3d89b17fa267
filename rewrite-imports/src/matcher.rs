//! Recognizing top-level statements that load a module by string literal.
//!
//! | Shape | Example |
//! |-------|---------|
//! | `Bare` | `import '@aws-cdk/aws-iam';` |
//! | `Namespace` | `import * as s3 from '@aws-cdk/aws-s3';`, `import cdk from '@aws-cdk/core';` |
//! | `Named` | `import { Stack, App as CdkApp } from '@aws-cdk/core';` |
//! | `RequireBinding` | `const s3 = require('@aws-cdk/aws-s3');`, `import s3 = require('@aws-cdk/aws-s3');` |
//! | `BareRequire` | `require('@aws-cdk/assert/jest');` |
//!
//! Anything else, including a `require` call whose only argument is not a
//! string literal, is not a module reference and is left alone.

use swc_core::{
    common::Spanned,
    ecma::ast::{
        Callee, Decl, Expr, ImportDecl, ImportSpecifier, Lit, ModuleDecl, ModuleExportName,
        ModuleItem, Pat, Stmt, Str, TsModuleRef,
    },
};
use tracing::trace;

use crate::patch::ByteRange;
use crate::syntax::SyntaxTree;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// A name bound by an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolBinding {
    pub local_name: String,
    /// Name the module exports the symbol under. Only named imports know it;
    /// namespace, default and require bindings alias the module itself.
    pub imported_name: Option<String>,
}

impl SymbolBinding {
    pub fn named(local_name: impl Into<String>, imported_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            imported_name: Some(imported_name.into()),
        }
    }

    pub fn alias(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            imported_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportShape {
    Bare,
    Namespace(SymbolBinding),
    Named(Vec<SymbolBinding>),
    RequireBinding(SymbolBinding),
    BareRequire,
}

impl ImportShape {
    pub fn bound_symbols(&self) -> &[SymbolBinding] {
        match self {
            ImportShape::Bare | ImportShape::BareRequire => &[],
            ImportShape::Namespace(b) | ImportShape::RequireBinding(b) => std::slice::from_ref(b),
            ImportShape::Named(bindings) => bindings,
        }
    }
}

/// One statement's reference to a module path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReference {
    pub shape: ImportShape,
    pub statement_range: ByteRange,
    /// The string literal, quotes included.
    pub literal_range: ByteRange,
    /// The module path the literal denotes, escape sequences resolved.
    pub literal_text: String,
    /// Quote character the literal is delimited with.
    pub quote: char,
    /// Leading whitespace of the line the statement starts on.
    pub indent: String,
}

impl ModuleReference {
    pub fn bound_symbols(&self) -> &[SymbolBinding] {
        self.shape.bound_symbols()
    }

    /// The literal without its quote characters, or `None` if the range is
    /// too short to hold both.
    pub fn path_range(&self) -> Option<ByteRange> {
        ByteRange::try_new(
            self.literal_range.start + 1,
            self.literal_range.end.checked_sub(1)?,
        )
    }
}

// -----------------------------------------------------------------------------
// Matching
// -----------------------------------------------------------------------------

/// Every module reference among `tree`'s top-level statements, in source order.
///
/// `source` must be the text `tree` was parsed from.
pub fn collect_references(tree: &SyntaxTree, source: &str) -> Vec<ModuleReference> {
    tree.statements()
        .iter()
        .filter_map(|item| match_statement(tree, source, item))
        .collect()
}

fn match_statement(tree: &SyntaxTree, source: &str, item: &ModuleItem) -> Option<ModuleReference> {
    let (shape, literal) = classify(item)?;

    let literal_range = tree.range_of(literal.span);
    // Opening and closing quote at least.
    if literal_range.len() < 2 {
        return None;
    }
    let quote = source.get(literal_range.as_range())?.chars().next()?;
    let statement_range = tree.range_of(item.span());
    let literal_text = literal.value.to_string();

    trace!(
        path = literal_text.as_str(),
        start = statement_range.start,
        "matched {:?}",
        shape
    );

    Some(ModuleReference {
        shape,
        statement_range,
        literal_range,
        literal_text,
        quote,
        indent: indent_at(source, statement_range.start),
    })
}

fn classify(item: &ModuleItem) -> Option<(ImportShape, &Str)> {
    match item {
        ModuleItem::ModuleDecl(ModuleDecl::Import(decl)) => Some((import_shape(decl), &*decl.src)),
        // import s3 = require('@aws-cdk/aws-s3');
        ModuleItem::ModuleDecl(ModuleDecl::TsImportEquals(decl)) => match &decl.module_ref {
            TsModuleRef::TsExternalModuleRef(ext) => Some((
                ImportShape::RequireBinding(SymbolBinding::alias(decl.id.sym.to_string())),
                &ext.expr,
            )),
            TsModuleRef::TsEntityName(_) => None,
        },
        // const s3 = require('@aws-cdk/aws-s3');
        ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))) => {
            let [decl] = var.decls.as_slice() else {
                return None;
            };
            let Pat::Ident(name) = &decl.name else {
                return None;
            };
            let literal = require_argument(decl.init.as_deref()?)?;
            Some((
                ImportShape::RequireBinding(SymbolBinding::alias(name.id.sym.to_string())),
                literal,
            ))
        }
        // require('@aws-cdk/assert/jest');
        ModuleItem::Stmt(Stmt::Expr(stmt)) => {
            Some((ImportShape::BareRequire, require_argument(&stmt.expr)?))
        }
        _ => None,
    }
}

fn import_shape(decl: &ImportDecl) -> ImportShape {
    let mut bindings: Vec<SymbolBinding> = decl.specifiers.iter().map(binding_of).collect();
    if decl
        .specifiers
        .iter()
        .any(|s| matches!(s, ImportSpecifier::Named(_)))
    {
        return ImportShape::Named(bindings);
    }
    // `import D, * as ns` is the only two-specifier form left; ns comes last.
    match bindings.pop() {
        Some(alias) => ImportShape::Namespace(alias),
        None => ImportShape::Bare,
    }
}

fn binding_of(spec: &ImportSpecifier) -> SymbolBinding {
    match spec {
        ImportSpecifier::Named(named) => {
            let local = named.local.sym.to_string();
            let imported = named
                .imported
                .as_ref()
                .map(|i| match i {
                    ModuleExportName::Ident(i) => i.sym.to_string(),
                    ModuleExportName::Str(s) => s.value.to_string(),
                })
                .unwrap_or_else(|| local.clone());
            SymbolBinding::named(local, imported)
        }
        ImportSpecifier::Default(def) => SymbolBinding::alias(def.local.sym.to_string()),
        ImportSpecifier::Namespace(ns) => SymbolBinding::alias(ns.local.sym.to_string()),
    }
}

/// The string literal passed to `require(...)`, if `expr` is exactly such a call.
fn require_argument(expr: &Expr) -> Option<&Str> {
    let Expr::Call(call) = expr else {
        return None;
    };
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    match &**callee {
        Expr::Ident(id) if id.sym.as_ref() == "require" => {}
        _ => return None,
    }
    match call.args.as_slice() {
        [arg] if arg.spread.is_none() => match &*arg.expr {
            Expr::Lit(Lit::Str(s)) => Some(s),
            _ => None,
        },
        _ => {
            trace!(args = call.args.len(), "skipping require with unexpected arguments");
            None
        }
    }
}

fn indent_at(source: &str, pos: usize) -> String {
    let before = source.get(..pos).unwrap_or_default();
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    source[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}
