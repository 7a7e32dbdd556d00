//! Named expressions.
//!
//! A named expression associates a name with a compiled token stream and the
//! base position its relative references are anchored at. Globals live on
//! the document; sheet-locals live in per-sheet stores. Name lookup checks
//! the sheet scope before the global one.

use std::collections::HashMap;
use std::sync::Arc;

use crate::formula::FormulaTokens;
use crate::types::SrcAddress;

/// A named formula expression or named range.
#[derive(Debug)]
pub struct NamedExpression {
    pub name: String,
    /// Base position relative references are evaluated from.
    pub origin: SrcAddress,
    pub tokens: Arc<FormulaTokens>,
}

/// A scope's worth of named expressions, keyed by name.
#[derive(Debug, Default)]
pub struct NamedExpressions {
    entries: HashMap<String, NamedExpression>,
}

impl NamedExpressions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a new name or overwrite an existing one.
    pub fn define(&mut self, entry: NamedExpression) {
        self.entries.insert(entry.name.clone(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&NamedExpression> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
