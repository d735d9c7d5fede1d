// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Binding rows
//!
//! A [`Binding`] is one row of variable-to-term assignments. Variables keep
//! their insertion order and names are unique within a row. A variable that
//! is absent from the row is unbound.

use crate::model::term::Term;
use std::collections::BTreeSet;
use std::fmt;

/// Set of variable names
pub type BindingNames = BTreeSet<String>;

/// One row of variable bindings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    entries: Vec<(String, Term)>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, term: Term) -> Self {
        self.insert(name, term);
        self
    }

    /// Bind `name` to `term`, replacing an existing value in place
    pub fn insert(&mut self, name: impl Into<String>, term: Term) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = term,
            None => self.entries.push((name, term)),
        }
    }

    /// Remove a variable, returning its previous value
    pub fn remove(&mut self, name: &str) -> Option<Term> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, name: &str) -> Option<&Term> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, term)| term)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bound variable names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Bound variable names as a set
    pub fn binding_names(&self) -> BindingNames {
        self.names().map(str::to_string).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }
}

impl FromIterator<(String, Term)> for Binding {
    fn from_iter<I: IntoIterator<Item = (String, Term)>>(iter: I) -> Self {
        let mut binding = Binding::new();
        for (name, term) in iter {
            binding.insert(name, term);
        }
        binding
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (name, term)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}={}", name, term)?;
        }
        f.write_str("]")
    }
}
