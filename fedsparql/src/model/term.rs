// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! RDF term model
//!
//! Terms are opaque to the federation core except for one operation:
//! rendering them into query text (VALUES tuples and pre-bound variables).
//!
//! Rendering rules:
//! - IRI → `<absolute-iri>`
//! - Literal → `"lexical"`, followed by `@lang` or `^^<datatype>`
//! - Blank node → not renderable, blank node labels are scoped to one document

use crate::exec::error::{FederationError, FederationResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Language tag or datatype carried by a literal
///
/// A literal carries at most one of the two; the enum makes the combination
/// unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiteralAnnotation {
    None,
    Language(String),
    Datatype(String),
}

/// RDF literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    lexical: String,
    annotation: LiteralAnnotation,
}

impl Literal {
    /// Plain literal without language or datatype
    pub fn simple(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            annotation: LiteralAnnotation::None,
        }
    }

    /// Language-tagged literal
    pub fn language_tagged(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            annotation: LiteralAnnotation::Language(language.into()),
        }
    }

    /// Typed literal
    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            annotation: LiteralAnnotation::Datatype(datatype.into()),
        }
    }

    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    pub fn language(&self) -> Option<&str> {
        match &self.annotation {
            LiteralAnnotation::Language(lang) => Some(lang),
            _ => None,
        }
    }

    pub fn datatype(&self) -> Option<&str> {
        match &self.annotation {
            LiteralAnnotation::Datatype(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn annotation(&self) -> &LiteralAnnotation {
        &self.annotation
    }

    /// Append the query-text form of this literal to `out`
    pub fn write_query_text(&self, out: &mut String) {
        out.push('"');
        escape_lexical(&self.lexical, out);
        out.push('"');
        match &self.annotation {
            LiteralAnnotation::None => {}
            LiteralAnnotation::Language(lang) => {
                out.push('@');
                out.push_str(lang);
            }
            LiteralAnnotation::Datatype(dt) => {
                out.push_str("^^<");
                out.push_str(dt);
                out.push('>');
            }
        }
    }
}

/// Escape a lexical form for use inside a double-quoted string
fn escape_lexical(lexical: &str, out: &mut String) {
    for c in lexical.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
}

/// RDF term bound to a variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Iri(String),
    Literal(Literal),
    BlankNode(String),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    pub fn literal(lexical: impl Into<String>) -> Self {
        Term::Literal(Literal::simple(lexical))
    }

    pub fn blank_node(label: impl Into<String>) -> Self {
        Term::BlankNode(label.into())
    }

    /// String value of the term (IRI, lexical form or blank node label)
    pub fn as_str(&self) -> &str {
        match self {
            Term::Iri(iri) => iri,
            Term::Literal(lit) => lit.lexical(),
            Term::BlankNode(label) => label,
        }
    }

    /// Append the query-text form of this term to `out`
    pub fn write_query_text(&self, out: &mut String) -> FederationResult<()> {
        match self {
            Term::Iri(iri) => {
                out.push('<');
                out.push_str(iri);
                out.push('>');
                Ok(())
            }
            Term::Literal(lit) => {
                lit.write_query_text(out);
                Ok(())
            }
            Term::BlankNode(label) => Err(FederationError::UnsupportedTerm(format!(
                "blank node _:{} cannot be sent to a remote endpoint",
                label
            ))),
        }
    }

    /// Query-text form of this term
    pub fn to_query_text(&self) -> FederationResult<String> {
        let mut out = String::new();
        self.write_query_text(&mut out)?;
        Ok(out)
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Term::Literal(lit)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::BlankNode(label) => write!(f, "_:{}", label),
            Term::Iri(_) | Term::Literal(_) => {
                let mut out = String::new();
                // Infallible for IRIs and literals
                let _ = self.write_query_text(&mut out);
                f.write_str(&out)
            }
        }
    }
}
