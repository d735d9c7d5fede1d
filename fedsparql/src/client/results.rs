// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! SPARQL 1.1 Query Results JSON decoding
//!
//! The response document is parsed eagerly, individual solutions are turned
//! into [`Binding`] rows lazily as the sequence is consumed.

use crate::exec::error::{FederationError, FederationResult};
use crate::exec::row_iterator::RowIterator;
use crate::model::{Binding, Literal, LiteralAnnotation, Term};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Media type requested from remote endpoints
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Term as it appears in a SPARQL JSON results document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonTerm {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

impl JsonTerm {
    pub fn into_term(self) -> FederationResult<Term> {
        match self.kind.as_str() {
            "uri" => Ok(Term::Iri(self.value)),
            "literal" | "typed-literal" => {
                let lit = match (self.lang, self.datatype) {
                    (Some(lang), _) => Literal::language_tagged(self.value, lang),
                    (None, Some(dt)) => Literal::typed(self.value, dt),
                    (None, None) => Literal::simple(self.value),
                };
                Ok(Term::Literal(lit))
            }
            "bnode" => Ok(Term::BlankNode(self.value)),
            other => Err(FederationError::UnsupportedTerm(format!(
                "unknown term type '{}' in result document",
                other
            ))),
        }
    }

    pub fn from_term(term: &Term) -> Self {
        match term {
            Term::Iri(iri) => Self {
                kind: "uri".to_string(),
                value: iri.clone(),
                lang: None,
                datatype: None,
            },
            Term::BlankNode(label) => Self {
                kind: "bnode".to_string(),
                value: label.clone(),
                lang: None,
                datatype: None,
            },
            Term::Literal(lit) => {
                let (lang, datatype) = match lit.annotation() {
                    LiteralAnnotation::None => (None, None),
                    LiteralAnnotation::Language(l) => (Some(l.clone()), None),
                    LiteralAnnotation::Datatype(d) => (None, Some(d.clone())),
                };
                Self {
                    kind: "literal".to_string(),
                    value: lit.lexical().to_string(),
                    lang,
                    datatype,
                }
            }
        }
    }
}

type RawSolution = HashMap<String, JsonTerm>;

#[derive(Debug, Default, Deserialize)]
struct Head {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ResultsBody {
    #[serde(default)]
    bindings: Vec<RawSolution>,
}

#[derive(Debug, Deserialize)]
struct ResultsDocument {
    #[serde(default)]
    head: Head,
    results: Option<ResultsBody>,
    boolean: Option<bool>,
}

/// Decode one raw solution, variables in `head.vars` order first
fn decode_solution(vars: &[String], mut raw: RawSolution) -> FederationResult<Binding> {
    let mut row = Binding::new();
    for var in vars {
        if let Some(term) = raw.remove(var) {
            row.insert(var.clone(), term.into_term()?);
        }
    }
    let mut rest: Vec<(String, JsonTerm)> = raw.into_iter().collect();
    rest.sort_by(|a, b| a.0.cmp(&b.0));
    for (var, term) in rest {
        row.insert(var, term.into_term()?);
    }
    Ok(row)
}

/// Raw result rows of one remote SELECT, before correlation with input rows
pub struct SolutionSequence {
    variables: Vec<String>,
    rows: Box<dyn Iterator<Item = FederationResult<Binding>> + Send>,
    count: usize,
}

impl SolutionSequence {
    /// Solutions produced in-process (used by non-HTTP services)
    pub fn from_bindings(variables: Vec<String>, rows: Vec<Binding>) -> Self {
        Self::from_results(variables, rows.into_iter().map(Ok).collect())
    }

    /// Solutions of which some may fail when consumed, in order
    pub fn from_results(variables: Vec<String>, rows: Vec<FederationResult<Binding>>) -> Self {
        let count = rows.len();
        Self {
            variables,
            rows: Box::new(rows.into_iter()),
            count,
        }
    }

    pub fn empty() -> Self {
        Self::from_bindings(Vec::new(), Vec::new())
    }

    /// Parse a SPARQL JSON results document
    ///
    /// A boolean document answers a tuple query with one empty solution
    /// (true) or none (false).
    pub fn from_json(body: &[u8]) -> FederationResult<Self> {
        let doc: ResultsDocument = serde_json::from_slice(body)?;
        if let Some(results) = doc.results {
            let vars = doc.head.vars;
            let count = results.bindings.len();
            let decode_vars = vars.clone();
            return Ok(Self {
                variables: vars,
                rows: Box::new(
                    results
                        .bindings
                        .into_iter()
                        .map(move |raw| decode_solution(&decode_vars, raw)),
                ),
                count,
            });
        }
        match doc.boolean {
            Some(true) => Ok(Self::from_bindings(Vec::new(), vec![Binding::new()])),
            Some(false) => Ok(Self::empty()),
            None => Err(FederationError::QueryExecution(
                "result document has neither 'results' nor 'boolean'".to_string(),
            )),
        }
    }

    /// Projected variables announced by the endpoint
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Number of solutions in the document
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Iterator for SolutionSequence {
    type Item = FederationResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }
}

impl RowIterator for SolutionSequence {
    fn size_hint_rows(&self) -> Option<usize> {
        Some(self.count)
    }
}

/// Parse the boolean of an ASK response document
pub fn boolean_from_json(body: &[u8]) -> FederationResult<bool> {
    let doc: ResultsDocument = serde_json::from_slice(body)?;
    doc.boolean.ok_or_else(|| {
        FederationError::QueryExecution("ASK response carries no 'boolean' field".to_string())
    })
}

/// Parse rows written as a JSON array of `{ "var": <JSON term> }` objects
pub fn bindings_from_json(json: &str) -> FederationResult<Vec<Binding>> {
    let raw: Vec<RawSolution> = serde_json::from_str(json)
        .map_err(|e| FederationError::Source(format!("Invalid bindings JSON: {}", e)))?;
    raw.into_iter()
        .map(|solution| decode_solution(&[], solution))
        .collect()
}

/// Render rows as a SPARQL JSON results document
pub fn bindings_to_json(variables: &[String], rows: &[Binding]) -> serde_json::Value {
    let bindings: Vec<serde_json::Value> = rows
        .iter()
        .map(|row| {
            let mut obj = serde_json::Map::new();
            for (name, term) in row.iter() {
                obj.insert(
                    name.to_string(),
                    serde_json::to_value(JsonTerm::from_term(term))
                        .unwrap_or(serde_json::Value::Null),
                );
            }
            serde_json::Value::Object(obj)
        })
        .collect();
    serde_json::json!({
        "head": { "vars": variables },
        "results": { "bindings": bindings },
    })
}
