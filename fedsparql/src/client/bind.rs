// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Pre-binding variables in query text
//!
//! The SPARQL protocol has no parameter binding, so bound variables are
//! substituted into the text. In the projection (everything before the first
//! `{`) a bound `?v` becomes `(<term> AS ?v)`; in the pattern it becomes the
//! term itself.

use crate::exec::error::{FederationError, FederationResult};
use crate::model::{Binding, BindingNames};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static BASE_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*BASE\s*<").expect("valid BASE pattern"));

/// Strings, IRIs and comments are matched whole, so a `?name` is only
/// recognized outside them
static QUERY_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"(?s)"""(?:\\.|[^\\])*?"""|'''(?:\\.|[^\\])*?'''"#,
        r#"|"(?:\\.|[^"\\\n\r])*"|'(?:\\.|[^'\\\n\r])*'"#,
        r#"|<[^<>"{}|^`\\\x00-\x20]*>"#,
        r"|#[^\n]*",
        r"|(?P<open>\{)",
        r"|[?$](?P<var>\w+)",
    ))
    .expect("valid query token pattern")
});

/// Substitute the values of `binding` for the variables the service declares
///
/// Variables not in `service_vars` are never touched, and neither is text
/// inside IRIs, string literals or comments. Blank nodes cannot be sent to a
/// remote endpoint and are left unbound.
pub fn apply_bindings(
    query: &str,
    binding: &Binding,
    service_vars: &BindingNames,
) -> FederationResult<String> {
    let applicable: HashMap<&str, String> = binding
        .iter()
        .filter(|(name, _)| service_vars.contains(*name))
        .filter_map(|(name, term)| match term.to_query_text() {
            Ok(text) => Some((name, text)),
            Err(_) => {
                log::debug!("Leaving ?{} unbound: {} is not renderable", name, term);
                None
            }
        })
        .collect();

    if applicable.is_empty() {
        return Ok(query.to_string());
    }

    let mut in_pattern = false;
    let bound = QUERY_TOKEN
        .replace_all(query, |caps: &Captures| {
            if caps.name("open").is_some() {
                in_pattern = true;
            } else if let Some(name) = caps.name("var") {
                if let Some(text) = applicable.get(name.as_str()) {
                    return if in_pattern {
                        text.clone()
                    } else {
                        format!("({} AS ?{})", text, name.as_str())
                    };
                }
            }
            caps[0].to_string()
        })
        .into_owned();

    if !in_pattern {
        return Err(FederationError::MalformedQuery(
            "query has no group graph pattern".to_string(),
        ));
    }
    Ok(bound)
}

/// Prefix `query` with a BASE declaration unless it declares one
pub fn with_base(query: &str, base_uri: Option<&str>) -> String {
    match base_uri {
        Some(base) if !base.is_empty() && !BASE_DECLARATION.is_match(query) => {
            format!("BASE <{}>\n{}", base, query)
        }
        _ => query.to_string(),
    }
}
