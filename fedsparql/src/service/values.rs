// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! VALUES correlation clause
//!
//! A batch of input rows is shipped to the remote endpoint as an inline data
//! block. Every tuple starts with the row's index in the batch so that remote
//! results can be joined back to the row they came from:
//!
//! ```text
//!  VALUES (?__rowIdx ?x) {  ("0" <http://ex/a> ) ("1" <http://ex/b> ) }
//! ```

use crate::exec::error::FederationResult;
use crate::model::{Binding, BindingNames};

/// Token for a variable a row leaves unbound
const UNDEF: &str = "UNDEF";

/// Variables of the batch that the service also declares
///
/// All rows of a batch share one bound-variable set, so the first row
/// decides. Order follows the first row.
pub fn relevant_variables(batch: &[Binding], service_vars: &BindingNames) -> Vec<String> {
    batch
        .first()
        .map(|row| {
            row.names()
                .filter(|name| service_vars.contains(*name))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Build the VALUES clause appended to a batched sub-query
///
/// Fails with `UnsupportedTerm` if a relevant value is a blank node.
pub fn build_values_clause(
    batch: &[Binding],
    relevant_vars: &[String],
    row_index_variable: &str,
) -> FederationResult<String> {
    let mut clause = String::new();
    clause.push_str(" VALUES (?");
    clause.push_str(row_index_variable);
    for name in relevant_vars {
        clause.push_str(" ?");
        clause.push_str(name);
    }
    clause.push_str(") { ");

    for (index, row) in batch.iter().enumerate() {
        clause.push_str(" (\"");
        clause.push_str(&index.to_string());
        clause.push_str("\" ");
        for name in relevant_vars {
            match row.get(name) {
                Some(term) => term.write_query_text(&mut clause)?,
                None => clause.push_str(UNDEF),
            }
            clause.push(' ');
        }
        clause.push(')');
    }

    clause.push_str(" }");
    Ok(clause)
}
