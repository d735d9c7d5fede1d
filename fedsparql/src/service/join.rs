// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Correlation of remote results with input rows
//!
//! Three shapes, all lazy over the remote sequence:
//! - [`InsertBindingsIterator`]: one input row, merged into every result
//! - [`CrossProductIterator`]: no correlating variable, every result × every input
//! - [`JoinConversionIterator`]: results carry the row index of their input

use crate::exec::error::FederationResult;
use crate::exec::row_iterator::{BoxedRowIterator, RowIterator};
use crate::model::Binding;

/// Input row extended with the remote row's values; remote values win
pub fn join_rows(input: &Binding, remote: &Binding) -> Binding {
    let mut joined = input.clone();
    for (name, term) in remote.iter() {
        joined.insert(name, term.clone());
    }
    joined
}

/// Merges a single input row into every remote result row
pub struct InsertBindingsIterator {
    results: BoxedRowIterator,
    input: Binding,
}

impl InsertBindingsIterator {
    pub fn new(results: BoxedRowIterator, input: Binding) -> Self {
        Self { results, input }
    }
}

impl Iterator for InsertBindingsIterator {
    type Item = FederationResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        self.results
            .next()
            .map(|row| row.map(|remote| join_rows(&self.input, &remote)))
    }
}

impl RowIterator for InsertBindingsIterator {
    fn size_hint_rows(&self) -> Option<usize> {
        self.results.size_hint_rows()
    }
}

/// Pairs every remote result with every input row of the batch
///
/// Output is result-major: all inputs for the first result, then all inputs
/// for the second, and so on. Size is `results × inputs`.
pub struct CrossProductIterator {
    results: BoxedRowIterator,
    inputs: Vec<Binding>,
    current: Option<Binding>,
    position: usize,
}

impl CrossProductIterator {
    pub fn new(results: BoxedRowIterator, inputs: Vec<Binding>) -> Self {
        Self {
            results,
            inputs,
            current: None,
            position: 0,
        }
    }
}

impl Iterator for CrossProductIterator {
    type Item = FederationResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(remote) = &self.current {
                if let Some(input) = self.inputs.get(self.position) {
                    self.position += 1;
                    return Some(Ok(join_rows(input, remote)));
                }
                self.current = None;
            }

            match self.results.next()? {
                Ok(remote) => {
                    self.current = Some(remote);
                    self.position = 0;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl RowIterator for CrossProductIterator {
    fn size_hint_rows(&self) -> Option<usize> {
        if self.current.is_some() {
            return None;
        }
        self.results
            .size_hint_rows()
            .map(|n| n * self.inputs.len())
    }
}

/// Joins remote rows back to the input row named by their row index
///
/// Remote rows without a usable index are dropped: an input row the remote
/// side did not match contributes no output.
pub struct JoinConversionIterator {
    results: BoxedRowIterator,
    inputs: Vec<Binding>,
    row_index_variable: String,
}

impl JoinConversionIterator {
    pub fn new(
        results: BoxedRowIterator,
        inputs: Vec<Binding>,
        row_index_variable: impl Into<String>,
    ) -> Self {
        Self {
            results,
            inputs,
            row_index_variable: row_index_variable.into(),
        }
    }
}

impl Iterator for JoinConversionIterator {
    type Item = FederationResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut remote = match self.results.next()? {
                Ok(row) => row,
                Err(e) => return Some(Err(e)),
            };

            let index = remote
                .remove(&self.row_index_variable)
                .and_then(|term| term.as_str().trim().parse::<usize>().ok());
            match index.and_then(|i| self.inputs.get(i)) {
                Some(input) => return Some(Ok(join_rows(input, &remote))),
                None => {
                    log::debug!(
                        "Dropping remote row without matching ?{}: {}",
                        self.row_index_variable,
                        remote
                    );
                }
            }
        }
    }
}

impl RowIterator for JoinConversionIterator {}
