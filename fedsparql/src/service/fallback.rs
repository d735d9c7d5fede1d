// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Row-by-row retry of a failed batch

use crate::client::FederatedService;
use crate::exec::error::FederationResult;
use crate::exec::row_iterator::{
    BoxedRowIterator, ChainRowIterator, ErrorRowIterator, RowIterator, SilentRowIterator,
    VecRowIterator,
};
use crate::model::Binding;
use crate::service::descriptor::ServiceDescriptor;
use crate::service::stream::CancelFlag;

/// Re-evaluates every row of a failed batch on its own
///
/// Rows are evaluated in batch order and their results concatenated in the
/// same order. A row whose evaluation fails contributes itself unchanged when
/// the service is SILENT; otherwise the error ends the output and the
/// remaining rows are not evaluated. Once the cancel flag is raised no
/// further rows are sent.
pub struct FallbackExecutor<'a> {
    service: &'a dyn FederatedService,
    descriptor: &'a ServiceDescriptor,
    row_index_variable: &'a str,
    cancel: Option<CancelFlag>,
}

impl<'a> FallbackExecutor<'a> {
    pub fn new(
        service: &'a dyn FederatedService,
        descriptor: &'a ServiceDescriptor,
        row_index_variable: &'a str,
    ) -> Self {
        Self {
            service,
            descriptor,
            row_index_variable,
            cancel: None,
        }
    }

    /// Stop issuing row queries once `cancel` is raised
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    /// Evaluate `query` once per row of `batch`
    pub async fn execute(&self, query: &str, batch: Vec<Binding>) -> BoxedRowIterator {
        let silent = self.descriptor.silent;
        let mut parts: Vec<BoxedRowIterator> = Vec::with_capacity(batch.len());

        for row in batch {
            if self.is_cancelled() {
                log::debug!(
                    "Fallback for <{}> cancelled with rows remaining",
                    self.descriptor.endpoint
                );
                break;
            }
            let result = self
                .service
                .evaluate_select(
                    query,
                    &row,
                    self.descriptor.base_uri(),
                    &self.descriptor.service_vars,
                )
                .await;

            match result {
                Ok(rows) => {
                    let rows = StripVariableIterator::new(rows, self.row_index_variable).boxed();
                    parts.push(SilentRowIterator::wrap_if(silent, rows));
                }
                Err(e) if silent && !e.is_malformed() => {
                    log::warn!(
                        "SERVICE SILENT <{}>: row evaluation failed, keeping input row: {}",
                        self.descriptor.endpoint,
                        e
                    );
                    parts.push(VecRowIterator::singleton(row).boxed());
                }
                Err(e) => {
                    log::debug!(
                        "Fallback for <{}> aborted: {}",
                        self.descriptor.endpoint,
                        e
                    );
                    parts.push(ErrorRowIterator::new(e).boxed());
                    break;
                }
            }
        }

        ChainRowIterator::new(parts).boxed()
    }
}

/// Drops one variable from every row
struct StripVariableIterator {
    inner: BoxedRowIterator,
    name: String,
}

impl StripVariableIterator {
    fn new(inner: BoxedRowIterator, name: &str) -> Self {
        Self {
            inner,
            name: name.to_string(),
        }
    }
}

impl Iterator for StripVariableIterator {
    type Item = FederationResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|row| {
            row.map(|mut row| {
                row.remove(&self.name);
                row
            })
        })
    }
}

impl RowIterator for StripVariableIterator {
    fn size_hint_rows(&self) -> Option<usize> {
        self.inner.size_hint_rows()
    }
}
