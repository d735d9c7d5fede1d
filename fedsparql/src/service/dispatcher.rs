// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! SERVICE clause evaluation
//!
//! Incoming rows are grouped into batches of at most `block_size` rows. A
//! single-row batch is evaluated with its row pre-bound. A larger batch is
//! evaluated in one round trip:
//!
//! 1. the row-index variable is added to the projection
//! 2. if the batch binds variables the service declares, a VALUES clause
//!    ships those values, one tuple per row
//! 3. results are joined back by row index, or paired with every row when
//!    no variable correlates them
//!
//! A batch whose remote evaluation fails is retried row by row.

use crate::client::FederatedService;
use crate::config::FederationConfig;
use crate::exec::error::{FederationError, FederationResult};
use crate::exec::row_iterator::{
    BoxedRowIterator, EmptyRowIterator, RowIterator, SilentRowIterator, VecRowIterator,
};
use crate::exec::source::BindingSource;
use crate::model::{Binding, BindingNames};
use crate::service::descriptor::ServiceDescriptor;
use crate::service::fallback::FallbackExecutor;
use crate::service::join::{CrossProductIterator, JoinConversionIterator};
use crate::service::stream::{CancelFlag, ServiceResultStream};
use crate::service::values::{build_values_clause, relevant_variables};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Evaluates SERVICE clauses against row streams
#[derive(Debug, Clone, Default)]
pub struct FederationDispatcher {
    config: FederationConfig,
}

impl FederationDispatcher {
    pub fn new(config: FederationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FederationConfig {
        &self.config
    }

    /// Evaluate `descriptor` for every row of `source`
    ///
    /// Spawns the producer on the current tokio runtime and returns
    /// immediately. The source is closed once the producer stops pulling.
    pub fn evaluate(
        &self,
        descriptor: ServiceDescriptor,
        service: Arc<dyn FederatedService>,
        source: Box<dyn BindingSource>,
    ) -> ServiceResultStream {
        let (sender, receiver) = mpsc::channel(self.config.queue_capacity.max(1));
        let cancel = CancelFlag::new();
        let producer = Producer {
            dispatcher: self.clone(),
            descriptor,
            service,
            sender,
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(producer.run(source));
        ServiceResultStream::new(receiver, handle, cancel)
    }

    /// Evaluate one batch of input rows
    ///
    /// `Err` means the whole stream must stop; errors the silent policy
    /// suppresses never surface here. A descriptor declaring the configured
    /// row index variable is rejected, SILENT or not.
    pub async fn evaluate_batch(
        &self,
        descriptor: &ServiceDescriptor,
        service: &dyn FederatedService,
        batch: Vec<Binding>,
    ) -> FederationResult<BoxedRowIterator> {
        self.evaluate_batch_until(descriptor, service, batch, &CancelFlag::new())
            .await
    }

    /// [`evaluate_batch`](Self::evaluate_batch) that stops a row-by-row
    /// retry once `cancel` is raised
    async fn evaluate_batch_until(
        &self,
        descriptor: &ServiceDescriptor,
        service: &dyn FederatedService,
        batch: Vec<Binding>,
        cancel: &CancelFlag,
    ) -> FederationResult<BoxedRowIterator> {
        let Some(first) = batch.first() else {
            return Ok(EmptyRowIterator.boxed());
        };
        let row_index = self.config.row_index_variable.as_str();
        if descriptor.service_vars.contains(row_index) {
            return Err(FederationError::InvalidConfig(format!(
                "SERVICE <{}> declares ?{}, which is reserved for the row index",
                descriptor.endpoint, row_index
            )));
        }
        let silent = descriptor.silent;
        let mut projection: BindingNames = descriptor
            .service_vars
            .difference(&first.binding_names())
            .cloned()
            .collect();

        if batch.len() == 1 {
            let query = descriptor.render(&projection);
            log::debug!("SERVICE <{}>: single-row evaluation", descriptor.endpoint);
            let result = service
                .evaluate_select(
                    &query,
                    first,
                    descriptor.base_uri(),
                    &descriptor.service_vars,
                )
                .await;
            return match result {
                Ok(rows) => Ok(SilentRowIterator::wrap_if(silent, rows)),
                Err(e) => recover(descriptor, batch, e),
            };
        }

        projection.insert(row_index.to_string());
        let query = descriptor.render(&projection);

        let relevant = relevant_variables(&batch, &descriptor.service_vars);
        let mut text = query.clone();
        if !relevant.is_empty() {
            match build_values_clause(&batch, &relevant, row_index) {
                Ok(clause) => text.push_str(&clause),
                Err(e) => return recover(descriptor, batch, e),
            }
        }
        log::debug!(
            "SERVICE <{}>: batch of {} rows, correlating on {:?}",
            descriptor.endpoint,
            batch.len(),
            relevant
        );

        let budget = self.config.batch_query_timeout;
        let submitted = match tokio::time::timeout(
            budget,
            service.select(&text, descriptor.base_uri(), Some(budget)),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FederationError::Timeout(budget)),
        };

        match submitted {
            Ok(solutions) => {
                let joined = if relevant.is_empty() {
                    CrossProductIterator::new(solutions.boxed(), batch).boxed()
                } else {
                    JoinConversionIterator::new(solutions.boxed(), batch, row_index).boxed()
                };
                Ok(SilentRowIterator::wrap_if(silent, joined))
            }
            Err(e) if e.is_recoverable_by_fallback() => {
                log::warn!(
                    "SERVICE <{}>: batch of {} rows failed, retrying row by row: {}",
                    descriptor.endpoint,
                    batch.len(),
                    e
                );
                let rows = FallbackExecutor::new(service, descriptor, row_index)
                    .with_cancel(cancel.clone())
                    .execute(&query, batch)
                    .await;
                Ok(SilentRowIterator::wrap_if(silent, rows))
            }
            Err(e) => recover(descriptor, batch, e),
        }
    }
}

/// Apply the silent policy to a failed batch
///
/// Malformed queries always propagate. Otherwise a SILENT service passes
/// its input rows through unchanged.
fn recover(
    descriptor: &ServiceDescriptor,
    batch: Vec<Binding>,
    error: FederationError,
) -> FederationResult<BoxedRowIterator> {
    if error.is_malformed() || !descriptor.silent {
        return Err(error);
    }
    log::warn!(
        "SERVICE SILENT <{}>: keeping {} input rows after failure: {}",
        descriptor.endpoint,
        batch.len(),
        error
    );
    Ok(VecRowIterator::new(batch).boxed())
}

/// Background half of a [`ServiceResultStream`]
struct Producer {
    dispatcher: FederationDispatcher,
    descriptor: ServiceDescriptor,
    service: Arc<dyn FederatedService>,
    sender: mpsc::Sender<FederationResult<Binding>>,
    cancel: CancelFlag,
}

impl Producer {
    async fn run(self, mut source: Box<dyn BindingSource>) {
        let block_size = self.dispatcher.config.effective_block_size();
        let mut batches = 0usize;

        while !self.cancel.is_cancelled() {
            let batch = match pull_batch(source.as_mut(), block_size).await {
                Ok(batch) => batch,
                Err(e) => {
                    let _ = self.sender.send(Err(e)).await;
                    break;
                }
            };
            if batch.is_empty() {
                break;
            }
            batches += 1;

            let rows = match self
                .dispatcher
                .evaluate_batch_until(
                    &self.descriptor,
                    self.service.as_ref(),
                    batch,
                    &self.cancel,
                )
                .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    let _ = self.sender.send(Err(e)).await;
                    break;
                }
            };

            if !self.forward(rows).await {
                break;
            }
        }

        source.close().await;
        log::debug!(
            "SERVICE <{}>: producer finished after {} batches",
            self.descriptor.endpoint,
            batches
        );
    }

    /// Push rows to the consumer; false once the stream must stop
    async fn forward(&self, rows: BoxedRowIterator) -> bool {
        for row in rows {
            let failed = row.is_err();
            if self.sender.send(row).await.is_err() {
                return false;
            }
            if failed {
                return false;
            }
        }
        true
    }
}

/// Pull up to `block_size` rows from `source`
async fn pull_batch(
    source: &mut dyn BindingSource,
    block_size: usize,
) -> FederationResult<Vec<Binding>> {
    let mut batch = Vec::with_capacity(block_size);
    while batch.len() < block_size {
        match source.next_binding().await? {
            Some(row) => batch.push(row),
            None => break,
        }
    }
    Ok(batch)
}
