// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Output side of a SERVICE evaluation
//!
//! A producer task pulls input rows, evaluates batches and pushes the joined
//! rows into a bounded queue. [`ServiceResultStream`] drains that queue.

use crate::exec::error::FederationResult;
use crate::model::Binding;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Cooperative stop signal shared between a stream and its producer
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Joined rows of one SERVICE clause, in delivery order
///
/// Rows of batch N are all delivered before any row of batch N+1. An `Err`
/// item is the last item of the stream.
pub struct ServiceResultStream {
    receiver: mpsc::Receiver<FederationResult<Binding>>,
    producer: Option<JoinHandle<()>>,
    cancel: CancelFlag,
    finished: bool,
}

impl ServiceResultStream {
    pub(crate) fn new(
        receiver: mpsc::Receiver<FederationResult<Binding>>,
        producer: JoinHandle<()>,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            receiver,
            producer: Some(producer),
            cancel,
            finished: false,
        }
    }

    /// Next joined row, `None` once the stream is exhausted or closed
    pub async fn next(&mut self) -> Option<FederationResult<Binding>> {
        if self.finished {
            return None;
        }
        match self.receiver.recv().await {
            Some(Err(e)) => {
                self.finished = true;
                self.close();
                Some(Err(e))
            }
            Some(row) => Some(row),
            None => {
                self.finished = true;
                None
            }
        }
    }

    /// Drain the stream, stopping at the first error
    pub async fn collect_all(mut self) -> FederationResult<Vec<Binding>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await {
            rows.push(row?);
        }
        Ok(rows)
    }

    /// Stop the producer and release the queue without waiting
    ///
    /// Remote calls already in flight complete, but no further batch is
    /// started.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.receiver.close();
        self.finished = true;
    }

    /// Close and wait for the producer to release its row source
    pub async fn close_and_join(mut self) {
        self.close();
        if let Some(producer) = self.producer.take() {
            if let Err(e) = producer.await {
                log::warn!("SERVICE producer task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.finished
    }
}

impl Drop for ServiceResultStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
