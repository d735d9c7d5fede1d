// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Row sources feeding a SERVICE clause
//!
//! The rest of the query plan hands the dispatcher a [`BindingSource`]. The
//! dispatcher pulls rows from it on a background task, so implementations
//! must be `Send`.

use crate::exec::error::FederationResult;
use crate::model::Binding;
use async_trait::async_trait;

/// Pull-based source of incoming binding rows
#[async_trait]
pub trait BindingSource: Send {
    /// Pull the next row, `Ok(None)` once the source is exhausted
    async fn next_binding(&mut self) -> FederationResult<Option<Binding>>;

    /// Release the source. Called once the dispatcher stops pulling.
    async fn close(&mut self) {}
}

/// In-memory row source
pub struct VecBindingSource {
    rows: std::vec::IntoIter<Binding>,
    closed: bool,
}

impl VecBindingSource {
    pub fn new(rows: Vec<Binding>) -> Self {
        Self {
            rows: rows.into_iter(),
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl BindingSource for VecBindingSource {
    async fn next_binding(&mut self) -> FederationResult<Option<Binding>> {
        if self.closed {
            return Ok(None);
        }
        Ok(self.rows.next())
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}
