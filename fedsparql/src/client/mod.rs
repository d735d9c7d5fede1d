// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Remote endpoint clients
//!
//! [`FederatedService`] is the seam between the dispatcher and whatever
//! answers a sub-query. [`sparql::SparqlEndpointClient`] implements it over
//! the SPARQL 1.1 protocol; tests plug in scripted fakes.

pub mod bind;
pub mod results;
pub mod sparql;

pub use results::SolutionSequence;
pub use sparql::SparqlEndpointClient;

use crate::exec::error::FederationResult;
use crate::exec::row_iterator::{BoxedRowIterator, EmptyRowIterator, RowIterator, VecRowIterator};
use crate::model::{Binding, BindingNames};
use crate::service::join::InsertBindingsIterator;
use async_trait::async_trait;
use std::time::Duration;

/// Form of a remote sub-query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Ask,
}

/// Client for one remote endpoint
///
/// Implementors provide the raw protocol operations (`select`, `ask`) and the
/// connection lifecycle. Binding application and correlation of results with
/// the input row are provided on top of them.
#[async_trait]
pub trait FederatedService: Send + Sync {
    /// Identity of the remote endpoint, typically its URL
    fn endpoint(&self) -> &str;

    /// Prepare the client for use; fails with a connection error when the
    /// endpoint cannot be set up
    async fn initialize(&self) -> FederationResult<()>;

    /// Submit a tuple query as-is
    async fn select(
        &self,
        query: &str,
        base_uri: Option<&str>,
        timeout: Option<Duration>,
    ) -> FederationResult<SolutionSequence>;

    /// Submit a boolean query as-is
    async fn ask(
        &self,
        query: &str,
        base_uri: Option<&str>,
        timeout: Option<Duration>,
    ) -> FederationResult<bool>;

    /// Release the connection. Idempotent, and safe without a prior
    /// successful `initialize()`.
    async fn shutdown(&self) -> FederationResult<()>;

    /// Evaluate a SELECT with `binding` pre-bound
    ///
    /// Only variables declared in `service_vars` are bound. Every result row
    /// is merged with `binding`.
    async fn evaluate_select(
        &self,
        query: &str,
        binding: &Binding,
        base_uri: Option<&str>,
        service_vars: &BindingNames,
    ) -> FederationResult<BoxedRowIterator> {
        let text = bind::apply_bindings(query, binding, service_vars)?;
        let solutions = self.select(&text, base_uri, None).await?;
        Ok(InsertBindingsIterator::new(solutions.boxed(), binding.clone()).boxed())
    }

    /// Evaluate an ASK with `binding` pre-bound
    ///
    /// Yields `binding` unchanged when the remote answer is true, nothing
    /// otherwise.
    async fn evaluate_ask(
        &self,
        query: &str,
        binding: &Binding,
        base_uri: Option<&str>,
        service_vars: &BindingNames,
    ) -> FederationResult<BoxedRowIterator> {
        let text = bind::apply_bindings(query, binding, service_vars)?;
        if self.ask(&text, base_uri, None).await? {
            Ok(VecRowIterator::singleton(binding.clone()).boxed())
        } else {
            Ok(EmptyRowIterator.boxed())
        }
    }

    async fn evaluate(
        &self,
        query_type: QueryType,
        query: &str,
        binding: &Binding,
        base_uri: Option<&str>,
        service_vars: &BindingNames,
    ) -> FederationResult<BoxedRowIterator> {
        match query_type {
            QueryType::Select => {
                self.evaluate_select(query, binding, base_uri, service_vars)
                    .await
            }
            QueryType::Ask => {
                self.evaluate_ask(query, binding, base_uri, service_vars)
                    .await
            }
        }
    }
}
