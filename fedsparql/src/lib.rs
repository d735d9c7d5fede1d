// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! FedSPARQL - SERVICE clause execution for federated SPARQL queries
//!
//! FedSPARQL evaluates the `SERVICE` clause of a query plan: it sends
//! sub-queries to remote SPARQL endpoints, joins their results with the rows
//! produced by the rest of the plan, and keeps going when an endpoint fails.
//!
//! # Features
//!
//! - **Batching**: incoming rows are shipped in blocks through a `VALUES`
//!   clause, one round trip per block
//! - **Correlated joins**: results are routed back to their input row by a
//!   synthetic row index, or cross-joined when no variable correlates them
//! - **Failure recovery**: failed blocks are retried row by row; `SILENT`
//!   services degrade to their input rows instead of failing the query
//! - **Shared clients**: a registry keeps one initialized client per endpoint
//!
//! # Usage
//!
//! ```ignore
//! use fedsparql::{
//!     FederationConfig, FederationDispatcher, PatternQueryRenderer, ServiceDescriptor,
//!     ServiceRegistry, VecBindingSource,
//! };
//!
//! let registry = ServiceRegistry::new();
//! let service = registry.get_or_create("https://query.wikidata.org/sparql").await?;
//!
//! let descriptor = ServiceDescriptor::new(
//!     "https://query.wikidata.org/sparql",
//!     ["item".to_string(), "label".to_string()].into(),
//!     PatternQueryRenderer::new("?item rdfs:label ?label"),
//! );
//! let dispatcher = FederationDispatcher::new(FederationConfig::default());
//! let rows = dispatcher
//!     .evaluate(descriptor, service, Box::new(VecBindingSource::new(input)))
//!     .collect_all()
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod exec;
pub mod model;
pub mod registry;
pub mod service;

pub use client::{FederatedService, QueryType, SolutionSequence, SparqlEndpointClient};
pub use config::{ClientConfig, FederationConfig};
pub use exec::{
    BindingSource, BoxedRowIterator, FederationError, FederationResult, RowIterator,
    VecBindingSource,
};
pub use model::{Binding, BindingNames, Literal, LiteralAnnotation, Term};
pub use registry::{ServiceFactory, ServiceRegistry, SparqlServiceFactory};
pub use service::{
    FederationDispatcher, PatternQueryRenderer, QueryRenderer, ServiceDescriptor,
    ServiceResultStream,
};

/// FedSPARQL version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
