// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! SERVICE clause execution: batching, correlation, fallback

pub mod descriptor;
pub mod dispatcher;
pub mod fallback;
pub mod join;
pub mod stream;
pub mod values;

pub use descriptor::{PatternQueryRenderer, QueryRenderer, ServiceDescriptor};
pub use dispatcher::FederationDispatcher;
pub use fallback::FallbackExecutor;
pub use join::{CrossProductIterator, InsertBindingsIterator, JoinConversionIterator};
pub use stream::{CancelFlag, ServiceResultStream};
pub use values::{build_values_clause, relevant_variables};
