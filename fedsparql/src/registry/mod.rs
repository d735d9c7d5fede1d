// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Federated service registry

pub mod factory;
pub mod manager;

pub use factory::{ServiceFactory, SparqlServiceFactory};
pub use manager::ServiceRegistry;
