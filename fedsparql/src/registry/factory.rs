// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Construction strategies for endpoint clients

use crate::client::{FederatedService, SparqlEndpointClient};
use crate::config::ClientConfig;
use crate::exec::error::FederationResult;
use std::sync::Arc;

/// Builds the client for an endpoint seen for the first time
///
/// The registry calls `initialize()` on the returned client; factories only
/// construct.
pub trait ServiceFactory: Send + Sync {
    fn create(&self, endpoint: &str) -> FederationResult<Arc<dyn FederatedService>>;
}

impl<F> ServiceFactory for F
where
    F: Fn(&str) -> FederationResult<Arc<dyn FederatedService>> + Send + Sync,
{
    fn create(&self, endpoint: &str) -> FederationResult<Arc<dyn FederatedService>> {
        self(endpoint)
    }
}

/// Default factory: one SPARQL protocol client per endpoint URL
#[derive(Debug, Clone, Default)]
pub struct SparqlServiceFactory {
    config: ClientConfig,
}

impl SparqlServiceFactory {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl ServiceFactory for SparqlServiceFactory {
    fn create(&self, endpoint: &str) -> FederationResult<Arc<dyn FederatedService>> {
        Ok(Arc::new(SparqlEndpointClient::with_config(
            endpoint,
            self.config.clone(),
        )))
    }
}
