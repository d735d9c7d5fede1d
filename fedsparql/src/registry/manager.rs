// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Directory of initialized endpoint clients
//!
//! One registry is owned by the query-execution context and shared by
//! reference. It holds at most one live client per endpoint identity.

use super::factory::{ServiceFactory, SparqlServiceFactory};
use crate::client::FederatedService;
use crate::exec::error::FederationResult;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Map from endpoint identity to its initialized client
pub struct ServiceRegistry {
    /// Registered clients indexed by endpoint identity
    services: RwLock<HashMap<String, Arc<dyn FederatedService>>>,
    /// Strategy used for identities seen for the first time
    factory: RwLock<Arc<dyn ServiceFactory>>,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry {
    /// Create an empty registry building SPARQL protocol clients
    pub fn new() -> Self {
        Self::with_factory(SparqlServiceFactory::default())
    }

    /// Create an empty registry with a custom construction strategy
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: ServiceFactory + 'static,
    {
        Self {
            services: RwLock::new(HashMap::new()),
            factory: RwLock::new(Arc::new(factory)),
        }
    }

    /// Replace the construction strategy for identities not yet registered
    ///
    /// Clients already in the registry are kept.
    pub fn set_factory<F>(&self, factory: F)
    where
        F: ServiceFactory + 'static,
    {
        *self.factory.write() = Arc::new(factory);
    }

    /// Install a pre-built client for `endpoint`
    ///
    /// # Returns
    /// * The client previously registered under `endpoint`, if any. It is
    ///   not shut down; that is left to the caller.
    pub fn register(
        &self,
        endpoint: impl Into<String>,
        service: Arc<dyn FederatedService>,
    ) -> Option<Arc<dyn FederatedService>> {
        let endpoint = endpoint.into();
        log::info!("Registered federated service for {}", endpoint);
        self.services.write().insert(endpoint, service)
    }

    /// Get the client for `endpoint`, creating and initializing it on first use
    ///
    /// Initialization runs outside the lock. When two callers race on a new
    /// identity, the first to finish is kept and the other's client is shut
    /// down, so the map never holds two clients for one identity.
    ///
    /// # Arguments
    /// * `endpoint` - Endpoint identity, typically its URL
    ///
    /// # Returns
    /// * `Ok(client)` - The registered, initialized client
    /// * `Err(FederationError)` - Construction or `initialize()` failed;
    ///   nothing is registered
    pub async fn get_or_create(&self, endpoint: &str) -> FederationResult<Arc<dyn FederatedService>> {
        if let Some(existing) = self.get(endpoint) {
            return Ok(existing);
        }

        let factory = self.factory.read().clone();
        let candidate = factory.create(endpoint)?;
        if let Err(e) = candidate.initialize().await {
            if let Err(shutdown_error) = candidate.shutdown().await {
                log::debug!(
                    "Shutdown after failed initialization of {} failed: {}",
                    endpoint,
                    shutdown_error
                );
            }
            return Err(e);
        }

        let (winner, lost_race) = {
            let mut services = self.services.write();
            match services.get(endpoint) {
                Some(existing) => (existing.clone(), true),
                None => {
                    services.insert(endpoint.to_string(), candidate.clone());
                    (candidate.clone(), false)
                }
            }
        };

        if lost_race {
            log::debug!("Discarding duplicate client for {}", endpoint);
            if let Err(e) = candidate.shutdown().await {
                log::warn!("Failed to shut down duplicate client for {}: {}", endpoint, e);
            }
        } else {
            log::info!("Created federated service for {}", endpoint);
        }

        Ok(winner)
    }

    /// Get the client for `endpoint` without creating one
    pub fn get(&self, endpoint: &str) -> Option<Arc<dyn FederatedService>> {
        self.services.read().get(endpoint).cloned()
    }

    /// Remove and shut down the client for `endpoint`
    ///
    /// Shutdown failures are logged, never returned.
    ///
    /// # Returns
    /// * `true` if a client was registered under `endpoint`
    pub async fn unregister(&self, endpoint: &str) -> bool {
        let removed = self.services.write().remove(endpoint);
        match removed {
            Some(service) => {
                shutdown_quietly(endpoint, service.as_ref()).await;
                log::info!("Unregistered federated service for {}", endpoint);
                true
            }
            None => false,
        }
    }

    /// Remove every client and shut each one down
    ///
    /// A failing shutdown does not stop the others; the registry is empty
    /// when this returns.
    pub async fn unregister_all(&self) {
        let drained: Vec<(String, Arc<dyn FederatedService>)> =
            self.services.write().drain().collect();
        let count = drained.len();

        for (endpoint, service) in drained {
            shutdown_quietly(&endpoint, service.as_ref()).await;
        }

        log::info!("Unregistered {} federated services", count);
    }

    pub fn contains(&self, endpoint: &str) -> bool {
        self.services.read().contains_key(endpoint)
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    /// Registered endpoint identities, sorted
    pub fn endpoints(&self) -> Vec<String> {
        let mut endpoints: Vec<String> = self.services.read().keys().cloned().collect();
        endpoints.sort();
        endpoints
    }
}

async fn shutdown_quietly(endpoint: &str, service: &dyn FederatedService) {
    if let Err(e) = service.shutdown().await {
        log::warn!("Failed to shut down federated service {}: {}", endpoint, e);
    }
}
