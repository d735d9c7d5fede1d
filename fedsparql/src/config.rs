// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Federation configuration

use crate::exec::error::{FederationError, FederationResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of incoming rows correlated into one remote query
pub const DEFAULT_BLOCK_SIZE: i32 = 15;

/// Reserved variable carrying the input row index through a VALUES clause
pub const DEFAULT_ROW_INDEX_VARIABLE: &str = "__rowIdx";

/// SERVICE evaluation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FederationConfig {
    /// Rows per remote round trip. Zero or negative disables batching and
    /// evaluates one row at a time.
    pub block_size: i32,

    /// Execution budget of a batched (VALUES-correlated) sub-query
    pub batch_query_timeout: Duration,

    /// Capacity of the queue between the producer task and the consumer
    pub queue_capacity: usize,

    /// Name of the synthetic row-index variable
    pub row_index_variable: String,

    /// Endpoint client settings
    pub client: ClientConfig,
}

/// Remote endpoint client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Timeout applied to every request unless a tighter budget is given
    pub request_timeout: Option<Duration>,

    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,

    pub user_agent: String,

    /// Send `ASK {}` during `initialize()` to fail early on unreachable endpoints
    pub probe_on_initialize: bool,

    /// Extra headers sent with every request
    pub default_headers: Vec<(String, String)>,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            batch_query_timeout: Duration::from_secs(60),
            queue_capacity: 64,
            row_index_variable: DEFAULT_ROW_INDEX_VARIABLE.to_string(),
            client: ClientConfig::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(120)),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("fedsparql/{}", env!("CARGO_PKG_VERSION")),
            probe_on_initialize: false,
            default_headers: Vec::new(),
        }
    }
}

impl FederationConfig {
    /// One remote query per incoming row
    pub fn unbatched() -> Self {
        Self {
            block_size: 0,
            ..Self::default()
        }
    }

    /// Smaller batches and a tight budget for interactive use
    pub fn low_latency() -> Self {
        let mut config = Self::default();
        config.block_size = 5;
        config.batch_query_timeout = Duration::from_secs(10);
        config.queue_capacity = 16;
        config.client.request_timeout = Some(Duration::from_secs(15));
        config.client.connect_timeout = Duration::from_secs(3);
        config
    }

    /// Effective number of rows pulled per batch
    pub fn effective_block_size(&self) -> usize {
        if self.block_size <= 0 {
            1
        } else {
            self.block_size as usize
        }
    }

    /// Load configuration from a JSON document
    pub fn from_json(json: &str) -> FederationResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FederationError::InvalidConfig(format!("Invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> FederationResult<()> {
        if self.queue_capacity == 0 {
            return Err(FederationError::InvalidConfig(
                "queue_capacity must be > 0".to_string(),
            ));
        }

        if self.batch_query_timeout.is_zero() {
            return Err(FederationError::InvalidConfig(
                "batch_query_timeout must be non-zero".to_string(),
            ));
        }

        let name = &self.row_index_variable;
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(FederationError::InvalidConfig(format!(
                "row_index_variable '{}' is not a valid variable name",
                name
            )));
        }

        if self.client.user_agent.is_empty() {
            return Err(FederationError::InvalidConfig(
                "client.user_agent must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
