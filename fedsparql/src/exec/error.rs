// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Federation error types

use std::time::Duration;
use thiserror::Error;

/// Errors raised while evaluating a SERVICE clause
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FederationError {
    /// The query text itself is invalid. Never silenced.
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query execution error: {0}")]
    QueryExecution(String),

    /// Execution budget exceeded; treated as a query execution error
    #[error("Query execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unsupported term: {0}")]
    UnsupportedTerm(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Row source error: {0}")]
    Source(String),
}

impl FederationError {
    /// True for errors in the query text, which propagate regardless of SILENT
    pub fn is_malformed(&self) -> bool {
        matches!(self, FederationError::MalformedQuery(_))
    }

    /// True for remote evaluation failures, including timeouts
    pub fn is_query_execution(&self) -> bool {
        matches!(
            self,
            FederationError::QueryExecution(_) | FederationError::Timeout(_)
        )
    }

    /// Whether a failed batch may be retried row by row
    pub fn is_recoverable_by_fallback(&self) -> bool {
        self.is_query_execution()
    }
}

impl From<reqwest::Error> for FederationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            // reqwest does not report the budget it was given
            FederationError::Timeout(Duration::ZERO)
        } else if error.is_connect() || error.is_builder() {
            FederationError::Connection(error.to_string())
        } else {
            FederationError::QueryExecution(error.to_string())
        }
    }
}

impl From<serde_json::Error> for FederationError {
    fn from(error: serde_json::Error) -> Self {
        FederationError::QueryExecution(format!("Undecodable result document: {}", error))
    }
}

/// Result alias used across the crate
pub type FederationResult<T> = Result<T, FederationError>;
