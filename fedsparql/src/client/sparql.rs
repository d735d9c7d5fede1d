// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! HTTP(S) SPARQL protocol client for one remote endpoint

use crate::client::bind::with_base;
use crate::client::results::{boolean_from_json, SolutionSequence, SPARQL_RESULTS_JSON};
use crate::client::FederatedService;
use crate::config::ClientConfig;
use crate::exec::error::{FederationError, FederationResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;

/// Longest response body excerpt carried in an error message
const ERROR_BODY_EXCERPT: usize = 512;

/// Connection lifecycle of a client
enum ConnectionState {
    /// Not connected yet; the connection is opened on first use
    Idle,
    Open(Client),
    Shutdown,
}

/// Client for a single remote SPARQL endpoint
///
/// Owns one HTTP connection pool, opened lazily on the first query and kept
/// until [`FederatedService::shutdown`].
pub struct SparqlEndpointClient {
    endpoint: String,
    config: ClientConfig,
    state: Mutex<ConnectionState>,
}

impl SparqlEndpointClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_config(endpoint, ClientConfig::default())
    }

    pub fn with_config(endpoint: impl Into<String>, config: ClientConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            config,
            state: Mutex::new(ConnectionState::Idle),
        }
    }

    /// Whether the connection has been opened and not yet released
    pub fn is_open(&self) -> bool {
        matches!(*self.state.lock(), ConnectionState::Open(_))
    }

    pub fn is_shut_down(&self) -> bool {
        matches!(*self.state.lock(), ConnectionState::Shutdown)
    }

    fn parse_endpoint(&self) -> FederationResult<Url> {
        let url = Url::parse(&self.endpoint).map_err(|e| {
            FederationError::Connection(format!("Invalid endpoint '{}': {}", self.endpoint, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(FederationError::Connection(format!(
                "Unsupported scheme '{}' for endpoint '{}'",
                scheme, self.endpoint
            ))),
        }
    }

    fn build_client(&self) -> FederationResult<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(SPARQL_RESULTS_JSON));
        for (name, value) in &self.config.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                FederationError::InvalidConfig(format!("Invalid header name '{}': {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                FederationError::InvalidConfig(format!("Invalid header value: {}", e))
            })?;
            headers.insert(name, value);
        }

        let mut builder = Client::builder()
            .user_agent(self.config.user_agent.clone())
            .connect_timeout(self.config.connect_timeout)
            .default_headers(headers);
        if let Some(timeout) = self.config.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(|e| {
            FederationError::Connection(format!(
                "Could not initialize client for endpoint {}: {}",
                self.endpoint, e
            ))
        })
    }

    /// Current connection, opened on first use
    fn connection(&self) -> FederationResult<Client> {
        let mut state = self.state.lock();
        match &*state {
            ConnectionState::Open(client) => return Ok(client.clone()),
            ConnectionState::Shutdown => {
                return Err(FederationError::Connection(format!(
                    "Client for endpoint {} has been shut down",
                    self.endpoint
                )))
            }
            ConnectionState::Idle => {}
        }
        let client = self.build_client()?;
        log::debug!("Opened connection to SPARQL endpoint {}", self.endpoint);
        *state = ConnectionState::Open(client.clone());
        Ok(client)
    }

    /// Submit query text and return the raw response body
    async fn submit(
        &self,
        query: &str,
        base_uri: Option<&str>,
        timeout: Option<Duration>,
    ) -> FederationResult<Vec<u8>> {
        let client = self.connection()?;
        let text = with_base(query, base_uri);
        log::debug!("Submitting query to {}: {}", self.endpoint, text);

        let mut request = client.post(&self.endpoint).form(&[("query", text.as_str())]);
        if let Some(budget) = timeout {
            request = request.timeout(budget);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e, timeout))?;
        let status = response.status();
        if status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| self.transport_error(e, timeout))?;
            return Ok(body.to_vec());
        }

        let body = response.text().await.unwrap_or_default();
        let excerpt: String = body.chars().take(ERROR_BODY_EXCERPT).collect();
        if status == StatusCode::BAD_REQUEST {
            Err(FederationError::MalformedQuery(format!(
                "endpoint {} rejected query: {}",
                self.endpoint, excerpt
            )))
        } else {
            Err(FederationError::QueryExecution(format!(
                "endpoint {} returned {}: {}",
                self.endpoint, status, excerpt
            )))
        }
    }

    fn transport_error(&self, error: reqwest::Error, timeout: Option<Duration>) -> FederationError {
        if error.is_timeout() {
            let budget = timeout
                .or(self.config.request_timeout)
                .unwrap_or_default();
            return FederationError::Timeout(budget);
        }
        match FederationError::from(error) {
            FederationError::Connection(msg) => FederationError::Connection(format!(
                "SPARQL endpoint {} unreachable: {}",
                self.endpoint, msg
            )),
            other => other,
        }
    }
}

#[async_trait]
impl FederatedService for SparqlEndpointClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn initialize(&self) -> FederationResult<()> {
        if self.is_shut_down() {
            return Err(FederationError::Connection(format!(
                "Client for endpoint {} has been shut down",
                self.endpoint
            )));
        }
        self.parse_endpoint()?;
        self.connection()?;

        if self.config.probe_on_initialize {
            self.ask("ASK {}", None, self.config.request_timeout)
                .await
                .map_err(|e| match e {
                    FederationError::Connection(_) => e,
                    other => FederationError::Connection(format!(
                        "Probe of endpoint {} failed: {}",
                        self.endpoint, other
                    )),
                })?;
        }

        log::info!("Initialized SPARQL endpoint client for {}", self.endpoint);
        Ok(())
    }

    async fn select(
        &self,
        query: &str,
        base_uri: Option<&str>,
        timeout: Option<Duration>,
    ) -> FederationResult<SolutionSequence> {
        let body = self.submit(query, base_uri, timeout).await?;
        SolutionSequence::from_json(&body)
    }

    async fn ask(
        &self,
        query: &str,
        base_uri: Option<&str>,
        timeout: Option<Duration>,
    ) -> FederationResult<bool> {
        let body = self.submit(query, base_uri, timeout).await?;
        boolean_from_json(&body)
    }

    async fn shutdown(&self) -> FederationResult<()> {
        let previous = std::mem::replace(&mut *self.state.lock(), ConnectionState::Shutdown);
        match previous {
            ConnectionState::Shutdown => {}
            ConnectionState::Open(client) => {
                drop(client);
                log::debug!("Released connection to SPARQL endpoint {}", self.endpoint);
            }
            ConnectionState::Idle => {
                log::debug!("Shut down unused client for {}", self.endpoint);
            }
        }
        Ok(())
    }
}
