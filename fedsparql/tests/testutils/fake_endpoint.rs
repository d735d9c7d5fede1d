//! Scripted in-process endpoint
//!
//! `ScriptedService` answers every submitted query through a responder
//! closure and records the query text, so tests can assert both on what was
//! sent and on what came back.

use async_trait::async_trait;
use fedsparql::{
    Binding, FederatedService, FederationError, FederationResult, SolutionSequence,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub type Responder = Box<dyn Fn(&str) -> FederationResult<SolutionSequence> + Send + Sync>;

pub struct ScriptedService {
    endpoint: String,
    responder: Responder,
    queries: Mutex<Vec<String>>,
    initialized: AtomicUsize,
    shutdowns: AtomicUsize,
    fail_initialize: bool,
    fail_shutdown: bool,
    initialize_delay: Option<Duration>,
    batch_delay: Option<Duration>,
    row_delay: Option<Duration>,
}

impl ScriptedService {
    pub fn new<F>(endpoint: &str, responder: F) -> Self
    where
        F: Fn(&str) -> FederationResult<SolutionSequence> + Send + Sync + 'static,
    {
        Self {
            endpoint: endpoint.to_string(),
            responder: Box::new(responder),
            queries: Mutex::new(Vec::new()),
            initialized: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
            fail_initialize: false,
            fail_shutdown: false,
            initialize_delay: None,
            batch_delay: None,
            row_delay: None,
        }
    }

    /// Answers every query with the same rows
    pub fn returning(endpoint: &str, rows: Vec<Binding>) -> Self {
        Self::new(endpoint, move |_| {
            Ok(SolutionSequence::from_bindings(Vec::new(), rows.clone()))
        })
    }

    /// Fails every query with `error`
    pub fn failing(endpoint: &str, error: FederationError) -> Self {
        Self::new(endpoint, move |_| Err(error.clone()))
    }

    pub fn with_failing_initialize(mut self) -> Self {
        self.fail_initialize = true;
        self
    }

    pub fn with_failing_shutdown(mut self) -> Self {
        self.fail_shutdown = true;
        self
    }

    pub fn with_initialize_delay(mut self, delay: Duration) -> Self {
        self.initialize_delay = Some(delay);
        self
    }

    /// Delay answers to queries carrying a VALUES block
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = Some(delay);
        self
    }

    /// Delay answers to queries without a VALUES block
    pub fn with_row_delay(mut self, delay: Duration) -> Self {
        self.row_delay = Some(delay);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Every query text submitted so far, in order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().len()
    }

    pub fn initialize_count(&self) -> usize {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FederatedService for ScriptedService {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn initialize(&self) -> FederationResult<()> {
        if let Some(delay) = self.initialize_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_initialize {
            return Err(FederationError::Connection(format!(
                "{} is unreachable",
                self.endpoint
            )));
        }
        self.initialized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn select(
        &self,
        query: &str,
        _base_uri: Option<&str>,
        _timeout: Option<Duration>,
    ) -> FederationResult<SolutionSequence> {
        self.queries.lock().push(query.to_string());
        let delay = if query.contains(" VALUES (") {
            self.batch_delay
        } else {
            self.row_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(query)
    }

    async fn ask(
        &self,
        query: &str,
        base_uri: Option<&str>,
        timeout: Option<Duration>,
    ) -> FederationResult<bool> {
        let solutions = self.select(query, base_uri, timeout).await?;
        Ok(!solutions.is_empty())
    }

    async fn shutdown(&self) -> FederationResult<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        if self.fail_shutdown {
            return Err(FederationError::Connection(format!(
                "{} refused to close",
                self.endpoint
            )));
        }
        Ok(())
    }
}
