// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Parsed SERVICE clause as handed over by the query planner

use crate::model::BindingNames;
use std::fmt;
use std::sync::Arc;

/// Renders the sub-query text for a set of projection variables
pub trait QueryRenderer: Send + Sync {
    fn render(&self, projection: &BindingNames) -> String;
}

impl<F> QueryRenderer for F
where
    F: Fn(&BindingNames) -> String + Send + Sync,
{
    fn render(&self, projection: &BindingNames) -> String {
        self(projection)
    }
}

/// Renders `SELECT ?a ?b WHERE { <pattern> }` from a group graph pattern
#[derive(Debug, Clone, Default)]
pub struct PatternQueryRenderer {
    prefixes: Vec<(String, String)>,
    pattern: String,
}

impl PatternQueryRenderer {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            prefixes: Vec::new(),
            pattern: pattern.into(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.prefixes.push((prefix.into(), namespace.into()));
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl QueryRenderer for PatternQueryRenderer {
    fn render(&self, projection: &BindingNames) -> String {
        let mut query = String::new();
        for (prefix, namespace) in &self.prefixes {
            query.push_str(&format!("PREFIX {}: <{}>\n", prefix, namespace));
        }
        query.push_str("SELECT ");
        if projection.is_empty() {
            query.push('*');
        } else {
            let vars: Vec<String> = projection.iter().map(|v| format!("?{}", v)).collect();
            query.push_str(&vars.join(" "));
        }
        query.push_str(" WHERE { ");
        query.push_str(self.pattern.trim());
        query.push_str(" }");
        query
    }
}

/// Endpoint, declared variables and rendering strategy of one SERVICE clause
#[derive(Clone)]
pub struct ServiceDescriptor {
    pub endpoint: String,
    /// Variables the sub-query declares
    pub service_vars: BindingNames,
    pub base_uri: Option<String>,
    /// SILENT modifier: endpoint failures must not abort the query
    pub silent: bool,
    pub renderer: Arc<dyn QueryRenderer>,
}

impl ServiceDescriptor {
    pub fn new<R>(endpoint: impl Into<String>, service_vars: BindingNames, renderer: R) -> Self
    where
        R: QueryRenderer + 'static,
    {
        Self {
            endpoint: endpoint.into(),
            service_vars,
            base_uri: None,
            silent: false,
            renderer: Arc::new(renderer),
        }
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    pub fn render(&self, projection: &BindingNames) -> String {
        self.renderer.render(projection)
    }

    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("endpoint", &self.endpoint)
            .field("service_vars", &self.service_vars)
            .field("base_uri", &self.base_uri)
            .field("silent", &self.silent)
            .finish_non_exhaustive()
    }
}
