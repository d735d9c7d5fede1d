//! Row builders and an observable row source

use async_trait::async_trait;
use fedsparql::{Binding, BindingNames, BindingSource, FederationResult, Term};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub fn iri(value: &str) -> Term {
    Term::iri(value)
}

pub fn lit(value: &str) -> Term {
    Term::literal(value)
}

/// Build a row from `(name, term)` pairs
pub fn row(pairs: &[(&str, Term)]) -> Binding {
    pairs
        .iter()
        .map(|(name, term)| (name.to_string(), term.clone()))
        .collect()
}

pub fn vars(names: &[&str]) -> BindingNames {
    names.iter().map(|n| n.to_string()).collect()
}

/// Rows binding `?x` to `<http://ex/0>`, `<http://ex/1>`, ...
pub fn subject_rows(count: usize) -> Vec<Binding> {
    (0..count)
        .map(|i| row(&[("x", iri(&format!("http://ex/{}", i)))]))
        .collect()
}

/// Row source that records how far it was pulled and whether it was closed
pub struct TrackingSource {
    rows: std::vec::IntoIter<Binding>,
    pulled: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

/// Observer half of a [`TrackingSource`]
#[derive(Clone)]
pub struct SourceProbe {
    pulled: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

impl SourceProbe {
    pub fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl TrackingSource {
    pub fn new(rows: Vec<Binding>) -> (Box<dyn BindingSource>, SourceProbe) {
        let pulled = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicBool::new(false));
        let probe = SourceProbe {
            pulled: pulled.clone(),
            closed: closed.clone(),
        };
        let source = TrackingSource {
            rows: rows.into_iter(),
            pulled,
            closed,
        };
        (Box::new(source), probe)
    }
}

#[async_trait]
impl BindingSource for TrackingSource {
    async fn next_binding(&mut self) -> FederationResult<Option<Binding>> {
        let next = self.rows.next();
        if next.is_some() {
            self.pulled.fetch_add(1, Ordering::SeqCst);
        }
        Ok(next)
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
