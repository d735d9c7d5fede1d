// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Row Iterator - Lazy result sequences for SERVICE evaluation
//!
//! Every remote sub-query produces a sequence of rows that is consumed
//! one-at-a-time. Decoding and joining happen on `next()`, so an error can
//! surface in the middle of a sequence; [`SilentRowIterator`] intercepts
//! those for SILENT services.

use crate::exec::error::{FederationError, FederationResult};
use crate::model::Binding;

/// Iterator trait for lazy row evaluation
///
/// Without lazy evaluation:
/// ```ignore
/// let rows: Vec<Binding> = evaluate(); // Decodes the whole response
/// ```
///
/// With lazy evaluation:
/// ```ignore
/// let rows: BoxedRowIterator = evaluate(); // Rows decoded and joined on demand
/// for row in rows.take(10) {
///     process(row?);
/// }
/// ```
pub trait RowIterator: Iterator<Item = FederationResult<Binding>> + Send {
    /// Get estimated row count if known
    ///
    /// Returns `None` if the count cannot be determined without draining.
    fn size_hint_rows(&self) -> Option<usize> {
        None
    }

    /// Convert to a boxed trait object
    fn boxed(self) -> BoxedRowIterator
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

/// Type-erased row sequence
pub type BoxedRowIterator = Box<dyn RowIterator>;

impl RowIterator for BoxedRowIterator {
    fn size_hint_rows(&self) -> Option<usize> {
        (**self).size_hint_rows()
    }
}

/// Iterator wrapper for Vec<Binding>
///
/// Converts a materialized row list into a RowIterator. Used for the
/// "unchanged input rows" outcome of SILENT failures.
pub struct VecRowIterator {
    rows: std::vec::IntoIter<Binding>,
    count: usize,
}

impl VecRowIterator {
    pub fn new(rows: Vec<Binding>) -> Self {
        let count = rows.len();
        Self {
            rows: rows.into_iter(),
            count,
        }
    }

    /// Single row sequence
    pub fn singleton(row: Binding) -> Self {
        Self::new(vec![row])
    }
}

impl Iterator for VecRowIterator {
    type Item = FederationResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(Ok)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl RowIterator for VecRowIterator {
    fn size_hint_rows(&self) -> Option<usize> {
        Some(self.count)
    }
}

/// Empty iterator (returns no rows)
///
/// Used when:
/// - The incoming batch is empty
/// - An ASK sub-query evaluates to false
pub struct EmptyRowIterator;

impl Iterator for EmptyRowIterator {
    type Item = FederationResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        None
    }
}

impl RowIterator for EmptyRowIterator {
    fn size_hint_rows(&self) -> Option<usize> {
        Some(0)
    }
}

/// Error iterator (yields a single error)
///
/// Used to propagate errors in iterator chains without panicking.
pub struct ErrorRowIterator {
    error: Option<FederationError>,
}

impl ErrorRowIterator {
    pub fn new(error: FederationError) -> Self {
        Self { error: Some(error) }
    }
}

impl Iterator for ErrorRowIterator {
    type Item = FederationResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        self.error.take().map(Err)
    }
}

impl RowIterator for ErrorRowIterator {
    fn size_hint_rows(&self) -> Option<usize> {
        Some(0)
    }
}

/// Concatenation of row sequences, drained in order
pub struct ChainRowIterator {
    parts: std::collections::VecDeque<BoxedRowIterator>,
}

impl ChainRowIterator {
    pub fn new(parts: Vec<BoxedRowIterator>) -> Self {
        Self {
            parts: parts.into(),
        }
    }
}

impl Iterator for ChainRowIterator {
    type Item = FederationResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.parts.front_mut() {
            match current.next() {
                Some(item) => return Some(item),
                None => {
                    self.parts.pop_front();
                }
            }
        }
        None
    }
}

impl RowIterator for ChainRowIterator {
    fn size_hint_rows(&self) -> Option<usize> {
        self.parts
            .iter()
            .try_fold(0usize, |acc, part| Some(acc + part.size_hint_rows()?))
    }
}

/// Decorator for SILENT services
///
/// The first error surfacing from the inner sequence ends the sequence
/// instead of propagating. Malformed-query errors are the exception and
/// still propagate.
pub struct SilentRowIterator {
    inner: BoxedRowIterator,
    done: bool,
}

impl SilentRowIterator {
    pub fn new(inner: BoxedRowIterator) -> Self {
        Self { inner, done: false }
    }

    /// Wrap `inner` only when `silent` is set
    pub fn wrap_if(silent: bool, inner: BoxedRowIterator) -> BoxedRowIterator {
        if silent {
            Box::new(Self::new(inner))
        } else {
            inner
        }
    }
}

impl Iterator for SilentRowIterator {
    type Item = FederationResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.inner.next() {
            Some(Err(e)) if !e.is_malformed() => {
                log::warn!("SERVICE SILENT: suppressing error during consumption: {}", e);
                self.done = true;
                None
            }
            Some(item) => Some(item),
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl RowIterator for SilentRowIterator {}

/// Utility function to collect iterator results
///
/// Convenience wrapper for `.collect::<Result<Vec<_>, _>>()`
pub fn collect_rows<I>(iter: I) -> FederationResult<Vec<Binding>>
where
    I: Iterator<Item = FederationResult<Binding>>,
{
    iter.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Term;

    fn create_test_row(id: usize) -> Binding {
        Binding::new().with("id", Term::literal(id.to_string()))
    }

    #[test]
    fn test_vec_row_iterator() {
        let rows = vec![create_test_row(1), create_test_row(2), create_test_row(3)];
        let iter = VecRowIterator::new(rows);

        assert_eq!(iter.size_hint_rows(), Some(3));

        let collected: Vec<Binding> = iter.map(|r| r.unwrap()).collect();
        assert_eq!(collected.len(), 3);
    }

    #[test]
    fn test_empty_row_iterator() {
        let mut iter = EmptyRowIterator;

        assert_eq!(iter.size_hint_rows(), Some(0));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_error_row_iterator() {
        let error = FederationError::QueryExecution("test error".to_string());
        let mut iter = ErrorRowIterator::new(error);

        let result = iter.next();
        assert!(result.is_some());
        assert!(result.unwrap().is_err());

        // Second call returns None (error consumed)
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_chain_preserves_order() {
        let chain = ChainRowIterator::new(vec![
            VecRowIterator::new(vec![create_test_row(1)]).boxed(),
            EmptyRowIterator.boxed(),
            VecRowIterator::new(vec![create_test_row(2), create_test_row(3)]).boxed(),
        ]);
        assert_eq!(chain.size_hint_rows(), Some(3));

        let ids: Vec<String> = collect_rows(chain)
            .unwrap()
            .iter()
            .map(|r| r.get("id").unwrap().as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_silent_iterator_stops_at_error() {
        let inner = ChainRowIterator::new(vec![
            VecRowIterator::new(vec![create_test_row(1)]).boxed(),
            ErrorRowIterator::new(FederationError::QueryExecution("boom".into())).boxed(),
            VecRowIterator::new(vec![create_test_row(2)]).boxed(),
        ]);
        let rows = collect_rows(SilentRowIterator::new(inner.boxed())).unwrap();
        assert_eq!(rows, vec![create_test_row(1)]);
    }

    #[test]
    fn test_silent_iterator_propagates_malformed() {
        let inner = ErrorRowIterator::new(FederationError::MalformedQuery("bad".into()));
        let result = collect_rows(SilentRowIterator::new(inner.boxed()));
        assert!(matches!(result, Err(FederationError::MalformedQuery(_))));
    }

    #[test]
    fn test_collect_rows_with_error() {
        let error = FederationError::QueryExecution("test".to_string());
        let iter = ErrorRowIterator::new(error);

        let result = collect_rows(iter);
        assert!(result.is_err());
    }
}
