// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Execution primitives
//!
//! Error taxonomy, lazy row sequences and the row-source abstraction the
//! SERVICE evaluation is built on.

pub mod error;
pub mod row_iterator;
pub mod source;

// Re-export the main types for convenience
pub use error::{FederationError, FederationResult};
pub use row_iterator::{
    collect_rows, BoxedRowIterator, ChainRowIterator, EmptyRowIterator, ErrorRowIterator,
    RowIterator, SilentRowIterator, VecRowIterator,
};
pub use source::{BindingSource, VecBindingSource};
