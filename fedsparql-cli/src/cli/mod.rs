// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for FedSPARQL
//!
//! Evaluates one SERVICE clause against a remote endpoint for a set of
//! input rows and prints the joined rows.

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{Cli, Commands};
pub use handlers::handle_query;
