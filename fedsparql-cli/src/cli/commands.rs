// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Command-line arguments

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fedsparql", version, about = "Federated SPARQL SERVICE evaluation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<log::Level>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate a SERVICE pattern against a remote endpoint
    Query(QueryArgs),

    /// Show version information
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// SPARQL endpoint URL
    #[arg(short, long)]
    pub endpoint: String,

    /// Group graph pattern sent to the endpoint, without braces
    #[arg(short, long)]
    pub pattern: String,

    /// Variables the pattern declares, without '?'
    #[arg(long = "var", value_delimiter = ',', required = true)]
    pub vars: Vec<String>,

    /// Prefix declaration as prefix=namespace, repeatable
    #[arg(long = "prefix")]
    pub prefixes: Vec<String>,

    /// JSON file holding the input rows
    #[arg(short, long, conflicts_with = "rows")]
    pub input: Option<PathBuf>,

    /// Input rows as inline JSON: [{"x": {"type": "uri", "value": "..."}}]
    #[arg(long)]
    pub rows: Option<String>,

    /// Base URI for relative IRIs in the pattern
    #[arg(long)]
    pub base_uri: Option<String>,

    /// Keep input rows instead of failing when the endpoint fails
    #[arg(long)]
    pub silent: bool,

    /// Rows per remote round trip (0 disables batching)
    #[arg(long)]
    pub block_size: Option<i32>,

    /// Batch execution budget in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Federation configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}
