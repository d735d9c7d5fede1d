// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Result formatting for CLI output

use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use fedsparql::client::results::bindings_to_json;
use fedsparql::Binding;
use std::time::Duration;

use super::commands::OutputFormat;

/// Joined rows of one SERVICE evaluation, ready for display
pub struct QueryOutput {
    pub endpoint: String,
    /// Variables in order of first appearance across the rows
    pub variables: Vec<String>,
    pub rows: Vec<Binding>,
    pub execution_time_ms: u128,
}

impl QueryOutput {
    pub fn new(endpoint: &str, rows: Vec<Binding>, elapsed: Duration) -> Self {
        let mut variables: Vec<String> = Vec::new();
        for row in &rows {
            for name in row.names() {
                if !variables.iter().any(|v| v == name) {
                    variables.push(name.to_string());
                }
            }
        }
        Self {
            endpoint: endpoint.to_string(),
            variables,
            rows,
            execution_time_ms: elapsed.as_millis(),
        }
    }
}

/// Result formatter for different output formats
pub struct ResultFormatter;

impl ResultFormatter {
    /// Format query results in the specified format
    pub fn format(output: &QueryOutput, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::format_table(output),
            OutputFormat::Json => Self::format_json(output),
            OutputFormat::Csv => Self::format_csv(output),
        }
    }

    /// Format results as a table using comfy-table
    fn format_table(output: &QueryOutput) -> String {
        if output.rows.is_empty() {
            return format!("{}\n", "No results found".yellow());
        }

        let mut text = String::new();
        text.push_str(&format!("{}\n", "Service Results".bold().green()));
        text.push_str(&format!("Endpoint: {}\n", output.endpoint));
        text.push_str(&format!("Execution time: {} ms\n", output.execution_time_ms));
        text.push_str(&format!("Rows returned: {}\n\n", output.rows.len()));

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);

        let header_cells: Vec<Cell> = output
            .variables
            .iter()
            .map(|var| Cell::new(format!("?{}", var)).fg(Color::Green))
            .collect();
        table.set_header(header_cells);

        for row in &output.rows {
            let values: Vec<String> = output
                .variables
                .iter()
                .map(|var| row.get(var).map(|t| t.to_string()).unwrap_or_default())
                .collect();
            table.add_row(values);
        }

        text.push_str(&table.to_string());
        text.push('\n');
        text
    }

    /// Format results as a SPARQL JSON results document
    fn format_json(output: &QueryOutput) -> String {
        let document = bindings_to_json(&output.variables, &output.rows);
        serde_json::to_string_pretty(&document).unwrap_or_else(|_| {
            "{\"status\": \"error\", \"error\": \"Could not serialize results to JSON\"}"
                .to_string()
        })
    }

    /// Format results as CSV
    fn format_csv(output: &QueryOutput) -> String {
        let mut text = String::new();
        let header: Vec<String> = output.variables.iter().map(|v| Self::csv_field(v)).collect();
        text.push_str(&header.join(","));
        text.push('\n');

        for row in &output.rows {
            let values: Vec<String> = output
                .variables
                .iter()
                .map(|var| row.get(var).map(|t| Self::csv_field(t.as_str())).unwrap_or_default())
                .collect();
            text.push_str(&values.join(","));
            text.push('\n');
        }

        text
    }

    /// CSV field, quoted when it holds a separator, quote or line break
    fn csv_field(s: &str) -> String {
        if s.contains([',', '"', '\n', '\r']) {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}
