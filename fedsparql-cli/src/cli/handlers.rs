// Copyright (c) 2024-2025 FedSPARQL Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command handlers for FedSPARQL

use colored::Colorize;
use std::path::Path;
use std::time::{Duration, Instant};

use super::commands::QueryArgs;
use super::output::{QueryOutput, ResultFormatter};
use fedsparql::client::results::bindings_from_json;
use fedsparql::{
    Binding, BindingNames, FederationConfig, FederationDispatcher, FederationResult,
    PatternQueryRenderer, ServiceDescriptor, ServiceRegistry, SparqlServiceFactory,
    VecBindingSource,
};

/// Handle the query command
///
/// Evaluates the pattern at the endpoint once per input row (batched), or
/// once with no bindings when no input rows are given.
pub async fn handle_query(args: QueryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;
    let input = load_input_rows(&args)?;
    let renderer = build_renderer(&args)?;

    let service_vars: BindingNames = args
        .vars
        .iter()
        .map(|v| v.trim_start_matches(['?', '$']).to_string())
        .filter(|v| !v.is_empty())
        .collect();

    let mut descriptor = ServiceDescriptor::new(args.endpoint.clone(), service_vars, renderer)
        .silent(args.silent);
    if let Some(base) = &args.base_uri {
        descriptor = descriptor.with_base_uri(base.clone());
    }

    let registry =
        ServiceRegistry::with_factory(SparqlServiceFactory::new(config.client.clone()));
    let started = Instant::now();

    let result = evaluate(&registry, config, descriptor, input).await;

    registry.unregister_all().await;

    match result {
        Ok(rows) => {
            let output = QueryOutput::new(&args.endpoint, rows, started.elapsed());
            println!("{}", ResultFormatter::format(&output, args.format));
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", format!("Error: {}", e).red());
            Err(e.into())
        }
    }
}

async fn evaluate(
    registry: &ServiceRegistry,
    config: FederationConfig,
    descriptor: ServiceDescriptor,
    input: Vec<Binding>,
) -> FederationResult<Vec<Binding>> {
    let service = registry.get_or_create(&descriptor.endpoint).await?;
    FederationDispatcher::new(config)
        .evaluate(descriptor, service, Box::new(VecBindingSource::new(input)))
        .collect_all()
        .await
}

/// Configuration from `--config` (or defaults) with flag overrides applied
fn build_config(args: &QueryArgs) -> Result<FederationConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => FederationConfig::default(),
    };

    if let Some(block_size) = args.block_size {
        config.block_size = block_size;
    }
    if let Some(secs) = args.timeout {
        config.batch_query_timeout = Duration::from_secs(secs);
    }

    config.validate()?;
    Ok(config)
}

fn load_config(path: &Path) -> Result<FederationConfig, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Could not read config {:?}: {}", path, e))?;
    Ok(FederationConfig::from_json(&text)?)
}

/// Input rows from `--input` or `--rows`; a single empty row otherwise
fn load_input_rows(args: &QueryArgs) -> Result<Vec<Binding>, Box<dyn std::error::Error>> {
    let json = match (&args.input, &args.rows) {
        (Some(path), _) => std::fs::read_to_string(path)
            .map_err(|e| format!("Could not read input rows {:?}: {}", path, e))?,
        (None, Some(inline)) => inline.clone(),
        (None, None) => return Ok(vec![Binding::new()]),
    };
    Ok(bindings_from_json(&json)?)
}

fn build_renderer(args: &QueryArgs) -> Result<PatternQueryRenderer, Box<dyn std::error::Error>> {
    let mut renderer = PatternQueryRenderer::new(args.pattern.clone());
    for declaration in &args.prefixes {
        let (prefix, namespace) = declaration
            .split_once('=')
            .ok_or_else(|| format!("Invalid prefix '{}', expected prefix=namespace", declaration))?;
        renderer = renderer.with_prefix(prefix.trim(), namespace.trim());
    }
    Ok(renderer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::OutputFormat;
    use fedsparql::{QueryRenderer, Term};
    use std::io::Write;

    fn args() -> QueryArgs {
        QueryArgs {
            endpoint: "http://127.0.0.1:9/sparql".to_string(),
            pattern: "?s foaf:name ?name".to_string(),
            vars: vec!["s".to_string(), "name".to_string()],
            prefixes: vec!["foaf=http://xmlns.com/foaf/0.1/".to_string()],
            input: None,
            rows: None,
            base_uri: None,
            silent: false,
            block_size: None,
            timeout: None,
            config: None,
            format: OutputFormat::Table,
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"block_size": 4, "queue_capacity": 8}}"#).unwrap();

        let mut args = args();
        args.config = Some(file.path().to_path_buf());
        args.timeout = Some(5);

        let config = build_config(&args).unwrap();
        assert_eq!(config.block_size, 4);
        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.batch_query_timeout, Duration::from_secs(5));

        args.block_size = Some(0);
        assert_eq!(build_config(&args).unwrap().block_size, 0);
    }

    #[test]
    fn test_input_rows() {
        let mut args = args();
        assert_eq!(load_input_rows(&args).unwrap(), vec![Binding::new()]);

        args.rows = Some(r#"[{"s": {"type": "uri", "value": "http://ex/a"}}]"#.to_string());
        let rows = load_input_rows(&args).unwrap();
        assert_eq!(rows[0].get("s"), Some(&Term::iri("http://ex/a")));

        args.rows = Some("not json".to_string());
        assert!(load_input_rows(&args).is_err());
    }

    #[test]
    fn test_renderer_with_prefixes() {
        let renderer = build_renderer(&args()).unwrap();
        let projection: BindingNames = ["name".to_string()].into();
        assert_eq!(
            renderer.render(&projection),
            "PREFIX foaf: <http://xmlns.com/foaf/0.1/>\nSELECT ?name WHERE { ?s foaf:name ?name }"
        );

        let mut bad = args();
        bad.prefixes = vec!["foaf".to_string()];
        assert!(build_renderer(&bad).is_err());
    }
}
