//! Tests for the SPARQL protocol client against a mock HTTP endpoint

use fedsparql::{
    Binding, BindingNames, ClientConfig, FederatedService, FederationConfig, FederationDispatcher,
    FederationError, PatternQueryRenderer, ServiceDescriptor, ServiceRegistry,
    SparqlEndpointClient, Term, VecBindingSource,
};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn select_response(vars: &[&str], bindings: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "head": { "vars": vars },
        "results": { "bindings": bindings },
    }))
}

/// Decoded `query` form field of a received request
fn submitted_query(request: &Request) -> String {
    let body = String::from_utf8_lossy(&request.body);
    let url = reqwest::Url::parse(&format!("http://form.local/?{}", body)).unwrap();
    url.query_pairs()
        .find(|(name, _)| name == "query")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

async fn mounted(response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sparql"))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_select_posts_form_and_decodes_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sparql"))
        .and(header("accept", "application/sparql-results+json"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("query=SELECT"))
        .respond_with(select_response(
            &["s", "name"],
            serde_json::json!([
                {"s": {"type": "uri", "value": "http://ex/alice"},
                 "name": {"type": "literal", "value": "Alice", "xml:lang": "en"}},
                {"s": {"type": "uri", "value": "http://ex/bob"}}
            ]),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = SparqlEndpointClient::new(format!("{}/sparql", server.uri()));
    client.initialize().await.unwrap();

    let query = "SELECT ?s ?name WHERE { ?s <http://xmlns.com/foaf/0.1/name> ?name }";
    let solutions = client.select(query, None, None).await.unwrap();
    assert_eq!(solutions.variables(), &["s", "name"]);
    let rows: Vec<Binding> = solutions.collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get("s"), Some(&Term::iri("http://ex/bob")));
    assert!(!rows[1].contains("name"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(submitted_query(&requests[0]), query);
    assert!(client.is_open());
}

#[tokio::test]
async fn test_bad_request_is_malformed_query() {
    let server = mounted(ResponseTemplate::new(400).set_body_string("Parse error at line 1")).await;
    let client = SparqlEndpointClient::new(format!("{}/sparql", server.uri()));

    let result = client.select("SELEC oops", None, None).await;
    match result {
        Err(FederationError::MalformedQuery(msg)) => assert!(msg.contains("Parse error")),
        other => panic!("expected MalformedQuery, got {:?}", other.map(|s| s.len())),
    }
}

#[tokio::test]
async fn test_server_error_is_query_execution() {
    let server = mounted(ResponseTemplate::new(500).set_body_string("out of memory")).await;
    let client = SparqlEndpointClient::new(format!("{}/sparql", server.uri()));

    let result = client.select("SELECT * WHERE { ?s ?p ?o }", None, None).await;
    match result {
        Err(FederationError::QueryExecution(msg)) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("out of memory"));
        }
        other => panic!("expected QueryExecution, got {:?}", other.map(|s| s.len())),
    }
}

#[tokio::test]
async fn test_undecodable_body_is_query_execution() {
    let server = mounted(ResponseTemplate::new(200).set_body_string("<html/>")).await;
    let client = SparqlEndpointClient::new(format!("{}/sparql", server.uri()));

    let result = client.select("SELECT * WHERE { ?s ?p ?o }", None, None).await;
    assert!(matches!(result, Err(FederationError::QueryExecution(_))));
}

#[tokio::test]
async fn test_ask() {
    let server =
        mounted(ResponseTemplate::new(200).set_body_json(serde_json::json!({"head": {}, "boolean": true})))
            .await;
    let client = SparqlEndpointClient::new(format!("{}/sparql", server.uri()));

    assert!(client.ask("ASK { ?s ?p ?o }", None, None).await.unwrap());
}

#[tokio::test]
async fn test_request_timeout() {
    let server = mounted(
        select_response(&["s"], serde_json::json!([])).set_delay(Duration::from_millis(500)),
    )
    .await;
    let client = SparqlEndpointClient::new(format!("{}/sparql", server.uri()));

    let result = client
        .select("SELECT * WHERE { ?s ?p ?o }", None, Some(Duration::from_millis(50)))
        .await;
    let error = result.err().unwrap();
    assert!(matches!(error, FederationError::Timeout(_)));
    assert!(error.is_query_execution());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_connection_error() {
    let client = SparqlEndpointClient::new("http://127.0.0.1:1/sparql");
    let result = client.select("SELECT * WHERE { ?s ?p ?o }", None, None).await;
    assert!(matches!(result, Err(FederationError::Connection(_))));
}

#[tokio::test]
async fn test_base_uri_is_prepended() {
    let server = mounted(select_response(&[], serde_json::json!([]))).await;
    let client = SparqlEndpointClient::new(format!("{}/sparql", server.uri()));

    client
        .select("SELECT * WHERE { <a> ?p ?o }", Some("http://base.example/"), None)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        submitted_query(&requests[0]),
        "BASE <http://base.example/>\nSELECT * WHERE { <a> ?p ?o }"
    );
}

#[tokio::test]
async fn test_evaluate_select_binds_and_merges() {
    let server = mounted(select_response(
        &["name"],
        serde_json::json!([{"name": {"type": "literal", "value": "Alice"}}]),
    ))
    .await;
    let client = SparqlEndpointClient::new(format!("{}/sparql", server.uri()));
    let input = Binding::new()
        .with("person", Term::iri("http://ex/alice"))
        .with("unrelated", Term::literal("kept"));
    let service_vars: BindingNames = ["person".to_string(), "name".to_string()].into();

    let rows: Vec<Binding> = client
        .evaluate_select(
            "SELECT ?name WHERE { ?person <http://ex/name> ?name }",
            &input,
            None,
            &service_vars,
        )
        .await
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        rows,
        vec![input.clone().with("name", Term::literal("Alice"))]
    );
    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        submitted_query(&requests[0]),
        "SELECT ?name WHERE { <http://ex/alice> <http://ex/name> ?name }"
    );
}

#[tokio::test]
async fn test_default_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-api-key", "secret"))
        .respond_with(select_response(&[], serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig {
        default_headers: vec![("x-api-key".to_string(), "secret".to_string())],
        ..ClientConfig::default()
    };
    let client = SparqlEndpointClient::with_config(format!("{}/sparql", server.uri()), config);
    assert!(client
        .select("SELECT * WHERE { ?s ?p ?o }", None, None)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_probe_on_initialize() {
    let config = ClientConfig {
        probe_on_initialize: true,
        ..ClientConfig::default()
    };

    let healthy =
        mounted(ResponseTemplate::new(200).set_body_json(serde_json::json!({"boolean": true})))
            .await;
    let client =
        SparqlEndpointClient::with_config(format!("{}/sparql", healthy.uri()), config.clone());
    assert!(client.initialize().await.is_ok());

    let broken = mounted(ResponseTemplate::new(503)).await;
    let client = SparqlEndpointClient::with_config(format!("{}/sparql", broken.uri()), config);
    assert!(matches!(
        client.initialize().await,
        Err(FederationError::Connection(_))
    ));
}

#[tokio::test]
async fn test_service_clause_over_http() {
    let server = mounted(select_response(
        &["__rowIdx", "name"],
        serde_json::json!([
            {"__rowIdx": {"type": "literal", "value": "1"},
             "name": {"type": "literal", "value": "Bob"}},
            {"__rowIdx": {"type": "literal", "value": "0"},
             "name": {"type": "literal", "value": "Alice"}}
        ]),
    ))
    .await;
    let endpoint = format!("{}/sparql", server.uri());

    let registry = ServiceRegistry::new();
    let service = registry.get_or_create(&endpoint).await.unwrap();
    let descriptor = ServiceDescriptor::new(
        endpoint.clone(),
        ["person".to_string(), "name".to_string()].into(),
        PatternQueryRenderer::new("?person foaf:name ?name")
            .with_prefix("foaf", "http://xmlns.com/foaf/0.1/"),
    );
    let input = vec![
        Binding::new().with("person", Term::iri("http://ex/alice")),
        Binding::new().with("person", Term::iri("http://ex/bob")),
        Binding::new().with("person", Term::iri("http://ex/carol")),
    ];

    let dispatcher = FederationDispatcher::new(FederationConfig::default());
    let output = dispatcher
        .evaluate(descriptor, service, Box::new(VecBindingSource::new(input)))
        .collect_all()
        .await
        .unwrap();

    assert_eq!(
        output,
        vec![
            Binding::new()
                .with("person", Term::iri("http://ex/bob"))
                .with("name", Term::literal("Bob")),
            Binding::new()
                .with("person", Term::iri("http://ex/alice"))
                .with("name", Term::literal("Alice")),
        ]
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        submitted_query(&requests[0]),
        "PREFIX foaf: <http://xmlns.com/foaf/0.1/>\n\
         SELECT ?__rowIdx ?name WHERE { ?person foaf:name ?name } \
         VALUES (?__rowIdx ?person) {  (\"0\" <http://ex/alice> ) \
         (\"1\" <http://ex/bob> ) (\"2\" <http://ex/carol> ) }"
    );

    registry.unregister_all().await;
}
