use std::time::Duration;

use kgfed_config::FederationConfig;
use kgfed_core::BuildErrorKind;
use kgfed_schema::SchemaBuilder;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_json(server: &MockServer, at: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn config(toml: &str) -> FederationConfig {
    FederationConfig::from_toml(toml).expect("valid config")
}

#[tokio::test]
async fn remote_schema_is_fetched_relative_to_backplane() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/graph/rtx/schema",
        json!({"biolink:Gene": {"biolink:Disease": ["biolink:related_to"]}}),
    )
    .await;

    let builder = SchemaBuilder::new(config(&format!(
        r#"
backplane = "{}"

[providers.kp1]
url = "/graph/kp1"
schema = {{ gene = {{ disease = "related_to" }} }}

[providers.rtx]
url = "/graph/rtx"
schema = "/graph/rtx/schema"
"#,
        server.uri()
    )));

    let snapshot = builder.build().await;
    assert!(snapshot.errors().is_empty(), "{:?}", snapshot.errors());

    let edge = snapshot
        .graph()
        .get_edge("gene", "disease", Some("related_to"))
        .unwrap();
    assert_eq!(
        edge.providers.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["kp1", "rtx"]
    );
    assert_eq!(snapshot.provider("rtx").unwrap().url, "/graph/rtx");
}

#[tokio::test]
async fn fetch_failures_are_classified_and_isolated() {
    let server = MockServer::start().await;
    mount_json(&server, "/graph/good/schema", json!({"gene": {"disease": "related_to"}})).await;
    Mock::given(method("GET"))
        .and(path("/graph/slow/schema"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"gene": {"protein": "codes_for"}}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/graph/down/schema"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_json(&server, "/graph/error/schema", json!({"message": "backend unavailable"})).await;

    // A port nobody listens on any more refuses connections.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let closed_uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let builder = SchemaBuilder::new(config(&format!(
        r#"
backplane = "{backplane}"
request_timeout = "300ms"

[providers.good]
url = "/graph/good"
schema = "/graph/good/schema"

[providers.slow]
url = "/graph/slow"
schema = "/graph/slow/schema"

[providers.down]
url = "/graph/down"
schema = "/graph/down/schema"

[providers.error]
url = "/graph/error"
schema = "/graph/error/schema"

[providers.gone]
url = "/graph/gone"
schema = "{closed_uri}/schema"
"#,
        backplane = server.uri()
    )));

    let snapshot = builder.build().await;

    let providers: Vec<_> = snapshot.providers().keys().map(String::as_str).collect();
    assert_eq!(providers, vec!["good"]);

    let mut failures: Vec<_> = snapshot
        .errors()
        .iter()
        .map(|e| (e.provider().to_string(), e.kind()))
        .collect();
    failures.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        failures,
        vec![
            ("down".to_string(), BuildErrorKind::Fetch),
            ("error".to_string(), BuildErrorKind::MalformedSchema),
            ("gone".to_string(), BuildErrorKind::Connection),
            ("slow".to_string(), BuildErrorKind::Timeout),
        ]
    );

    let timeout = snapshot
        .errors()
        .iter()
        .find(|e| e.kind() == BuildErrorKind::Timeout)
        .unwrap();
    assert_eq!(
        timeout.to_string(),
        format!(
            "Request timed out while fetching schema at \"{}/graph/slow/schema\"",
            server.uri()
        )
    );
}

#[tokio::test]
async fn registry_expands_into_providers() {
    let server = MockServer::start().await;
    mount_json(&server, "/graph/automat/registry", json!(["ctd", "uberon", "hetio"])).await;
    mount_json(
        &server,
        "/graph/automat/ctd/predicates",
        json!({"chemical_substance": {"gene": "affects"}}),
    )
    .await;
    mount_json(
        &server,
        "/graph/automat/hetio/predicates",
        json!({"gene": {"anatomical_entity": "expressed_in"}}),
    )
    .await;

    let toml = format!(
        r#"
backplane = "{}"

[providers.automat]
registry = "automat"
registry_url = "/graph/automat"
exclude = ["uberon"]
"#,
        server.uri()
    );

    let snapshot = SchemaBuilder::new(config(&toml)).build().await;
    assert!(snapshot.errors().is_empty(), "{:?}", snapshot.errors());

    let providers: Vec<_> = snapshot.providers().keys().map(String::as_str).collect();
    assert_eq!(providers, vec!["automat_ctd", "automat_hetio"]);
    assert_eq!(
        snapshot.provider("automat_ctd").unwrap().url,
        "/graph/automat/ctd"
    );
    assert!(
        snapshot
            .graph()
            .get_edge("chemical_substance", "gene", None)
            .unwrap()
            .is_offered_by("automat_ctd")
    );

    let mut disabled = config(&toml);
    disabled.use_registry = false;
    let snapshot = SchemaBuilder::new(disabled).build().await;
    assert!(snapshot.providers().is_empty());
    assert!(snapshot.errors().is_empty());
}

#[tokio::test]
async fn missing_registry_entry_is_reported_under_its_provider_id() {
    let server = MockServer::start().await;
    mount_json(&server, "/graph/automat/registry", json!(["ctd", "pharos"])).await;
    mount_json(
        &server,
        "/graph/automat/ctd/predicates",
        json!({"chemical_substance": {"gene": "affects"}}),
    )
    .await;

    let snapshot = SchemaBuilder::new(config(&format!(
        r#"
backplane = "{}"

[providers.automat]
registry = "automat"
registry_url = "/graph/automat"
"#,
        server.uri()
    )))
    .build()
    .await;

    assert_eq!(snapshot.providers().len(), 1);
    assert_eq!(snapshot.errors().len(), 1);
    assert_eq!(snapshot.errors()[0].provider(), "automat_pharos");
    assert_eq!(snapshot.errors()[0].kind(), BuildErrorKind::Fetch);
}

#[tokio::test]
async fn conversion_entry_only_supplies_url() {
    let snapshot = SchemaBuilder::new(config(
        r#"
[providers.implicit_conversion]
url = "/graph/implicit_conversion"

[providers.kp1]
url = "/graph/kp1"
schema = { gene = { disease = "related_to" } }
"#,
    ))
    .build()
    .await;

    assert_eq!(snapshot.conversion_url(), Some("/graph/implicit_conversion"));
    let providers: Vec<_> = snapshot.providers().keys().map(String::as_str).collect();
    assert_eq!(providers, vec!["kp1"]);
}
