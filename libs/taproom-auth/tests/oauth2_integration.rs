//! Outbound client-credentials flow end to end: mock token endpoint →
//! `TokenRegistry` → `HttpClient` with bearer auth → mock API.

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use taproom_auth::{
    HttpClientBuilderExt, OAuthClientConfig, RefreshPolicy, TokenError, TokenProvider, TokenRegistry,
};
use url::Url;

fn token_json(token: &str, expires_in: u64) -> String {
    format!(r#"{{"access_token":"{token}","expires_in":{expires_in},"token_type":"Bearer"}}"#)
}

fn oauth_config(server: &MockServer) -> OAuthClientConfig {
    OAuthClientConfig::new(
        Url::parse(&server.url("/oauth2/token")).unwrap(),
        "beer-catalog-client",
        "secret",
    )
    .with_scopes(["beer.read", "beer.write"])
    .with_http_config(taproom_http::HttpClientConfig::for_testing())
    .with_refresh(RefreshPolicy {
        jitter: Duration::ZERO,
        min_period: Duration::from_millis(100),
        ..RefreshPolicy::default()
    })
}

#[tokio::test]
async fn full_oauth2_bearer_flow() {
    let oauth_server = MockServer::start();
    let token_mock = oauth_server.mock(|when, then| {
        when.method(POST)
            .path("/oauth2/token")
            .body_includes("grant_type=client_credentials")
            .body_includes("scope=beer.read+beer.write");
        then.status(200)
            .header("content-type", "application/json")
            .body(token_json("integration-tok", 3600));
    });

    let api_server = MockServer::start();
    let api_mock = api_server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/beer")
            .header("authorization", "Bearer integration-tok");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"status":"ok"}"#);
    });

    let registry = TokenRegistry::from_configs([("springauth", oauth_config(&oauth_server))])
        .await
        .unwrap();

    let client = taproom_http::HttpClientBuilder::new()
        .allow_insecure_http()
        .base_url(Url::parse(&api_server.url("/api/v1")).unwrap())
        .with_bearer_auth(Arc::new(registry), "springauth")
        .build()
        .unwrap();

    // Two calls share the cached token
    for _ in 0..2 {
        let resp = client
            .get("beer")
            .send()
            .await
            .unwrap()
            .error_for_status()
            .unwrap();
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
    }

    token_mock.assert_calls(1);
    api_mock.assert_calls(2);
}

#[tokio::test]
async fn unknown_registration_blocks_request() {
    let oauth_server = MockServer::start();
    let _token_mock = oauth_server.mock(|when, then| {
        when.method(POST).path("/oauth2/token");
        then.status(200)
            .header("content-type", "application/json")
            .body(token_json("unused", 3600));
    });

    let api_server = MockServer::start();
    let api_mock = api_server.mock(|when, then| {
        when.method(GET).path("/api/v1/beer");
        then.status(200);
    });

    let registry = TokenRegistry::from_configs([("springauth", oauth_config(&oauth_server))])
        .await
        .unwrap();
    assert!(matches!(
        registry.authorize("other").await,
        Err(TokenError::UnknownRegistration(_))
    ));

    let client = taproom_http::HttpClientBuilder::new()
        .allow_insecure_http()
        .with_bearer_auth(Arc::new(registry), "other")
        .build()
        .unwrap();

    let err = client
        .get(&api_server.url("/api/v1/beer"))
        .send()
        .await
        .unwrap_err();
    assert!(err.is_transport_caused_by::<TokenError>(), "got: {err:?}");
    api_mock.assert_calls(0);
}
