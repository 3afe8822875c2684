//! Integration tests for split-http-client against a mock server.

use split_http_client::*;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, auth: Auth) -> HttpClient {
    let config = HttpClientConfig::builder()
        .base_url(format!("{}/internal/api/v2", server.uri()))
        .client_timeout(Duration::from_secs(30))
        .auth(auth)
        .build();
    HttpClient::new(config).unwrap()
}

#[tokio::test]
async fn test_rate_limited_call_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/internal/api/v2/workspaces"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header(ORG_RESET_HEADER, "0")
                .insert_header(IP_RESET_HEADER, "0"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/internal/api/v2/workspaces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "objects": [], "offset": 0, "limit": 20, "totalCount": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Auth::bearer("admin-key"));
    let response = client.get("/workspaces").send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["totalCount"], 0);
}

#[tokio::test]
async fn test_bearer_header_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/internal/api/v2/apiKeys"))
        .and(header("authorization", "Bearer admin-key"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Auth::bearer("admin-key"));
    let response = client.get("/apiKeys").send().await.unwrap();
    assert!(response.is_success());
}

#[tokio::test]
async fn test_api_key_header_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/internal/api/v2/trafficTypes/ws/ws-1"))
        .and(header(API_KEY_HEADER, "pat.token"))
        .and(body_json(serde_json::json!({"name": "user"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "tt-1", "name": "user"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Auth::api_key("pat.token"));
    let response = client
        .post("/trafficTypes/ws/ws-1")
        .json(&serde_json::json!({"name": "user"}))
        .send()
        .await
        .unwrap();
    assert!(response.is_success());
}

#[tokio::test]
async fn test_error_status_returned_unmodified() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/internal/api/v2/segments/env-1/beta"))
        .and(query_param("force", "true"))
        .respond_with(ResponseTemplate::new(409).set_body_string("segment in use"))
        .mount(&server)
        .await;

    let client = client_for(&server, Auth::bearer("admin-key"));
    let response = client
        .delete("/segments/env-1/beta")
        .query("force", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let err = response.error_for_status().unwrap_err();
    assert_eq!(err.status_code(), Some(StatusCode::CONFLICT));
    assert!(err.to_string().contains("segment in use"));
}
