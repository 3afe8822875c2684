//! End-to-end tests of the provider resources against a mock admin API.

use serde_json::json;
use split_provider::prelude::*;
use split_provider::{
    BucketBlock, ConditionBlock, DefinitionError, MatcherBlock, ReconcileError, RuleBlock,
    SEGMENT_KEYS_COMMENT, SegmentKeysState, TreatmentBlock,
};
use std::collections::BTreeSet;
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WORKSPACE: &str = "6a1b8f5e-2c1d-4e8a-9f0b-1c2d3e4f5a6b";
const ENVIRONMENT: &str = "0f9e8d7c-6b5a-4c3d-8e2f-1a0b9c8d7e6f";

fn provider_for(server: &MockServer) -> Provider {
    let config = ProviderConfig::builder()
        .api_key("admin-key")
        .base_url(format!("{}/internal/api/v2", server.uri()))
        .flag_sets_url(format!("{}/api/v3", server.uri()))
        .client_timeout(Duration::from_secs(30))
        .build();
    Provider::configure(config).unwrap()
}

fn definition_path() -> String {
    format!(
        "/internal/api/v2/splits/ws/{}/new_checkout/environments/{}",
        WORKSPACE, ENVIRONMENT
    )
}

fn definition_body() -> serde_json::Value {
    json!({
        "id": "def-1",
        "name": "new_checkout",
        "environment": {"id": ENVIRONMENT, "name": "Production"},
        "trafficType": {"id": "tt-1", "name": "user"},
        "killed": false,
        "treatments": [
            {"name": "on", "configurations": "", "keys": []},
            {"name": "off"}
        ],
        "defaultTreatment": "off",
        "trafficAllocation": 100,
        "rules": [
            {
                "condition": {
                    "combiner": "AND",
                    "matchers": [{"type": "IN_SEGMENT", "string": "beta_testers"}]
                },
                "buckets": [{"treatment": "on", "size": 100}]
            }
        ],
        "defaultRule": [{"treatment": "off", "size": 100}]
    })
}

fn definition_config() -> SplitDefinitionConfig {
    SplitDefinitionConfig {
        workspace_id: WORKSPACE.to_string(),
        split_name: "new_checkout".to_string(),
        environment_id: ENVIRONMENT.to_string(),
        default_treatment: "off".to_string(),
        traffic_allocation: Some(100),
        treatments: vec![treatment("on"), treatment("off")],
        default_rule: vec![bucket("off", 100)],
        rules: vec![RuleBlock {
            buckets: vec![bucket("on", 100)],
            conditions: vec![ConditionBlock {
                combiner: "AND".to_string(),
                matchers: vec![MatcherBlock {
                    matcher_type: "IN_SEGMENT".to_string(),
                    string: Some("beta_testers".to_string()),
                    ..Default::default()
                }],
            }],
        }],
    }
}

fn treatment(name: &str) -> TreatmentBlock {
    TreatmentBlock {
        name: name.to_string(),
        configurations: None,
        description: None,
        keys: None,
        segments: None,
    }
}

fn bucket(treatment: &str, size: u32) -> BucketBlock {
    BucketBlock {
        treatment: treatment.to_string(),
        size,
    }
}

fn set(keys: &[&str]) -> BTreeSet<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

fn keys_body(keys: &[&str]) -> serde_json::Value {
    let keys: Vec<_> = keys.iter().map(|k| json!({"key": k})).collect();
    json!({"keys": keys, "offset": 0, "limit": 100, "count": keys.len()})
}

#[tokio::test]
async fn test_create_definition_then_reads_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(definition_path()))
        .and(header("authorization", "Bearer admin-key"))
        .and(body_partial_json(json!({
            "defaultTreatment": "off",
            "rules": [{"condition": {"combiner": "AND"}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(definition_body()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(definition_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(definition_body()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let state = provider.split_definitions().create(&definition_config()).await.unwrap();

    assert_eq!(state.id, "def-1");
    assert!(!state.killed);
    assert_eq!(state.config, definition_config());
}

#[tokio::test]
async fn test_invalid_definition_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = definition_config();
    config.default_rule = vec![bucket("off", 60)];

    let provider = provider_for(&server);
    let err = provider.split_definitions().create(&config).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Definition {
            source: DefinitionError::DefaultRuleSizeMismatch { sum: 60 },
            ..
        }
    ));
}

#[tokio::test]
async fn test_create_definition_requires_uuid_ids() {
    let server = MockServer::start().await;
    let mut config = definition_config();
    config.environment_id = "production".to_string();

    let provider = provider_for(&server);
    let err = provider.split_definitions().create(&config).await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidArgument { field: "environment_id", .. }));
}

#[tokio::test]
async fn test_import_definition() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(definition_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(definition_body()))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let id = format!("{}:new_checkout:{}", WORKSPACE, ENVIRONMENT);
    let state = provider.split_definitions().import(&id).await.unwrap();

    assert_eq!(state.config.workspace_id, WORKSPACE);
    assert_eq!(state.config.environment_id, ENVIRONMENT);
    assert_eq!(state.config.treatments[0].configurations, None);
    assert_eq!(state.config.treatments[0].keys, None);

    let err = provider.split_definitions().import("new_checkout").await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidImportId { expected: 3, .. }));
}

#[tokio::test]
async fn test_update_definition_sends_full_body() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(definition_path()))
        .and(body_partial_json(json!({
            "trafficAllocation": 100,
            "defaultRule": [{"treatment": "off", "size": 100}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(definition_body()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(definition_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(definition_body()))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let state = provider.split_definitions().update(&definition_config()).await.unwrap();
    assert_eq!(state.config.rules.len(), 1);
}

#[tokio::test]
async fn test_missing_definition_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(definition_path()))
        .respond_with(ResponseTemplate::new(404).set_body_string("split not found"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .split_definitions()
        .read(WORKSPACE, "new_checkout", ENVIRONMENT)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_segment_keys_update_removes_then_uploads() {
    let server = MockServer::start().await;
    let base = format!("/internal/api/v2/segments/{}/beta", ENVIRONMENT);

    Mock::given(method("PUT"))
        .and(path(format!("{}/removeKeys", base)))
        .and(body_json(json!({"keys": ["a", "b"], "comment": SEGMENT_KEYS_COMMENT})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("{}/uploadKeys", base)))
        .and(query_param("replace", "true"))
        .and(body_json(json!({"keys": ["b", "c"], "comment": SEGMENT_KEYS_COMMENT})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/keys", base)))
        .respond_with(ResponseTemplate::new(200).set_body_json(keys_body(&["b", "c"])))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let resource = provider.segment_keys();
    let state = SegmentKeysState {
        id: format!("{}:beta", ENVIRONMENT),
        environment_id: ENVIRONMENT.to_string(),
        segment_name: "beta".to_string(),
        keys: set(&["a", "b"]),
    };

    let updated = resource.update(&state, &set(&["b", "c"])).await.unwrap();
    assert_eq!(updated.keys, set(&["b", "c"]));
    assert_eq!(updated.id, state.id);
}

#[tokio::test]
async fn test_segment_keys_upload_failure_is_reported() {
    let server = MockServer::start().await;
    let base = format!("/internal/api/v2/segments/{}/beta", ENVIRONMENT);

    Mock::given(method("PUT"))
        .and(path(format!("{}/uploadKeys", base)))
        .respond_with(ResponseTemplate::new(400).set_body_string("too many keys"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .segment_keys()
        .create(ENVIRONMENT, "beta", &set(&["a"]))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::SegmentKeys(ReconcileError::Add { .. })));
    assert!(err.to_string().contains("beta"));
}

#[tokio::test]
async fn test_segment_keys_import() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/internal/api/v2/segments/{}/beta/keys", ENVIRONMENT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(keys_body(&["x", "y"])))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let state = provider
        .segment_keys()
        .import(&format!("{}:beta", ENVIRONMENT))
        .await
        .unwrap();

    assert_eq!(state.keys, set(&["x", "y"]));
    assert_eq!(state.segment_name, "beta");
}

#[tokio::test]
async fn test_segment_keys_delete_removes_keys_beyond_first_page() {
    let server = MockServer::start().await;
    let base = format!("/internal/api/v2/segments/{}/beta", ENVIRONMENT);
    let all: Vec<String> = (0..130).map(|i| format!("user-{:03}", i)).collect();
    let page = |keys: &[String], offset: usize| {
        let keys: Vec<_> = keys.iter().map(|k| json!({"key": k})).collect();
        json!({"keys": keys, "offset": offset, "limit": 100, "count": 130})
    };

    Mock::given(method("GET"))
        .and(path(format!("{}/keys", base)))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&all[..100], 0)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/keys", base)))
        .and(query_param("offset", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&all[100..], 100)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("{}/removeKeys", base)))
        .and(body_json(json!({"keys": all, "comment": SEGMENT_KEYS_COMMENT})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let resource = provider.segment_keys();
    let state = resource.read(ENVIRONMENT, "beta").await.unwrap();
    assert_eq!(state.keys.len(), 130);

    resource.delete(&state).await.unwrap();
}

#[tokio::test]
async fn test_harness_token_uses_api_key_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/internal/api/v2/segments/{}/beta/keys", ENVIRONMENT)))
        .and(header("x-api-key", "pat.abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(keys_body(&["x"])))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig::builder()
        .harness_token("pat.abc")
        .base_url(format!("{}/internal/api/v2", server.uri()))
        .build();
    let provider = Provider::configure(config).unwrap();

    assert!(provider.groups().is_err());
    let state = provider.segment_keys().read(ENVIRONMENT, "beta").await.unwrap();
    assert_eq!(state.keys, set(&["x"]));
}

#[tokio::test]
async fn test_delete_environment_honours_state_only_setting() {
    let server = MockServer::start().await;
    let env_path = format!("/internal/api/v2/environments/ws/{}/{}", WORKSPACE, ENVIRONMENT);

    Mock::given(method("DELETE"))
        .and(path(env_path))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    assert!(provider.delete_environment(WORKSPACE, ENVIRONMENT).await.unwrap());

    let config = ProviderConfig::builder()
        .api_key("admin-key")
        .base_url(format!("{}/internal/api/v2", server.uri()))
        .remove_environment_from_state_only(true)
        .build();
    let state_only = Provider::configure(config).unwrap();
    assert!(!state_only.delete_environment(WORKSPACE, ENVIRONMENT).await.unwrap());
}
