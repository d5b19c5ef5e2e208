// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP contract of the invocation API.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use tempo_orchestrator_core::application::deployment::DeploymentOrchestrator;
use tempo_orchestrator_core::domain::cloud::CloudError;
use tempo_orchestrator_core::domain::config::OrchestratorConfig;
use tempo_orchestrator_core::infrastructure::in_memory::{InMemoryCloud, Operation};
use tempo_orchestrator_core::presentation::api::app;

fn router() -> (Arc<InMemoryCloud>, axum::Router) {
    let mut config = OrchestratorConfig::default();
    config.aws.cluster = "tempo-agents".to_string();
    config.aws.listener_arn = "listener-1".to_string();
    config.aws.vpc_id = "vpc-1".to_string();
    config.public_base_url = "https://voice.example.com".to_string();

    let cloud = Arc::new(InMemoryCloud::new());
    let orchestrator = DeploymentOrchestrator::new(cloud.clone(), cloud.clone(), Arc::new(config));
    (cloud, app(Arc::new(orchestrator)))
}

async fn invoke(router: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/invoke")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (_, router) = router();
    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_deploy_returns_camel_case_result() {
    let (_, router) = router();
    let (status, body) = invoke(
        router,
        json!({
            "action": "deploy",
            "agentId": "a1",
            "tenantId": "t1",
            "config": { "name": "Front Desk", "prompt": "Hello", "guardrails": ["Be kind"] }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["serviceUrl"], "https://voice.example.com/incoming-call");
    assert_eq!(body["webhookUrl"], body["serviceUrl"]);
    assert_eq!(body["agentUrl"], "https://voice.example.com/agents/a1");
    assert!(body["targetGroupArn"].as_str().is_some_and(|arn| arn.contains("tg-a1")));
}

#[tokio::test]
async fn test_stop_returns_ok() {
    let (_, router) = router();
    let (status, body) = invoke(router, json!({ "action": "stop", "agentId": "a1" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn test_invalid_agent_id_is_bad_request() {
    let (cloud, router) = router();
    let (status, body) = invoke(router, json!({ "action": "deploy", "agentId": "../etc" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["retriable"], false);
    assert_eq!(cloud.call_count(Operation::RegisterTaskDefinition), 0);
}

#[tokio::test]
async fn test_underscore_agent_id_is_rejected_before_provisioning() {
    let (cloud, router) = router();
    let (status, body) = invoke(router, json!({ "action": "deploy", "agentId": "agent_1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("agent_1")));
    assert_eq!(cloud.call_count(Operation::RegisterTaskDefinition), 0);
    assert_eq!(cloud.call_count(Operation::CreateTargetGroup), 0);
}

#[tokio::test]
async fn test_unknown_action_is_bad_request() {
    let (_, router) = router();
    let (status, body) = invoke(router, json!({ "action": "restart", "agentId": "a1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_conflict_maps_to_409() {
    let (cloud, router) = router();
    cloud.fail_on(Operation::CreateRule, CloudError::Conflict("Priority in use".to_string()));

    let (status, body) = invoke(router, json!({ "action": "deploy", "agentId": "a1" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["retriable"], true);
    assert_eq!(body["step"], "ensure_rules");
}

#[tokio::test]
async fn test_provider_failure_maps_to_502() {
    let (cloud, router) = router();
    cloud.fail_on(
        Operation::FindTargetGroup,
        CloudError::provider("DescribeTargetGroups", "AccessDenied"),
    );

    let (status, body) = invoke(router, json!({ "action": "deploy", "agentId": "a1" })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["retriable"], false);
    assert_eq!(body["step"], "ensure_target");
}
