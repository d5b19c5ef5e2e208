// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::application::deployment::AgentDeploymentService;
use crate::domain::agent::{AgentConfig, AgentDeploymentRequest, AgentId};
use crate::domain::deployment::DeploymentError;

pub struct AppState {
    pub deployment_service: Arc<dyn AgentDeploymentService>,
    pub start_time: Instant,
}

pub fn app(service: Arc<dyn AgentDeploymentService>) -> Router {
    let state = Arc::new(AppState {
        deployment_service: service,
        start_time: Instant::now(),
    });

    Router::new()
        .route("/health", get(health))
        .route("/invoke", post(invoke))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Request envelope issued by the dashboard.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum InvocationRequest {
    Deploy {
        #[serde(rename = "agentId")]
        agent_id: String,
        #[serde(rename = "tenantId", default)]
        tenant_id: Option<String>,
        #[serde(default)]
        config: AgentConfig,
    },
    Stop {
        #[serde(rename = "agentId")]
        agent_id: String,
    },
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn invoke(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InvocationRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": rejection.body_text(), "retriable": false })),
            )
                .into_response()
        }
    };

    match request {
        InvocationRequest::Deploy {
            agent_id,
            tenant_id,
            config,
        } => {
            let agent_id = match AgentId::parse(agent_id) {
                Ok(id) => id,
                Err(e) => return error_response(DeploymentError::from(e)),
            };
            let mut request = AgentDeploymentRequest::new(agent_id, config);
            if let Some(tenant_id) = tenant_id {
                request = request.with_tenant(tenant_id);
            }
            match state.deployment_service.deploy(request).await {
                Ok(result) => (StatusCode::OK, Json(result)).into_response(),
                Err(e) => error_response(e),
            }
        }
        InvocationRequest::Stop { agent_id } => {
            let agent_id = match AgentId::parse(agent_id) {
                Ok(id) => id,
                Err(e) => return error_response(DeploymentError::from(e)),
            };
            match state.deployment_service.stop(&agent_id).await {
                Ok(()) => (StatusCode::OK, Json(json!({ "ok": true }))).into_response(),
                Err(e) => error_response(e),
            }
        }
    }
}

fn error_response(err: DeploymentError) -> Response {
    let status = match &err {
        DeploymentError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        e if e.is_retriable() => StatusCode::CONFLICT,
        _ => StatusCode::BAD_GATEWAY,
    };
    let mut body = json!({
        "error": err.to_string(),
        "retriable": err.is_retriable(),
    });
    if let Some(step) = err.failed_step() {
        body["step"] = json!(step);
    }
    (status, Json(body)).into_response()
}
