// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deployment Orchestrator Application Service
//!
//! Entry point for the dashboard's two requests. Both are idempotent
//! reconcilers over state observed fresh from the provider on each call;
//! there is no stored status to drift from reality.
//!
//! - `deploy`: sanitize → register definition → ensure target group →
//!   ensure listener rules → reconcile service. The first fatal failure
//!   aborts with the failing step attached. Nothing is rolled back; retrying
//!   the deploy reuses or repairs whatever the failed attempt left behind.
//! - `stop`: scale down and delete the service, then delete the agent rule.
//!   Target groups and definition revisions are kept so the next deploy is
//!   fast and the shared incoming-call rule never points at a deleted group.

use crate::application::definitions::ComputeDefinitionProvisioner;
use crate::application::rules::RoutingRuleManager;
use crate::application::services::ServiceLifecycleManager;
use crate::application::targets::RoutingTargetManager;
use crate::domain::agent::{AgentDeploymentRequest, AgentId};
use crate::domain::cloud::{ContainerCluster, LoadBalancer};
use crate::domain::config::OrchestratorConfig;
use crate::domain::deployment::{DeploymentError, DeploymentResult};
use crate::domain::naming::{self, INCOMING_CALL_PATH};
use crate::domain::prompt;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Service Trait
// ============================================================================

#[async_trait]
pub trait AgentDeploymentService: Send + Sync {
    /// Provision or update everything the agent needs to take calls.
    async fn deploy(&self, request: AgentDeploymentRequest) -> Result<DeploymentResult, DeploymentError>;

    /// Tear the agent down. Succeeds for agents that were never deployed.
    async fn stop(&self, agent_id: &AgentId) -> Result<(), DeploymentError>;
}

// ============================================================================
// Standard Implementation
// ============================================================================

pub struct DeploymentOrchestrator {
    definitions: ComputeDefinitionProvisioner,
    targets: RoutingTargetManager,
    rules: RoutingRuleManager,
    services: ServiceLifecycleManager,
    public_base_url: String,
}

impl DeploymentOrchestrator {
    pub fn new(
        cluster: Arc<dyn ContainerCluster>,
        load_balancer: Arc<dyn LoadBalancer>,
        config: Arc<OrchestratorConfig>,
    ) -> Self {
        Self {
            definitions: ComputeDefinitionProvisioner::new(cluster.clone(), config.clone()),
            targets: RoutingTargetManager::new(load_balancer.clone(), config.clone()),
            rules: RoutingRuleManager::new(load_balancer, config.aws.listener_arn.clone()),
            services: ServiceLifecycleManager::new(cluster, config.clone()),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn run_deploy(&self, request: &AgentDeploymentRequest) -> Result<DeploymentResult, DeploymentError> {
        let agent_id = &request.agent_id;

        let system_prompt = prompt::build_system_prompt(&request.config);
        let definition = self.definitions.provision(request, &system_prompt).await?;
        let target = self.targets.ensure_target(agent_id).await?;
        let bindings = self.rules.ensure_rules(agent_id, &target).await?;
        self.services.reconcile(agent_id, &definition, &target).await?;

        let service_url = format!("{}{}", self.public_base_url, INCOMING_CALL_PATH);
        Ok(DeploymentResult {
            webhook_url: service_url.clone(),
            service_url,
            agent_url: format!("{}{}", self.public_base_url, naming::agent_path_prefix(agent_id)),
            agent_rule_arn: bindings.agent_rule_arn.0,
            incoming_call_rule_arn: bindings.incoming_call_rule_arn.0,
            target_group_arn: target.0,
        })
    }
}

#[async_trait]
impl AgentDeploymentService for DeploymentOrchestrator {
    #[tracing::instrument(skip_all, fields(agent_id = %request.agent_id))]
    async fn deploy(&self, request: AgentDeploymentRequest) -> Result<DeploymentResult, DeploymentError> {
        info!("Deploying agent");
        match self.run_deploy(&request).await {
            Ok(result) => {
                metrics::counter!("tempo_deployments_total", "outcome" => "success").increment(1);
                info!(webhook_url = %result.webhook_url, "Agent deployed");
                Ok(result)
            }
            Err(e) => {
                let outcome = if e.is_retriable() { "conflict" } else { "failure" };
                metrics::counter!("tempo_deployments_total", "outcome" => outcome).increment(1);
                error!(error = %e, retriable = e.is_retriable(), "Agent deploy failed; earlier steps may have left resources in place");
                Err(e)
            }
        }
    }

    #[tracing::instrument(skip_all, fields(agent_id = %agent_id))]
    async fn stop(&self, agent_id: &AgentId) -> Result<(), DeploymentError> {
        info!("Stopping agent");
        self.services.scale_down_and_delete(agent_id).await;

        match self.rules.remove_agent_rule(agent_id).await {
            Ok(_) => {
                metrics::counter!("tempo_stops_total", "outcome" => "success").increment(1);
                info!("Agent stopped");
                Ok(())
            }
            Err(e) => {
                metrics::counter!("tempo_stops_total", "outcome" => "failure").increment(1);
                error!(error = %e, "Agent stop failed");
                Err(e)
            }
        }
    }
}
