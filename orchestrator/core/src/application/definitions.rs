// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Compute Definition Provisioner
//!
//! Registers a new task definition revision for an agent on every deploy.
//! The sanitized system prompt and the telephony settings reach the agent
//! runtime exclusively through container environment variables.

use crate::domain::agent::AgentDeploymentRequest;
use crate::domain::cloud::ContainerCluster;
use crate::domain::compute::{ComputeDefinition, DefinitionArn};
use crate::domain::config::OrchestratorConfig;
use crate::domain::deployment::{DeploymentError, DeploymentStep};
use crate::domain::naming;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

const NETWORK_MODE: &str = "awsvpc";

pub struct ComputeDefinitionProvisioner {
    cluster: Arc<dyn ContainerCluster>,
    config: Arc<OrchestratorConfig>,
}

impl ComputeDefinitionProvisioner {
    pub fn new(cluster: Arc<dyn ContainerCluster>, config: Arc<OrchestratorConfig>) -> Self {
        Self { cluster, config }
    }

    pub fn build_definition(
        &self,
        request: &AgentDeploymentRequest,
        system_prompt: &str,
    ) -> ComputeDefinition {
        let agent = &self.config.agent;
        ComputeDefinition {
            family: naming::family(&request.agent_id),
            cpu: agent.cpu.clone(),
            memory: agent.memory.clone(),
            image: agent.image.clone(),
            container_name: agent.container_name.clone(),
            container_port: agent.port,
            execution_role_arn: self.config.aws.execution_role_arn.clone(),
            task_role_arn: self.config.aws.task_role_arn.clone(),
            network_mode: NETWORK_MODE.to_string(),
            environment: self.environment(request, system_prompt),
        }
    }

    pub async fn provision(
        &self,
        request: &AgentDeploymentRequest,
        system_prompt: &str,
    ) -> Result<DefinitionArn, DeploymentError> {
        let definition = self.build_definition(request, system_prompt);
        let arn = self
            .cluster
            .register_task_definition(&definition)
            .await
            .map_err(|e| DeploymentError::step(DeploymentStep::RegisterDefinition, e))?;

        info!(
            agent_id = %request.agent_id,
            family = %definition.family,
            arn = %arn.as_str(),
            "Registered task definition revision"
        );
        Ok(arn)
    }

    fn environment(
        &self,
        request: &AgentDeploymentRequest,
        system_prompt: &str,
    ) -> BTreeMap<String, String> {
        let config = &request.config;
        let mut env = BTreeMap::new();
        env.insert("AGENT_ID".to_string(), request.agent_id.to_string());
        env.insert("SYSTEM_PROMPT".to_string(), system_prompt.to_string());
        env.insert("PORT".to_string(), self.config.agent.port.to_string());

        let optional = [
            ("TENANT_ID", request.tenant_id.as_deref().unwrap_or_default()),
            ("AGENT_NAME", config.name.as_str()),
            ("CALL_PHONE_NUMBER", config.call_phone_number.as_str()),
            ("TRANSFER_PHONE_NUMBER", config.transfer_phone_number.as_str()),
            ("SUMMARY_PHONE_NUMBER", config.summary_phone_number.as_str()),
            ("TWILIO_ACCOUNT_SID", config.twilio_account_sid.as_str()),
            ("TWILIO_API_SID", config.twilio_api_sid.as_str()),
            ("TWILIO_API_SECRET", config.twilio_api_secret.as_str()),
            ("VOICE_ID", config.voice_id.as_str()),
            ("PUBLIC_BASE_URL", self.config.public_base_url.as_str()),
        ];
        for (key, value) in optional {
            let value = value.trim();
            if !value.is_empty() {
                env.insert(key.to_string(), value.to_string());
            }
        }
        env
    }
}
