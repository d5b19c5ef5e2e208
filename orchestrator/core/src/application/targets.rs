// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::agent::AgentId;
use crate::domain::cloud::LoadBalancer;
use crate::domain::config::OrchestratorConfig;
use crate::domain::deployment::{DeploymentError, DeploymentStep};
use crate::domain::naming;
use crate::domain::routing::{TargetGroupArn, TargetGroupSpec};
use std::sync::Arc;
use tracing::{debug, info};

/// Create-or-reuse of the one target group each agent owns.
pub struct RoutingTargetManager {
    load_balancer: Arc<dyn LoadBalancer>,
    config: Arc<OrchestratorConfig>,
}

impl RoutingTargetManager {
    pub fn new(load_balancer: Arc<dyn LoadBalancer>, config: Arc<OrchestratorConfig>) -> Self {
        Self {
            load_balancer,
            config,
        }
    }

    /// An existing group is returned untouched; its shape never changes
    /// after creation.
    pub async fn ensure_target(&self, agent_id: &AgentId) -> Result<TargetGroupArn, DeploymentError> {
        let name = naming::target_group_name(agent_id);
        let fail = |e| DeploymentError::step(DeploymentStep::EnsureTarget, e);

        if let Some(existing) = self.load_balancer.find_target_group(&name).await.map_err(fail)? {
            debug!(agent_id = %agent_id, name = %name, "Reusing target group");
            return Ok(existing.arn);
        }

        let spec = TargetGroupSpec {
            name: name.clone(),
            port: self.config.agent.port,
            vpc_id: self.config.aws.vpc_id.clone(),
            health_check_path: self.config.agent.health_check_path.clone(),
        };
        let created = self.load_balancer.create_target_group(&spec).await.map_err(fail)?;

        info!(agent_id = %agent_id, name = %name, arn = %created.arn.as_str(), "Created target group");
        Ok(created.arn)
    }
}
