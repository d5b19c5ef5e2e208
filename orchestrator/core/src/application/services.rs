// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Service Lifecycle Manager
//!
//! Keeps exactly one replica of an agent's task running behind its target
//! group, or none at all after a stop.

use crate::domain::agent::AgentId;
use crate::domain::cloud::ContainerCluster;
use crate::domain::compute::DefinitionArn;
use crate::domain::config::OrchestratorConfig;
use crate::domain::deployment::{DeploymentError, DeploymentStep};
use crate::domain::naming;
use crate::domain::routing::TargetGroupArn;
use crate::domain::service::{ServiceInstance, ServiceSpec};
use std::sync::Arc;
use tracing::{debug, info, warn};

const RUNNING_REPLICAS: u32 = 1;

pub struct ServiceLifecycleManager {
    cluster: Arc<dyn ContainerCluster>,
    config: Arc<OrchestratorConfig>,
}

impl ServiceLifecycleManager {
    pub fn new(cluster: Arc<dyn ContainerCluster>, config: Arc<OrchestratorConfig>) -> Self {
        Self { cluster, config }
    }

    pub fn service_spec(
        &self,
        agent_id: &AgentId,
        definition: &DefinitionArn,
        target: &TargetGroupArn,
    ) -> ServiceSpec {
        ServiceSpec {
            cluster: self.config.aws.cluster.clone(),
            name: naming::service_name(agent_id),
            definition_arn: definition.clone(),
            desired_count: RUNNING_REPLICAS,
            target_group_arn: target.clone(),
            container_name: self.config.agent.container_name.clone(),
            container_port: self.config.agent.port,
            subnets: self.config.aws.subnets.clone(),
            security_groups: self.config.aws.security_groups.clone(),
            assign_public_ip: true,
        }
    }

    /// Update the running service in place, or create it on first deploy.
    pub async fn reconcile(
        &self,
        agent_id: &AgentId,
        definition: &DefinitionArn,
        target: &TargetGroupArn,
    ) -> Result<ServiceInstance, DeploymentError> {
        let fail = |e| DeploymentError::step(DeploymentStep::ReconcileService, e);
        let spec = self.service_spec(agent_id, definition, target);

        let existing = self
            .cluster
            .describe_service(&spec.cluster, &spec.name)
            .await
            .map_err(fail)?;

        let service = match existing {
            Some(current) => {
                debug!(
                    agent_id = %agent_id,
                    service = %spec.name,
                    previous = %current.definition_arn.as_str(),
                    "Service exists, rolling to new definition"
                );
                let updated = self.cluster.update_service(&spec).await.map_err(fail)?;
                info!(agent_id = %agent_id, service = %spec.name, "Updated service");
                updated
            }
            None => {
                let created = self.cluster.create_service(&spec).await.map_err(fail)?;
                info!(agent_id = %agent_id, service = %spec.name, "Created service");
                created
            }
        };
        Ok(service)
    }

    /// Scale to zero, then force-delete. Both steps are best-effort so a
    /// partially deployed or partially stopped agent can always be stopped.
    pub async fn scale_down_and_delete(&self, agent_id: &AgentId) {
        let cluster = &self.config.aws.cluster;
        let name = naming::service_name(agent_id);

        match self.cluster.set_desired_count(cluster, &name, 0).await {
            Ok(()) => debug!(agent_id = %agent_id, service = %name, "Scaled service to zero"),
            Err(e) if e.is_not_found() => {
                debug!(agent_id = %agent_id, service = %name, "No service to scale down")
            }
            Err(e) => warn!(agent_id = %agent_id, service = %name, error = %e, "Failed to scale down service, continuing"),
        }

        match self.cluster.delete_service(cluster, &name).await {
            Ok(()) => info!(agent_id = %agent_id, service = %name, "Deleted service"),
            Err(e) if e.is_not_found() => {
                debug!(agent_id = %agent_id, service = %name, "No service to delete")
            }
            Err(e) => warn!(agent_id = %agent_id, service = %name, error = %e, "Failed to delete service, continuing"),
        }
    }
}
