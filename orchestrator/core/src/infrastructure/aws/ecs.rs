// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use super::map_sdk_error;
use crate::domain::cloud::{CloudError, ContainerCluster};
use crate::domain::compute::{ComputeDefinition, DefinitionArn};
use crate::domain::routing::TargetGroupArn;
use crate::domain::service::{ServiceInstance, ServiceSpec};
use async_trait::async_trait;
use aws_sdk_ecs::types::{
    AssignPublicIp, AwsVpcConfiguration, Compatibility, ContainerDefinition, KeyValuePair,
    LaunchType, LoadBalancer, NetworkConfiguration, NetworkMode, PortMapping, Service,
    TransportProtocol,
};
use aws_sdk_ecs::Client;
use tracing::debug;

const ACTIVE: &str = "ACTIVE";

pub struct EcsCluster {
    client: Client,
}

impl EcsCluster {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn load_balancer(spec: &ServiceSpec) -> LoadBalancer {
        LoadBalancer::builder()
            .target_group_arn(spec.target_group_arn.as_str())
            .container_name(&spec.container_name)
            .container_port(i32::from(spec.container_port))
            .build()
    }

    fn network_configuration(spec: &ServiceSpec) -> Result<NetworkConfiguration, CloudError> {
        let assign_public_ip = if spec.assign_public_ip {
            AssignPublicIp::Enabled
        } else {
            AssignPublicIp::Disabled
        };
        let vpc = AwsVpcConfiguration::builder()
            .set_subnets(Some(spec.subnets.clone()))
            .set_security_groups(Some(spec.security_groups.clone()))
            .assign_public_ip(assign_public_ip)
            .build()
            .map_err(|e| CloudError::provider("CreateService", e.to_string()))?;
        Ok(NetworkConfiguration::builder().awsvpc_configuration(vpc).build())
    }
}

fn service_instance(operation: &str, service: Option<&Service>) -> Result<ServiceInstance, CloudError> {
    let service = service.ok_or_else(|| CloudError::provider(operation, "response carried no service"))?;
    Ok(ServiceInstance {
        name: service.service_name().unwrap_or_default().to_string(),
        definition_arn: DefinitionArn::new(service.task_definition().unwrap_or_default()),
        desired_count: u32::try_from(service.desired_count()).unwrap_or(0),
        target_group_arn: service
            .load_balancers()
            .iter()
            .find_map(|lb| lb.target_group_arn())
            .map(TargetGroupArn::new),
    })
}

#[async_trait]
impl ContainerCluster for EcsCluster {
    async fn register_task_definition(&self, definition: &ComputeDefinition) -> Result<DefinitionArn, CloudError> {
        let environment: Vec<KeyValuePair> = definition
            .environment
            .iter()
            .map(|(name, value)| KeyValuePair::builder().name(name).value(value).build())
            .collect();

        let container = ContainerDefinition::builder()
            .name(&definition.container_name)
            .image(&definition.image)
            .essential(true)
            .port_mappings(
                PortMapping::builder()
                    .container_port(i32::from(definition.container_port))
                    .protocol(TransportProtocol::Tcp)
                    .build(),
            )
            .set_environment(Some(environment))
            .build();

        let output = self
            .client
            .register_task_definition()
            .family(&definition.family)
            .network_mode(NetworkMode::from(definition.network_mode.as_str()))
            .requires_compatibilities(Compatibility::Fargate)
            .cpu(&definition.cpu)
            .memory(&definition.memory)
            .execution_role_arn(&definition.execution_role_arn)
            .task_role_arn(&definition.task_role_arn)
            .container_definitions(container)
            .send()
            .await
            .map_err(|e| map_sdk_error("RegisterTaskDefinition", e))?;

        output
            .task_definition()
            .and_then(|td| td.task_definition_arn())
            .map(DefinitionArn::new)
            .ok_or_else(|| CloudError::provider("RegisterTaskDefinition", "response carried no task definition ARN"))
    }

    async fn describe_service(&self, cluster: &str, name: &str) -> Result<Option<ServiceInstance>, CloudError> {
        let output = self
            .client
            .describe_services()
            .cluster(cluster)
            .services(name)
            .send()
            .await
            .map_err(|e| map_sdk_error("DescribeServices", e))?;

        // Deleted services linger as INACTIVE for a while and must not count.
        match output.services().iter().find(|s| s.status() == Some(ACTIVE)) {
            Some(service) => service_instance("DescribeServices", Some(service)).map(Some),
            None => {
                debug!(cluster, service = name, "No active service");
                Ok(None)
            }
        }
    }

    async fn create_service(&self, spec: &ServiceSpec) -> Result<ServiceInstance, CloudError> {
        let output = self
            .client
            .create_service()
            .cluster(&spec.cluster)
            .service_name(&spec.name)
            .task_definition(spec.definition_arn.as_str())
            .desired_count(spec.desired_count as i32)
            .launch_type(LaunchType::Fargate)
            .network_configuration(Self::network_configuration(spec)?)
            .load_balancers(Self::load_balancer(spec))
            .send()
            .await
            .map_err(|e| map_sdk_error("CreateService", e))?;

        service_instance("CreateService", output.service())
    }

    async fn update_service(&self, spec: &ServiceSpec) -> Result<ServiceInstance, CloudError> {
        let output = self
            .client
            .update_service()
            .cluster(&spec.cluster)
            .service(&spec.name)
            .task_definition(spec.definition_arn.as_str())
            .desired_count(spec.desired_count as i32)
            .network_configuration(Self::network_configuration(spec)?)
            .load_balancers(Self::load_balancer(spec))
            .force_new_deployment(true)
            .send()
            .await
            .map_err(|e| map_sdk_error("UpdateService", e))?;

        service_instance("UpdateService", output.service())
    }

    async fn set_desired_count(&self, cluster: &str, name: &str, count: u32) -> Result<(), CloudError> {
        self.client
            .update_service()
            .cluster(cluster)
            .service(name)
            .desired_count(count as i32)
            .send()
            .await
            .map_err(|e| map_sdk_error("UpdateService", e))?;
        Ok(())
    }

    async fn delete_service(&self, cluster: &str, name: &str) -> Result<(), CloudError> {
        self.client
            .delete_service()
            .cluster(cluster)
            .service(name)
            .force(true)
            .send()
            .await
            .map_err(|e| map_sdk_error("DeleteService", e))?;
        Ok(())
    }
}
