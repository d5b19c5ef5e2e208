// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Cloud Provider Ports
//!
//! The two remote APIs the orchestrator reconciles against: the container
//! cluster (task definitions and services) and the shared load balancer
//! (target groups and listener rules). Implemented by the AWS adapters in
//! `crate::infrastructure::aws` and by `InMemoryCloud` for tests and local
//! runs.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Provider-agnostic interfaces and error classification

use crate::domain::compute::{ComputeDefinition, DefinitionArn};
use crate::domain::routing::{ListenerRule, RoutingTarget, RuleArn, TargetGroupArn, TargetGroupSpec};
use crate::domain::service::{ServiceInstance, ServiceSpec};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CloudError {
    /// The addressed resource does not exist (or is no longer active).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The provider rejected a write that collides with existing state,
    /// e.g. a listener priority taken by a concurrent deploy.
    #[error("Conflicting resource state: {0}")]
    Conflict(String),

    #[error("{operation} failed: {message}")]
    Provider { operation: String, message: String },
}

impl CloudError {
    pub fn provider(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CloudError::Conflict(_))
    }
}

#[async_trait]
pub trait ContainerCluster: Send + Sync {
    /// Register a new revision; never mutates an existing one.
    async fn register_task_definition(
        &self,
        definition: &ComputeDefinition,
    ) -> Result<DefinitionArn, CloudError>;

    /// Only active services are returned; draining or deleted ones are `None`.
    async fn describe_service(
        &self,
        cluster: &str,
        name: &str,
    ) -> Result<Option<ServiceInstance>, CloudError>;

    async fn create_service(&self, spec: &ServiceSpec) -> Result<ServiceInstance, CloudError>;

    async fn update_service(&self, spec: &ServiceSpec) -> Result<ServiceInstance, CloudError>;

    async fn set_desired_count(&self, cluster: &str, name: &str, count: u32) -> Result<(), CloudError>;

    /// Force-delete, without waiting for running tasks to drain.
    async fn delete_service(&self, cluster: &str, name: &str) -> Result<(), CloudError>;
}

#[async_trait]
pub trait LoadBalancer: Send + Sync {
    async fn find_target_group(&self, name: &str) -> Result<Option<RoutingTarget>, CloudError>;

    async fn create_target_group(&self, spec: &TargetGroupSpec) -> Result<RoutingTarget, CloudError>;

    /// Every rule on the listener, across all agents, default rule included.
    async fn list_rules(&self, listener_arn: &str) -> Result<Vec<ListenerRule>, CloudError>;

    async fn create_rule(
        &self,
        listener_arn: &str,
        priority: u32,
        path_pattern: &str,
        target: &TargetGroupArn,
    ) -> Result<ListenerRule, CloudError>;

    /// Replace the rule's actions with a single forward to `target`.
    async fn set_rule_target(&self, rule: &RuleArn, target: &TargetGroupArn) -> Result<(), CloudError>;

    async fn delete_rule(&self, rule: &RuleArn) -> Result<(), CloudError>;
}
