// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::compute::DefinitionArn;
use crate::domain::routing::TargetGroupArn;
use serde::{Deserialize, Serialize};

/// Desired state of an agent's long-running service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub cluster: String,
    pub name: String,
    pub definition_arn: DefinitionArn,
    pub desired_count: u32,
    pub target_group_arn: TargetGroupArn,
    pub container_name: String,
    pub container_port: u16,
    pub subnets: Vec<String>,
    pub security_groups: Vec<String>,
    pub assign_public_ip: bool,
}

/// An active service as observed on the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub name: String,
    pub definition_arn: DefinitionArn,
    pub desired_count: u32,
    pub target_group_arn: Option<TargetGroupArn>,
}
