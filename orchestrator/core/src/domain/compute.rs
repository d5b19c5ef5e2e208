// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference to one registered task definition revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefinitionArn(pub String);

impl DefinitionArn {
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Immutable description of an agent container.
///
/// A fresh revision is registered on every deploy; earlier revisions are
/// never mutated or deregistered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeDefinition {
    pub family: String,
    /// CPU units as the provider expects them (e.g. "256").
    pub cpu: String,
    /// Memory in MiB as the provider expects it (e.g. "512").
    pub memory: String,
    pub image: String,
    pub container_name: String,
    pub container_port: u16,
    pub execution_role_arn: String,
    pub task_role_arn: String,
    pub network_mode: String,
    /// Ordered so registered revisions diff cleanly.
    pub environment: BTreeMap<String, String>,
}
