// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod definitions;
pub mod deployment;
pub mod rules;
pub mod services;
pub mod targets;

// Re-export use cases for convenience
pub use deployment::{AgentDeploymentService, DeploymentOrchestrator};
