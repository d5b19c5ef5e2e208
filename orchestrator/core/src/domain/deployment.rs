// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deployment Outcome
//!
//! What a deploy hands back to the dashboard, and how a failed deploy or
//! stop is reported. A failed deploy may have left earlier resources in
//! place; callers retry the whole deploy rather than assuming nothing
//! changed.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Result and error types of the two reconcilers

use crate::domain::agent::AgentIdError;
use crate::domain::cloud::CloudError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub service_url: String,
    /// Same value as `service_url`; the dashboard registers it with the
    /// telephony provider.
    pub webhook_url: String,
    pub agent_url: String,
    pub agent_rule_arn: String,
    pub incoming_call_rule_arn: String,
    pub target_group_arn: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStep {
    RegisterDefinition,
    EnsureTarget,
    EnsureRules,
    ReconcileService,
    RemoveRule,
}

impl fmt::Display for DeploymentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeploymentStep::RegisterDefinition => "register task definition",
            DeploymentStep::EnsureTarget => "ensure target group",
            DeploymentStep::EnsureRules => "ensure listener rules",
            DeploymentStep::ReconcileService => "reconcile service",
            DeploymentStep::RemoveRule => "remove listener rule",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to {step}: {source}")]
    Step {
        step: DeploymentStep,
        #[source]
        source: CloudError,
    },

    #[error("No free listener rule priority left on the shared listener")]
    PriorityExhausted,
}

impl DeploymentError {
    pub fn step(step: DeploymentStep, source: CloudError) -> Self {
        Self::Step { step, source }
    }

    /// Conflicts come from concurrent invocations racing on shared listener
    /// state; re-running the deploy re-scans and picks a fresh slot.
    pub fn is_retriable(&self) -> bool {
        matches!(self, DeploymentError::Step { source, .. } if source.is_conflict())
    }

    pub fn failed_step(&self) -> Option<DeploymentStep> {
        match self {
            DeploymentError::Step { step, .. } => Some(*step),
            DeploymentError::PriorityExhausted => Some(DeploymentStep::EnsureRules),
            DeploymentError::InvalidRequest(_) => None,
        }
    }
}

impl From<AgentIdError> for DeploymentError {
    fn from(err: AgentIdError) -> Self {
        DeploymentError::InvalidRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflicts_are_retriable() {
        let conflict = DeploymentError::step(
            DeploymentStep::EnsureRules,
            CloudError::Conflict("PriorityInUse".to_string()),
        );
        assert!(conflict.is_retriable());

        let denied = DeploymentError::step(
            DeploymentStep::RegisterDefinition,
            CloudError::provider("RegisterTaskDefinition", "AccessDenied"),
        );
        assert!(!denied.is_retriable());
        assert!(!DeploymentError::PriorityExhausted.is_retriable());
    }

    #[test]
    fn test_error_message_names_step() {
        let err = DeploymentError::step(
            DeploymentStep::EnsureTarget,
            CloudError::provider("CreateTargetGroup", "quota exceeded"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to ensure target group: CreateTargetGroup failed: quota exceeded"
        );
        assert_eq!(err.failed_step(), Some(DeploymentStep::EnsureTarget));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = DeploymentResult {
            service_url: "https://x/incoming-call".to_string(),
            webhook_url: "https://x/incoming-call".to_string(),
            agent_url: "https://x/agents/a".to_string(),
            agent_rule_arn: "r1".to_string(),
            incoming_call_rule_arn: "r2".to_string(),
            target_group_arn: "tg".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["webhookUrl"], "https://x/incoming-call");
        assert_eq!(json["incomingCallRuleArn"], "r2");
        assert_eq!(json["targetGroupArn"], "tg");
    }
}
