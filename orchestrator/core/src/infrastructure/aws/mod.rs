// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! AWS Adapters
//!
//! `ContainerCluster` over ECS (Fargate) and `LoadBalancer` over ELBv2.
//! Each call is issued exactly once; the SDK's own retry policy is the only
//! retry layer.

pub mod ecs;
pub mod elbv2;

pub use ecs::EcsCluster;
pub use elbv2::ElbLoadBalancer;

use crate::domain::cloud::CloudError;
use aws_sdk_ecs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

/// Error codes meaning the addressed resource is absent.
const NOT_FOUND_CODES: &[&str] = &[
    "ServiceNotFoundException",
    "ServiceNotActiveException",
    "TargetGroupNotFound",
    "RuleNotFound",
];

/// Error codes meaning the write collided with existing state.
const CONFLICT_CODES: &[&str] = &["PriorityInUse", "DuplicateTargetGroupName"];

/// Shared SDK configuration for both clients.
pub async fn load_sdk_config(region: Option<String>) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region));
    }
    loader.load().await
}

pub(crate) fn map_sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> CloudError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().unwrap_or_default().to_string();
    let message = DisplayErrorContext(&err).to_string();
    classify(operation, &code, &message)
}

fn classify(operation: &str, code: &str, message: &str) -> CloudError {
    if NOT_FOUND_CODES.contains(&code) {
        return CloudError::NotFound(format!("{operation}: {message}"));
    }
    // ECS reports a name clash on CreateService, or a create against a
    // service that is still draining after a stop, as a parameter error.
    let lowered = message.to_ascii_lowercase();
    if CONFLICT_CODES.contains(&code)
        || lowered.contains("not idempotent")
        || lowered.contains("still draining")
    {
        return CloudError::Conflict(format!("{operation}: {message}"));
    }
    CloudError::provider(operation, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deployment::{DeploymentError, DeploymentStep};

    #[test]
    fn test_classify_error_codes() {
        assert!(classify("DeleteRule", "RuleNotFound", "gone").is_not_found());
        assert!(classify("UpdateService", "ServiceNotActiveException", "draining").is_not_found());
        assert!(classify("CreateRule", "PriorityInUse", "taken").is_conflict());
        assert!(classify(
            "CreateService",
            "InvalidParameterException",
            "Creation of service was not idempotent."
        )
        .is_conflict());
        assert_eq!(
            classify("RegisterTaskDefinition", "AccessDeniedException", "denied"),
            CloudError::provider("RegisterTaskDefinition", "denied")
        );
    }

    #[test]
    fn test_create_on_draining_service_is_retriable_conflict() {
        let err = classify(
            "CreateService",
            "InvalidParameterException",
            "Unable to Start a service that is still Draining.",
        );
        assert!(err.is_conflict());
        assert!(DeploymentError::step(DeploymentStep::ReconcileService, err).is_retriable());
    }
}
