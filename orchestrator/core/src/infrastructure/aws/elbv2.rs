// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use super::map_sdk_error;
use crate::domain::cloud::{CloudError, LoadBalancer};
use crate::domain::routing::{
    ListenerRule, RoutingTarget, RuleArn, RulePriority, TargetGroupArn, TargetGroupSpec,
};
use async_trait::async_trait;
use aws_sdk_elasticloadbalancingv2::types::{
    Action, ActionTypeEnum, PathPatternConditionConfig, ProtocolEnum, Rule, RuleCondition,
    TargetGroup, TargetTypeEnum,
};
use aws_sdk_elasticloadbalancingv2::Client;

const PATH_PATTERN_FIELD: &str = "path-pattern";
/// Maximum page size accepted by DescribeRules.
const RULES_PAGE_SIZE: i32 = 400;

pub struct ElbLoadBalancer {
    client: Client,
}

impl ElbLoadBalancer {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn forward_action(target: &TargetGroupArn) -> Action {
    Action::builder()
        .r#type(ActionTypeEnum::Forward)
        .target_group_arn(target.as_str())
        .build()
}

fn routing_target(group: &TargetGroup) -> RoutingTarget {
    RoutingTarget {
        arn: TargetGroupArn::new(group.target_group_arn().unwrap_or_default()),
        name: group.target_group_name().unwrap_or_default().to_string(),
        protocol: group.protocol().map(|p| p.as_str().to_string()).unwrap_or_default(),
        port: group.port().and_then(|p| u16::try_from(p).ok()).unwrap_or_default(),
        health_check_path: group.health_check_path().unwrap_or_default().to_string(),
    }
}

fn listener_rule(rule: &Rule) -> ListenerRule {
    let priority = if rule.is_default().unwrap_or(false) {
        RulePriority::Default
    } else {
        rule.priority()
            .and_then(|p| p.parse::<u32>().ok())
            .map(RulePriority::Numbered)
            .unwrap_or(RulePriority::Default)
    };

    // Path patterns show up either in the legacy `values` list or in
    // `path_pattern_config`, depending on how the rule was created.
    let mut path_patterns: Vec<String> = rule
        .conditions()
        .iter()
        .filter(|c| c.field() == Some(PATH_PATTERN_FIELD))
        .flat_map(|c| {
            let mut values: Vec<String> = c.values().to_vec();
            if let Some(config) = c.path_pattern_config() {
                values.extend(config.values().iter().cloned());
            }
            values
        })
        .collect();
    path_patterns.sort_unstable();
    path_patterns.dedup();

    let target_arns = rule
        .actions()
        .iter()
        .flat_map(|action| {
            let mut arns: Vec<TargetGroupArn> = action
                .target_group_arn()
                .map(TargetGroupArn::new)
                .into_iter()
                .collect();
            if arns.is_empty() {
                if let Some(forward) = action.forward_config() {
                    arns.extend(
                        forward
                            .target_groups()
                            .iter()
                            .filter_map(|t| t.target_group_arn())
                            .map(TargetGroupArn::new),
                    );
                }
            }
            arns
        })
        .collect();

    ListenerRule {
        arn: RuleArn::new(rule.rule_arn().unwrap_or_default()),
        priority,
        path_patterns,
        target_arns,
    }
}

#[async_trait]
impl LoadBalancer for ElbLoadBalancer {
    async fn find_target_group(&self, name: &str) -> Result<Option<RoutingTarget>, CloudError> {
        match self.client.describe_target_groups().names(name).send().await {
            Ok(output) => Ok(output.target_groups().first().map(routing_target)),
            Err(e) => match map_sdk_error("DescribeTargetGroups", e) {
                CloudError::NotFound(_) => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn create_target_group(&self, spec: &TargetGroupSpec) -> Result<RoutingTarget, CloudError> {
        let output = self
            .client
            .create_target_group()
            .name(&spec.name)
            .protocol(ProtocolEnum::Http)
            .port(i32::from(spec.port))
            .vpc_id(&spec.vpc_id)
            .target_type(TargetTypeEnum::Ip)
            .health_check_protocol(ProtocolEnum::Http)
            .health_check_path(&spec.health_check_path)
            .send()
            .await
            .map_err(|e| map_sdk_error("CreateTargetGroup", e))?;

        output
            .target_groups()
            .first()
            .map(routing_target)
            .ok_or_else(|| CloudError::provider("CreateTargetGroup", "response carried no target group"))
    }

    async fn list_rules(&self, listener_arn: &str) -> Result<Vec<ListenerRule>, CloudError> {
        let mut rules = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let output = self
                .client
                .describe_rules()
                .listener_arn(listener_arn)
                .page_size(RULES_PAGE_SIZE)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| map_sdk_error("DescribeRules", e))?;

            rules.extend(output.rules().iter().map(listener_rule));
            match output.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }
        Ok(rules)
    }

    async fn create_rule(
        &self,
        listener_arn: &str,
        priority: u32,
        path_pattern: &str,
        target: &TargetGroupArn,
    ) -> Result<ListenerRule, CloudError> {
        let condition = RuleCondition::builder()
            .field(PATH_PATTERN_FIELD)
            .path_pattern_config(PathPatternConditionConfig::builder().values(path_pattern).build())
            .build();

        let output = self
            .client
            .create_rule()
            .listener_arn(listener_arn)
            .priority(priority as i32)
            .conditions(condition)
            .actions(forward_action(target))
            .send()
            .await
            .map_err(|e| map_sdk_error("CreateRule", e))?;

        output
            .rules()
            .first()
            .map(listener_rule)
            .ok_or_else(|| CloudError::provider("CreateRule", "response carried no rule"))
    }

    async fn set_rule_target(&self, rule: &RuleArn, target: &TargetGroupArn) -> Result<(), CloudError> {
        self.client
            .modify_rule()
            .rule_arn(rule.as_str())
            .actions(forward_action(target))
            .send()
            .await
            .map_err(|e| map_sdk_error("ModifyRule", e))?;
        Ok(())
    }

    async fn delete_rule(&self, rule: &RuleArn) -> Result<(), CloudError> {
        self.client
            .delete_rule()
            .rule_arn(rule.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error("DeleteRule", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_action_targets_group() {
        let action = forward_action(&TargetGroupArn::new("arn:tg/agent"));
        assert_eq!(action.r#type(), Some(&ActionTypeEnum::Forward));
        assert_eq!(action.target_group_arn(), Some("arn:tg/agent"));
    }

    #[test]
    fn test_listener_rule_merges_path_pattern_sources() {
        let condition = RuleCondition::builder()
            .field(PATH_PATTERN_FIELD)
            .values("/agents/a1/*")
            .path_pattern_config(PathPatternConditionConfig::builder().values("/agents/a1/*").build())
            .build();
        let rule = Rule::builder()
            .rule_arn("arn:rule/1")
            .priority("12")
            .is_default(false)
            .conditions(condition)
            .actions(forward_action(&TargetGroupArn::new("arn:tg/a1")))
            .build();

        let converted = listener_rule(&rule);
        assert_eq!(converted.priority, RulePriority::Numbered(12));
        assert_eq!(converted.path_patterns, vec!["/agents/a1/*".to_string()]);
        assert!(converted.forwards_to(&TargetGroupArn::new("arn:tg/a1")));
    }
}
