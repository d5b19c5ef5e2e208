// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Routing Rule Manager
//!
//! Maintains the two listener rules each deploy needs on the shared
//! listener:
//!
//! - the agent-scoped rule forwarding `/agents/{id}/*` to the agent's target
//! - the singleton `/incoming-call` rule, re-pointed at whichever agent was
//!   deployed last
//!
//! Priorities come from a namespace shared by every agent on the listener.
//! Allocation scans the live rule set once and probes downward from a
//! per-agent seed; no lock is taken. Two concurrent deploys can still pick
//! the same slot, in which case the provider rejects the second create and
//! the caller retries.
//!
//! The incoming-call rule follows "last deploy wins": deploying agent B
//! silently redirects calls that were reaching agent A. Callers relying on
//! single-tenant-at-a-time routing depend on this, so it is kept as is.

use crate::domain::agent::AgentId;
use crate::domain::cloud::LoadBalancer;
use crate::domain::deployment::{DeploymentError, DeploymentStep};
use crate::domain::naming::{self, INCOMING_CALL_PATH};
use crate::domain::routing::{allocate_priority, used_priorities, ListenerRule, RuleArn, TargetGroupArn};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBindings {
    pub agent_rule_arn: RuleArn,
    pub agent_priority: Option<u32>,
    pub incoming_call_rule_arn: RuleArn,
}

pub struct RoutingRuleManager {
    load_balancer: Arc<dyn LoadBalancer>,
    listener_arn: String,
}

impl RoutingRuleManager {
    pub fn new(load_balancer: Arc<dyn LoadBalancer>, listener_arn: impl Into<String>) -> Self {
        Self {
            load_balancer,
            listener_arn: listener_arn.into(),
        }
    }

    pub async fn ensure_rules(
        &self,
        agent_id: &AgentId,
        target: &TargetGroupArn,
    ) -> Result<RuleBindings, DeploymentError> {
        let fail = |e| DeploymentError::step(DeploymentStep::EnsureRules, e);
        let rules = self.load_balancer.list_rules(&self.listener_arn).await.map_err(fail)?;
        let mut used = used_priorities(&rules);
        let agent_path = naming::agent_path(agent_id);

        let (agent_rule_arn, agent_priority) =
            match rules.iter().find(|r| r.matches_path(&agent_path)) {
                Some(existing) => {
                    self.retarget(existing, target).await?;
                    (existing.arn.clone(), existing.priority.number())
                }
                None => {
                    let seed = naming::seed_priority(agent_id);
                    let priority =
                        allocate_priority(seed, &used).ok_or(DeploymentError::PriorityExhausted)?;
                    if priority != seed {
                        metrics::counter!("tempo_rule_priority_probes_total").increment(1);
                        debug!(agent_id = %agent_id, seed, priority, "Seed priority taken, probed to free slot");
                    }
                    let rule = self
                        .load_balancer
                        .create_rule(&self.listener_arn, priority, &agent_path, target)
                        .await
                        .map_err(fail)?;
                    used.insert(priority);
                    info!(agent_id = %agent_id, priority, arn = %rule.arn.as_str(), "Created agent listener rule");
                    (rule.arn, Some(priority))
                }
            };

        let incoming_call_rule_arn =
            match rules.iter().find(|r| r.is_incoming_call()) {
                Some(existing) => {
                    self.retarget(existing, target).await?;
                    info!(
                        agent_id = %agent_id,
                        arn = %existing.arn.as_str(),
                        "Incoming-call rule now forwards to this agent"
                    );
                    existing.arn.clone()
                }
                None => {
                    let preferred = agent_priority.map_or(1, |p| p.saturating_sub(1).max(1));
                    let priority =
                        allocate_priority(preferred, &used).ok_or(DeploymentError::PriorityExhausted)?;
                    let rule = self
                        .load_balancer
                        .create_rule(&self.listener_arn, priority, INCOMING_CALL_PATH, target)
                        .await
                        .map_err(fail)?;
                    info!(agent_id = %agent_id, priority, arn = %rule.arn.as_str(), "Created incoming-call listener rule");
                    rule.arn
                }
            };

        Ok(RuleBindings {
            agent_rule_arn,
            agent_priority,
            incoming_call_rule_arn,
        })
    }

    /// Delete the agent-scoped rule. A rule that is already gone counts as
    /// removed; the shared incoming-call rule is left alone.
    pub async fn remove_agent_rule(&self, agent_id: &AgentId) -> Result<usize, DeploymentError> {
        let fail = |e| DeploymentError::step(DeploymentStep::RemoveRule, e);
        let agent_path = naming::agent_path(agent_id);
        let rules = self.load_balancer.list_rules(&self.listener_arn).await.map_err(fail)?;

        let mut removed = 0;
        for rule in rules.iter().filter(|r| r.matches_path(&agent_path)) {
            match self.load_balancer.delete_rule(&rule.arn).await {
                Ok(()) => {
                    removed += 1;
                    info!(agent_id = %agent_id, arn = %rule.arn.as_str(), "Deleted agent listener rule");
                }
                Err(e) if e.is_not_found() => {
                    debug!(agent_id = %agent_id, arn = %rule.arn.as_str(), "Listener rule already deleted");
                }
                Err(e) => return Err(fail(e)),
            }
        }

        if removed == 0 {
            debug!(agent_id = %agent_id, "No agent listener rule to delete");
        }
        Ok(removed)
    }

    async fn retarget(&self, rule: &ListenerRule, target: &TargetGroupArn) -> Result<(), DeploymentError> {
        if rule.forwards_to(target) {
            return Ok(());
        }
        if let Some(previous) = rule.target_arns.first() {
            if previous != target {
                warn!(
                    arn = %rule.arn.as_str(),
                    from = %previous.as_str(),
                    to = %target.as_str(),
                    "Re-pointing listener rule"
                );
            }
        }
        self.load_balancer
            .set_rule_target(&rule.arn, target)
            .await
            .map_err(|e| DeploymentError::step(DeploymentStep::EnsureRules, e))
    }
}
