// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Load Balancer Routing
//!
//! Target groups and listener rules on the shared listener, plus the
//! priority probe used to place new rules. The listener's priority space is
//! shared by every agent and is owned by the provider, so allocation is a
//! scan of the current rule set followed by a linear probe.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Routing entities and collision-free priority allocation

use crate::domain::naming::{AGENT_PATH_ROOT, INCOMING_CALL_PATH, MAX_RULE_PRIORITY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetGroupArn(pub String);

impl TargetGroupArn {
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleArn(pub String);

impl RuleArn {
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Shape of a target group to create. Fixed per agent once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroupSpec {
    pub name: String,
    pub port: u16,
    pub vpc_id: String,
    pub health_check_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTarget {
    pub arn: TargetGroupArn,
    pub name: String,
    pub protocol: String,
    pub port: u16,
    pub health_check_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RulePriority {
    /// The listener's implicit catch-all rule.
    Default,
    Numbered(u32),
}

impl RulePriority {
    pub fn number(&self) -> Option<u32> {
        match self {
            RulePriority::Default => None,
            RulePriority::Numbered(p) => Some(*p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerRule {
    pub arn: RuleArn,
    pub priority: RulePriority,
    pub path_patterns: Vec<String>,
    pub target_arns: Vec<TargetGroupArn>,
}

impl ListenerRule {
    pub fn matches_path(&self, pattern: &str) -> bool {
        self.path_patterns.iter().any(|p| p == pattern)
    }

    pub fn path_contains(&self, fragment: &str) -> bool {
        self.path_patterns.iter().any(|p| p.contains(fragment))
    }

    /// Whether the rule holds the shared incoming-call path. Agent-scoped
    /// rules never qualify, even when the agent id itself spells the path.
    pub fn is_incoming_call(&self) -> bool {
        self.path_contains(INCOMING_CALL_PATH)
            && !self.path_patterns.iter().any(|p| p.starts_with(AGENT_PATH_ROOT))
    }

    pub fn forwards_to(&self, target: &TargetGroupArn) -> bool {
        self.target_arns.len() == 1 && &self.target_arns[0] == target
    }
}

/// Priorities currently held on the listener, default rule excluded.
pub fn used_priorities(rules: &[ListenerRule]) -> BTreeSet<u32> {
    rules.iter().filter_map(|r| r.priority.number()).collect()
}

/// Find a free priority starting from `seed`.
///
/// Probes downward one slot at a time, stopping at 1. If every slot from
/// the seed down to 1 is taken, continues upward from `seed + 1`. Returns
/// `None` only when the whole range is occupied.
pub fn allocate_priority(seed: u32, used: &BTreeSet<u32>) -> Option<u32> {
    let seed = seed.clamp(1, MAX_RULE_PRIORITY);

    let mut candidate = seed;
    while used.contains(&candidate) && candidate > 1 {
        candidate -= 1;
    }
    if !used.contains(&candidate) {
        return Some(candidate);
    }

    (seed + 1..=MAX_RULE_PRIORITY).find(|p| !used.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn used(values: &[u32]) -> BTreeSet<u32> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_free_seed_is_kept() {
        assert_eq!(allocate_priority(500, &used(&[1, 2, 499])), Some(500));
    }

    #[test]
    fn test_occupied_run_probes_below() {
        let p = 1200;
        assert_eq!(allocate_priority(p, &used(&[p, p - 1, p - 2])), Some(p - 3));
    }

    #[test]
    fn test_probe_floors_at_one_then_climbs() {
        assert_eq!(allocate_priority(3, &used(&[1, 2, 3, 4])), Some(5));
        assert_eq!(allocate_priority(1, &used(&[])), Some(1));
    }

    #[test]
    fn test_out_of_range_seed_is_clamped() {
        assert_eq!(allocate_priority(0, &used(&[])), Some(1));
        assert_eq!(allocate_priority(90_000, &used(&[])), Some(MAX_RULE_PRIORITY));
    }

    #[test]
    fn test_exhausted_range() {
        let all: BTreeSet<u32> = (1..=MAX_RULE_PRIORITY).collect();
        assert_eq!(allocate_priority(17, &all), None);
    }

    #[test]
    fn test_used_priorities_skip_default_rule() {
        let rules = vec![
            ListenerRule {
                arn: RuleArn::new("default"),
                priority: RulePriority::Default,
                path_patterns: vec![],
                target_arns: vec![],
            },
            ListenerRule {
                arn: RuleArn::new("r1"),
                priority: RulePriority::Numbered(7),
                path_patterns: vec!["/agents/a/*".to_string()],
                target_arns: vec![TargetGroupArn::new("tg")],
            },
        ];
        assert_eq!(used_priorities(&rules), used(&[7]));
        assert!(rules[1].matches_path("/agents/a/*"));
        assert!(rules[1].forwards_to(&TargetGroupArn::new("tg")));
        assert!(!rules[1].path_contains("/incoming-call"));
    }

    #[test]
    fn test_incoming_call_rule_excludes_agent_scoped_paths() {
        let rule = |path: &str| ListenerRule {
            arn: RuleArn::new("r"),
            priority: RulePriority::Numbered(3),
            path_patterns: vec![path.to_string()],
            target_arns: vec![],
        };
        assert!(rule("/incoming-call").is_incoming_call());
        assert!(!rule("/agents/incoming-call/*").is_incoming_call());
        assert!(!rule("/agents/a/*").is_incoming_call());
    }
}
