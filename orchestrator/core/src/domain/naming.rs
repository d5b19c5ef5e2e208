// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Resource Naming
//!
//! Deterministic mapping from an agent identifier to every cloud resource
//! name the orchestrator touches. Repeated deploys find their earlier
//! resources purely by recomputing these names, so every function here must
//! stay pure and stable across releases.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Name derivation and seed routing priority

use crate::domain::agent::AgentId;

pub const FAMILY_PREFIX: &str = "tempo-agent-";
pub const TARGET_GROUP_PREFIX: &str = "tg-";
pub const SERVICE_PREFIX: &str = "svc-";

/// ELBv2 target group and ECS service names share this ceiling.
pub const MAX_SHORT_NAME_LEN: usize = 32;

/// ECS task definition families allow up to 255 characters.
pub const MAX_FAMILY_LEN: usize = 255;

/// Shared path routed to the most recently deployed agent.
pub const INCOMING_CALL_PATH: &str = "/incoming-call";

/// Root under which every agent-scoped path is mounted.
pub const AGENT_PATH_ROOT: &str = "/agents/";

/// Upper bound of the listener priority range this orchestrator allocates from.
pub const MAX_RULE_PRIORITY: u32 = 40_000;

pub fn family(agent_id: &AgentId) -> String {
    truncate(&format!("{FAMILY_PREFIX}{agent_id}"), MAX_FAMILY_LEN)
}

/// Target group names may not end in a hyphen, so one left dangling by
/// truncation is dropped.
pub fn target_group_name(agent_id: &AgentId) -> String {
    let name = truncate(&format!("{TARGET_GROUP_PREFIX}{agent_id}"), MAX_SHORT_NAME_LEN);
    name.trim_end_matches('-').to_string()
}

pub fn service_name(agent_id: &AgentId) -> String {
    truncate(&format!("{SERVICE_PREFIX}{agent_id}"), MAX_SHORT_NAME_LEN)
}

pub fn agent_path_prefix(agent_id: &AgentId) -> String {
    format!("{AGENT_PATH_ROOT}{agent_id}")
}

pub fn agent_path(agent_id: &AgentId) -> String {
    format!("{}/*", agent_path_prefix(agent_id))
}

/// Stable starting slot for the agent's listener rule.
///
/// 32-bit wrapping `h = h * 31 + c` over UTF-16 code units, so the same id
/// lands on the same slot regardless of platform or process.
pub fn seed_priority(agent_id: &AgentId) -> u32 {
    let hash = agent_id
        .as_str()
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    hash.unsigned_abs() % MAX_RULE_PRIORITY + 1
}

fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> AgentId {
        AgentId::parse(raw).unwrap()
    }

    #[test]
    fn test_names_are_deterministic() {
        let agent = id("550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(family(&agent), family(&agent.clone()));
        assert_eq!(target_group_name(&agent), target_group_name(&agent));
        assert_eq!(service_name(&agent), service_name(&agent));
        assert_eq!(seed_priority(&agent), seed_priority(&id("550e8400-e29b-41d4-a716-446655440000")));
    }

    #[test]
    fn test_short_names_are_truncated() {
        let agent = id("550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(family(&agent), "tempo-agent-550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(service_name(&agent), "svc-550e8400-e29b-41d4-a716-4466");
        assert_eq!(service_name(&agent).len(), MAX_SHORT_NAME_LEN);
        assert_eq!(target_group_name(&agent), "tg-550e8400-e29b-41d4-a716-44665");
    }

    #[test]
    fn test_target_group_name_never_ends_with_hyphen() {
        // "tg-" + 28 chars + "-" lands the hyphen on position 32.
        let agent = id("abcdefghijklmnopqrstuvwxyz01-tail");
        let name = target_group_name(&agent);
        assert!(!name.ends_with('-'));
        assert_eq!(name, "tg-abcdefghijklmnopqrstuvwxyz01");
    }

    #[test]
    fn test_paths() {
        let agent = id("a1");
        assert_eq!(agent_path(&agent), "/agents/a1/*");
        assert_eq!(agent_path_prefix(&agent), "/agents/a1");
        assert_eq!(INCOMING_CALL_PATH, "/incoming-call");
    }

    #[test]
    fn test_seed_priority_matches_reference_hash() {
        // "abc" -> 96354 under h*31+c.
        assert_eq!(seed_priority(&id("abc")), 96354 % MAX_RULE_PRIORITY + 1);
        // Single ASCII character hashes to its code point.
        assert_eq!(seed_priority(&id("a")), 98);
    }

    #[test]
    fn test_seed_priority_stays_in_range() {
        for raw in ["x", "agent-0", "ffffffffffffffffffffffffffffffffffffffff", "Z-9"] {
            let p = seed_priority(&id(raw));
            assert!((1..=MAX_RULE_PRIORITY).contains(&p), "{raw} -> {p}");
        }
    }

    #[test]
    fn test_short_names_use_only_target_group_charset() {
        for raw in ["agent-1", "550e8400-e29b-41d4-a716-446655440000", "ABC-def-09"] {
            for name in [target_group_name(&id(raw)), service_name(&id(raw))] {
                assert!(
                    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'),
                    "{raw} -> {name}"
                );
            }
        }
        assert!(AgentId::parse("agent_1").is_err());
    }
}
