// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! System Prompt Sanitizer
//!
//! Folds an agent's prompt, knowledge base and guardrails into the single
//! `SYSTEM_PROMPT` value injected into the agent container. The result is
//! passed through task-definition environment variables and ends up in shell
//! entrypoints, so quoting and expansion characters are stripped outright.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Total, side-effect free prompt normalization

use crate::domain::agent::AgentConfig;

pub const FALLBACK_PROMPT: &str = "You are a helpful AI assistant.";

const KNOWLEDGE_BASE_HEADER: &str = "KNOWLEDGE BASE:\n";
const GUARDRAILS_HEADER: &str = "GUARDRAILS:\n";
const STRIPPED: [char; 5] = ['"', '\'', '`', '$', '\\'];

/// Build the container-safe system prompt. Never returns an empty string.
pub fn build_system_prompt(config: &AgentConfig) -> String {
    let guardrails = config
        .guardrails
        .as_ref()
        .map(|g| g.to_text())
        .unwrap_or_default();

    let mut sections = Vec::with_capacity(3);
    if !config.prompt.trim().is_empty() {
        sections.push(config.prompt.clone());
    }
    if !config.knowledge_base.trim().is_empty() {
        sections.push(format!("{KNOWLEDGE_BASE_HEADER}{}", config.knowledge_base));
    }
    if !guardrails.trim().is_empty() {
        sections.push(format!("{GUARDRAILS_HEADER}{guardrails}"));
    }

    let cleaned = sanitize(&sections.join("\n\n"));
    if cleaned.is_empty() {
        FALLBACK_PROMPT.to_string()
    } else {
        cleaned
    }
}

/// Remove env-hostile characters and collapse runs of blank lines.
pub fn sanitize(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !STRIPPED.contains(c)).collect();

    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;
    for line in stripped.lines() {
        let line = line.trim_end();
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(if blank { "" } else { line });
        previous_blank = blank;
    }

    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::Guardrails;

    #[test]
    fn test_empty_config_falls_back() {
        assert_eq!(build_system_prompt(&AgentConfig::default()), FALLBACK_PROMPT);
    }

    #[test]
    fn test_whitespace_and_empty_guardrails_fall_back() {
        let config = AgentConfig {
            prompt: "   \n\n ".to_string(),
            knowledge_base: String::new(),
            guardrails: Some(Guardrails::List(vec![])),
            ..Default::default()
        };
        assert_eq!(build_system_prompt(&config), FALLBACK_PROMPT);
    }

    #[test]
    fn test_only_stripped_characters_falls_back() {
        let config = AgentConfig {
            prompt: "\"'`$\\".to_string(),
            ..Default::default()
        };
        assert_eq!(build_system_prompt(&config), FALLBACK_PROMPT);
    }

    #[test]
    fn test_sections_are_labelled_in_order() {
        let config = AgentConfig {
            prompt: "You book dental appointments.".to_string(),
            knowledge_base: "Open Monday to Friday.".to_string(),
            guardrails: Some(Guardrails::Text("Never quote prices.".to_string())),
            ..Default::default()
        };
        assert_eq!(
            build_system_prompt(&config),
            "You book dental appointments.\n\nKNOWLEDGE BASE:\nOpen Monday to Friday.\n\nGUARDRAILS:\nNever quote prices."
        );
    }

    #[test]
    fn test_dangerous_characters_are_removed() {
        let config = AgentConfig {
            prompt: "Say \"hi\" to `$USER`, it's C:\\temp".to_string(),
            guardrails: Some(Guardrails::Structured(serde_json::json!({"rules": ["don't"]}))),
            ..Default::default()
        };
        let prompt = build_system_prompt(&config);
        for c in STRIPPED {
            assert!(!prompt.contains(c), "found {c:?} in {prompt}");
        }
        assert!(prompt.starts_with("Say hi to USER, its C:temp"));
        assert!(prompt.contains("GUARDRAILS:\n{"));
    }

    #[test]
    fn test_blank_lines_collapse() {
        assert_eq!(sanitize("one\n\n\n  \n\ntwo\n\n"), "one\n\ntwo");
        assert_eq!(sanitize("  padded  "), "padded");
    }
}
