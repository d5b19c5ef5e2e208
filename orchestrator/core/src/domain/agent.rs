// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Deployment Request
//!
//! The per-invocation input handed to the orchestrator by the dashboard:
//! which agent to deploy and the configuration it should boot with. Nothing
//! here is persisted; a request lives for exactly one `deploy` call.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Agent identity, configuration and the polymorphic guardrails field

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgentIdError {
    #[error("Agent ID cannot be empty")]
    Empty,
    #[error("Agent ID '{0}' contains characters outside [A-Za-z0-9-]")]
    InvalidCharacters(String),
}

/// Dashboard-assigned agent identifier.
///
/// Embedded verbatim in resource names and listener path patterns. ELBv2
/// target group names are the strictest of those (alphanumerics and `-`),
/// so that is the accepted set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentId(String);

impl AgentId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, AgentIdError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AgentIdError::Empty);
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(AgentIdError::InvalidCharacters(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AgentId {
    type Error = AgentIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AgentId> for String {
    fn from(id: AgentId) -> Self {
        id.0
    }
}

/// Guardrails arrive in whichever shape the dashboard editor produced.
///
/// Variant order matters for untagged deserialization: a JSON array of
/// strings becomes `List`, any other non-string value lands in `Structured`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Guardrails {
    Text(String),
    List(Vec<String>),
    Structured(serde_json::Value),
}

impl Guardrails {
    /// Normalize to plain text. Empty collections yield an empty string.
    pub fn to_text(&self) -> String {
        match self {
            Guardrails::Text(text) => text.clone(),
            Guardrails::List(items) => items.join("\n"),
            Guardrails::Structured(serde_json::Value::Null) => String::new(),
            Guardrails::Structured(serde_json::Value::Object(map)) if map.is_empty() => String::new(),
            Guardrails::Structured(serde_json::Value::Array(items)) if items.is_empty() => String::new(),
            Guardrails::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

/// Agent configuration as edited in the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    pub name: String,
    pub prompt: String,
    pub knowledge_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardrails: Option<Guardrails>,

    // Telephony
    pub call_phone_number: String,
    pub transfer_phone_number: String,
    pub summary_phone_number: String,
    pub twilio_account_sid: String,
    pub twilio_api_sid: String,
    pub twilio_api_secret: String,
    pub voice_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentDeploymentRequest {
    pub agent_id: AgentId,
    pub tenant_id: Option<String>,
    pub config: AgentConfig,
}

impl AgentDeploymentRequest {
    pub fn new(agent_id: AgentId, config: AgentConfig) -> Self {
        Self {
            agent_id,
            tenant_id: None,
            config,
        }
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_trims_and_accepts_uuid() {
        let id = AgentId::parse("  550e8400-e29b-41d4-a716-446655440000 ").unwrap();
        assert_eq!(id.as_str(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn test_agent_id_rejects_empty_and_path_characters() {
        assert_eq!(AgentId::parse("   "), Err(AgentIdError::Empty));
        assert!(matches!(
            AgentId::parse("../etc"),
            Err(AgentIdError::InvalidCharacters(_))
        ));
        assert!(AgentId::parse("agent/1").is_err());
    }

    #[test]
    fn test_agent_id_rejects_underscore() {
        assert_eq!(
            AgentId::parse("agent_1"),
            Err(AgentIdError::InvalidCharacters("agent_1".to_string()))
        );
    }

    #[test]
    fn test_guardrails_shapes_deserialize() {
        let text: Guardrails = serde_json::from_str(r#""be polite""#).unwrap();
        assert_eq!(text, Guardrails::Text("be polite".to_string()));

        let list: Guardrails = serde_json::from_str(r#"["no pricing", "no legal advice"]"#).unwrap();
        assert_eq!(list.to_text(), "no pricing\nno legal advice");

        let structured: Guardrails = serde_json::from_str(r#"{"tone": "calm"}"#).unwrap();
        assert!(matches!(structured, Guardrails::Structured(_)));
        assert!(structured.to_text().contains("\"tone\": \"calm\""));
    }

    #[test]
    fn test_empty_guardrails_render_empty() {
        assert_eq!(Guardrails::List(vec![]).to_text(), "");
        assert_eq!(Guardrails::Structured(serde_json::json!({})).to_text(), "");
    }

    #[test]
    fn test_config_accepts_partial_camel_case_payload() {
        let config: AgentConfig = serde_json::from_str(
            r#"{"name": "Front desk", "knowledgeBase": "Open 9-5", "guardrails": null, "voiceId": "v1"}"#,
        )
        .unwrap();
        assert_eq!(config.name, "Front desk");
        assert_eq!(config.knowledge_base, "Open 9-5");
        assert_eq!(config.voice_id, "v1");
        assert!(config.guardrails.is_none());
        assert!(config.prompt.is_empty());
    }
}
