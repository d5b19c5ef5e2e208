// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! One-shot deploy and stop
//!
//! Runs the same reconcilers the invocation server exposes, without the
//! HTTP hop. Handy for operators repairing a single agent.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use tempo_orchestrator_core::application::deployment::AgentDeploymentService;
use tempo_orchestrator_core::domain::agent::{AgentConfig, AgentDeploymentRequest, AgentId};

pub async fn deploy(
    service: Arc<dyn AgentDeploymentService>,
    agent_id: String,
    tenant_id: Option<String>,
    config_path: &Path,
) -> Result<()> {
    let agent_id = AgentId::parse(agent_id).context("Invalid agent id")?;
    let config = read_agent_config(config_path)?;

    let mut request = AgentDeploymentRequest::new(agent_id.clone(), config);
    if let Some(tenant_id) = tenant_id {
        request = request.with_tenant(tenant_id);
    }

    let result = service
        .deploy(request)
        .await
        .with_context(|| format!("Failed to deploy agent {}", agent_id))?;

    println!("{}", format!("✓ Agent {} deployed", agent_id).green());
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub async fn stop(service: Arc<dyn AgentDeploymentService>, agent_id: String) -> Result<()> {
    let agent_id = AgentId::parse(agent_id).context("Invalid agent id")?;

    service
        .stop(&agent_id)
        .await
        .with_context(|| format!("Failed to stop agent {}", agent_id))?;

    println!("{}", format!("✓ Agent {} stopped", agent_id).green());
    Ok(())
}

/// Parse an agent configuration document. `.json` files are read as JSON,
/// anything else as YAML.
pub fn read_agent_config(path: &Path) -> Result<AgentConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read agent config {:?}", path))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
    } else {
        serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML in {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_read_json_agent_config() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"name": "Desk", "prompt": "Hi", "voiceId": "v1"}}"#).unwrap();

        let config = read_agent_config(file.path()).unwrap();
        assert_eq!(config.name, "Desk");
        assert_eq!(config.voice_id, "v1");
    }

    #[test]
    fn test_read_yaml_agent_config() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "prompt: Hello").unwrap();
        writeln!(file, "guardrails:\n  - Stay polite").unwrap();

        let config = read_agent_config(file.path()).unwrap();
        assert_eq!(config.prompt, "Hello");
        assert_eq!(config.guardrails.unwrap().to_text(), "Stay polite");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(read_agent_config(Path::new("/nonexistent/agent.json")).is_err());
    }
}
