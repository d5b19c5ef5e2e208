// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Orchestrator Configuration
//
// Process-wide deployment constants shared by every invocation:
// - Cluster, IAM roles and container image for agent tasks
// - Networking (subnets, security groups, VPC) and the shared listener
// - Externally reachable base URL used to build webhook URLs
// - HTTP server and metrics settings
//
// Loaded from YAML, then overridden by TEMPO_* environment variables so
// container deployments can be configured without a file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Cloud resources agents are deployed into
    #[serde(default)]
    pub aws: AwsConfig,

    /// Agent container shape
    #[serde(default)]
    pub agent: AgentContainerConfig,

    /// Externally reachable base URL of the shared load balancer
    /// (e.g. "https://voice.example.com")
    #[serde(default)]
    pub public_base_url: String,

    /// HTTP invocation server
    #[serde(default)]
    pub server: ServerConfig,

    /// Metrics exposition
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Region override; falls back to the SDK default provider chain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// ECS cluster name or ARN
    #[serde(default)]
    pub cluster: String,

    #[serde(default)]
    pub execution_role_arn: String,

    #[serde(default)]
    pub task_role_arn: String,

    #[serde(default)]
    pub subnets: Vec<String>,

    #[serde(default)]
    pub security_groups: Vec<String>,

    /// Shared ALB listener every agent rule is attached to
    #[serde(default)]
    pub listener_arn: String,

    #[serde(default)]
    pub vpc_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContainerConfig {
    /// Agent runtime image reference
    #[serde(default)]
    pub image: String,

    #[serde(default = "default_container_name")]
    pub container_name: String,

    #[serde(default = "default_container_port")]
    pub port: u16,

    /// Fargate CPU units
    #[serde(default = "default_cpu")]
    pub cpu: String,

    /// Fargate memory in MiB
    #[serde(default = "default_memory")]
    pub memory: String,

    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,
}

impl Default for AgentContainerConfig {
    fn default() -> Self {
        Self {
            image: String::new(),
            container_name: default_container_name(),
            port: default_container_port(),
            cpu: default_cpu(),
            memory: default_memory(),
            health_check_path: default_health_check_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

fn default_container_name() -> String {
    "agent".to_string()
}

fn default_container_port() -> u16 {
    8080
}

fn default_cpu() -> String {
    "256".to_string()
}

fn default_memory() -> String {
    "512".to_string()
}

fn default_health_check_path() -> String {
    "/health".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_metrics_port() -> u16 {
    9090
}

impl OrchestratorConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Discover configuration file using precedence order
    /// 1. TEMPO_CONFIG_PATH environment variable
    /// 2. ./tempo-config.yaml (working directory)
    /// 3. ~/.tempo/config.yaml (user home)
    /// 4. /etc/tempo/config.yaml (Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("TEMPO_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./tempo-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".tempo").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/tempo/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, falling back to defaults.
    /// Environment overrides are applied in every case.
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?
        } else if let Some(path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", path);
            Self::from_yaml_file(path)?
        } else {
            tracing::info!("No configuration file found; using environment and defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.normalize();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup, so tests need not touch the
    /// process environment.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("AWS_REGION") {
            self.aws.region = Some(v);
        }
        if let Some(v) = get("TEMPO_CLUSTER") {
            self.aws.cluster = v;
        }
        if let Some(v) = get("TEMPO_EXECUTION_ROLE_ARN") {
            self.aws.execution_role_arn = v;
        }
        if let Some(v) = get("TEMPO_TASK_ROLE_ARN") {
            self.aws.task_role_arn = v;
        }
        if let Some(v) = get("TEMPO_SUBNETS") {
            self.aws.subnets = split_list(&v);
        }
        if let Some(v) = get("TEMPO_SECURITY_GROUPS") {
            self.aws.security_groups = split_list(&v);
        }
        if let Some(v) = get("TEMPO_LISTENER_ARN") {
            self.aws.listener_arn = v;
        }
        if let Some(v) = get("TEMPO_VPC_ID") {
            self.aws.vpc_id = v;
        }
        if let Some(v) = get("TEMPO_AGENT_IMAGE") {
            self.agent.image = v;
        }
        if let Some(v) = get("TEMPO_CONTAINER_CPU") {
            self.agent.cpu = v;
        }
        if let Some(v) = get("TEMPO_CONTAINER_MEMORY") {
            self.agent.memory = v;
        }
        if let Some(v) = get("TEMPO_HEALTH_CHECK_PATH") {
            self.agent.health_check_path = v;
        }
        if let Some(v) = get("TEMPO_PUBLIC_BASE_URL") {
            self.public_base_url = v;
        }
        if let Some(v) = get("TEMPO_HOST") {
            self.server.bind_address = v;
        }

        for (key, slot) in [
            ("TEMPO_CONTAINER_PORT", &mut self.agent.port),
            ("TEMPO_PORT", &mut self.server.port),
            ("TEMPO_METRICS_PORT", &mut self.metrics.port),
        ] {
            if let Some(v) = get(key) {
                match v.trim().parse::<u16>() {
                    Ok(port) => *slot = port,
                    Err(_) => tracing::warn!(
                        "Invalid value for {}: '{}'. Expected a port number. Ignoring.",
                        key,
                        v
                    ),
                }
            }
        }

        if let Some(v) = get("TEMPO_METRICS_ENABLED") {
            match v.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => self.metrics.enabled = true,
                "false" | "0" | "no" | "off" => self.metrics.enabled = false,
                _ => tracing::warn!(
                    "Invalid value for TEMPO_METRICS_ENABLED: '{}'. Expected true/false. Ignoring.",
                    v
                ),
            }
        }
    }

    /// Trailing slashes on the base URL would double up in built URLs.
    pub fn normalize(&mut self) {
        let trimmed = self.public_base_url.trim().trim_end_matches('/').to_string();
        self.public_base_url = trimmed;
    }

    /// Validate that every field a deploy depends on is present.
    /// Reports all missing fields at once.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut missing = Vec::new();
        let required = [
            ("aws.cluster (TEMPO_CLUSTER)", self.aws.cluster.as_str()),
            ("aws.execution_role_arn (TEMPO_EXECUTION_ROLE_ARN)", self.aws.execution_role_arn.as_str()),
            ("aws.task_role_arn (TEMPO_TASK_ROLE_ARN)", self.aws.task_role_arn.as_str()),
            ("aws.listener_arn (TEMPO_LISTENER_ARN)", self.aws.listener_arn.as_str()),
            ("aws.vpc_id (TEMPO_VPC_ID)", self.aws.vpc_id.as_str()),
            ("agent.image (TEMPO_AGENT_IMAGE)", self.agent.image.as_str()),
            ("public_base_url (TEMPO_PUBLIC_BASE_URL)", self.public_base_url.as_str()),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        if self.aws.subnets.is_empty() {
            missing.push("aws.subnets (TEMPO_SUBNETS)");
        }
        if self.aws.security_groups.is_empty() {
            missing.push("aws.security_groups (TEMPO_SECURITY_GROUPS)");
        }
        if !missing.is_empty() {
            anyhow::bail!("Missing required configuration: {}", missing.join(", "));
        }

        if !self.agent.health_check_path.starts_with('/') {
            anyhow::bail!(
                "agent.health_check_path must start with '/': '{}'",
                self.agent.health_check_path
            );
        }
        if self.agent.port == 0 {
            anyhow::bail!("agent.port cannot be 0");
        }

        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn complete_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("TEMPO_CLUSTER", "voice-agents"),
            ("TEMPO_EXECUTION_ROLE_ARN", "arn:aws:iam::1:role/exec"),
            ("TEMPO_TASK_ROLE_ARN", "arn:aws:iam::1:role/task"),
            ("TEMPO_SUBNETS", "subnet-a, subnet-b,,"),
            ("TEMPO_SECURITY_GROUPS", "sg-1"),
            ("TEMPO_LISTENER_ARN", "arn:aws:elasticloadbalancing:listener/app/x/1/2"),
            ("TEMPO_VPC_ID", "vpc-1"),
            ("TEMPO_AGENT_IMAGE", "1.dkr.ecr.us-east-1.amazonaws.com/agent:latest"),
            ("TEMPO_PUBLIC_BASE_URL", "https://voice.example.com/"),
        ])
    }

    #[test]
    fn test_defaults_fail_validation_listing_every_field() {
        let config = OrchestratorConfig::default();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("TEMPO_CLUSTER"));
        assert!(err.contains("TEMPO_SUBNETS"));
        assert!(err.contains("TEMPO_PUBLIC_BASE_URL"));
    }

    #[test]
    fn test_env_overrides_produce_valid_config() {
        let env = complete_env();
        let mut config = OrchestratorConfig::default();
        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));
        config.normalize();

        assert!(config.validate().is_ok());
        assert_eq!(config.aws.subnets, vec!["subnet-a", "subnet-b"]);
        assert_eq!(config.public_base_url, "https://voice.example.com");
        assert_eq!(config.agent.port, 8080);
        assert_eq!(config.agent.cpu, "256");
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let mut config = OrchestratorConfig::default();
        config.apply_overrides_from(|k| match k {
            "TEMPO_CONTAINER_PORT" => Some("eighty".to_string()),
            "TEMPO_PORT" => Some("9000".to_string()),
            _ => None,
        });
        assert_eq!(config.agent.port, 8080);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_yaml_with_partial_sections() {
        let yaml = r#"
aws:
  cluster: voice-agents
  subnets: [subnet-a]
agent:
  image: agent:1
  port: 3000
public_base_url: https://voice.example.com
"#;
        let config = OrchestratorConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.aws.cluster, "voice-agents");
        assert_eq!(config.agent.port, 3000);
        assert_eq!(config.agent.container_name, "agent");
        assert_eq!(config.agent.health_check_path, "/health");
        assert_eq!(config.server.port, 8000);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let env = complete_env();
        let mut config = OrchestratorConfig::default();
        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tempo-config.yaml");
        std::fs::write(&path, config.to_yaml_string().unwrap()).unwrap();

        let loaded = OrchestratorConfig::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.aws.listener_arn, config.aws.listener_arn);
        assert_eq!(loaded.aws.security_groups, vec!["sg-1"]);
    }

    #[test]
    fn test_health_check_path_must_be_absolute() {
        let env = complete_env();
        let mut config = OrchestratorConfig::default();
        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));
        config.agent.health_check_path = "health".to_string();
        assert!(config.validate().is_err());
    }
}
