// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use tempo_orchestrator_core::domain::config::OrchestratorConfig;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./tempo-config.yaml)
        #[arg(short, long, default_value = "./tempo-config.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output } => generate(output).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = OrchestratorConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. TEMPO_CONFIG_PATH: {}",
            std::env::var("TEMPO_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./tempo-config.yaml");
        println!("  4. ~/.tempo/config.yaml");
        println!("  5. /etc/tempo/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "AWS:".bold());
    println!("  Region: {}", config.aws.region.as_deref().unwrap_or("(SDK default)"));
    println!("  Cluster: {}", display_or_unset(&config.aws.cluster));
    println!("  Listener: {}", display_or_unset(&config.aws.listener_arn));
    println!("  VPC: {}", display_or_unset(&config.aws.vpc_id));
    println!("  Subnets: {}", display_list(&config.aws.subnets));
    println!("  Security groups: {}", display_list(&config.aws.security_groups));
    println!();

    println!("{}", "Agent container:".bold());
    println!("  Image: {}", display_or_unset(&config.agent.image));
    println!("  Container: {} (port {})", config.agent.container_name, config.agent.port);
    println!("  CPU / memory: {} / {}", config.agent.cpu, config.agent.memory);
    println!("  Health check: {}", config.agent.health_check_path);
    println!();

    println!("{}", "Endpoints:".bold());
    println!("  Public base URL: {}", display_or_unset(&config.public_base_url));
    println!("  Server: {}:{}", config.server.bind_address, config.server.port);
    if config.metrics.enabled {
        println!("  Metrics: port {}", config.metrics.port);
    } else {
        println!("  Metrics: {}", "disabled".dimmed());
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = OrchestratorConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf) -> Result<()> {
    let sample = sample_config().to_yaml_string()?;

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

fn sample_config() -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();
    config.aws.region = Some("us-east-1".to_string());
    config.aws.cluster = "tempo-agents".to_string();
    config.aws.execution_role_arn = "arn:aws:iam::123456789012:role/tempo-agent-execution".to_string();
    config.aws.task_role_arn = "arn:aws:iam::123456789012:role/tempo-agent-task".to_string();
    config.aws.subnets = vec!["subnet-0123456789abcdef0".to_string()];
    config.aws.security_groups = vec!["sg-0123456789abcdef0".to_string()];
    config.aws.listener_arn =
        "arn:aws:elasticloadbalancing:us-east-1:123456789012:listener/app/tempo-voice/0123456789abcdef/0123456789abcdef"
            .to_string();
    config.aws.vpc_id = "vpc-0123456789abcdef0".to_string();
    config.agent.image = "123456789012.dkr.ecr.us-east-1.amazonaws.com/tempo-agent:latest".to_string();
    config.public_base_url = "https://voice.example.com".to_string();
    config
}

fn display_or_unset(value: &str) -> String {
    if value.trim().is_empty() {
        "(not set)".dimmed().to_string()
    } else {
        value.to_string()
    }
}

fn display_list(values: &[String]) -> String {
    if values.is_empty() {
        "(not set)".dimmed().to_string()
    } else {
        values.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_is_valid() {
        sample_config().validate().unwrap();
    }

    #[tokio::test]
    async fn test_generate_writes_loadable_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tempo-config.yaml");

        generate(path.clone()).await.unwrap();

        let loaded = OrchestratorConfig::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.aws.cluster, "tempo-agents");
        assert_eq!(loaded.agent.port, 8080);
    }
}
