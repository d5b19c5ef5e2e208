// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Process wiring shared by every command: logging, configuration and the
//! deployment service backed by either AWS or the in-memory cloud.

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use tempo_orchestrator_core::application::deployment::{AgentDeploymentService, DeploymentOrchestrator};
use tempo_orchestrator_core::domain::cloud::{ContainerCluster, LoadBalancer};
use tempo_orchestrator_core::domain::config::OrchestratorConfig;
use tempo_orchestrator_core::infrastructure::aws::{self, EcsCluster, ElbLoadBalancer};
use tempo_orchestrator_core::infrastructure::InMemoryCloud;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Initialize tracing subscriber for logging
pub fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Text => builder.with_target(false).compact().init(),
        LogFormat::Json => builder.with_target(true).json().init(),
    }

    Ok(())
}

pub fn load_config(path: Option<PathBuf>) -> Result<OrchestratorConfig> {
    OrchestratorConfig::load_or_default(path).context("Failed to load configuration")
}

/// Build the deployment service. AWS mode refuses to start on an incomplete
/// configuration; in-memory mode accepts anything.
pub async fn build_service(
    config: &OrchestratorConfig,
    in_memory: bool,
) -> Result<Arc<dyn AgentDeploymentService>> {
    let config = Arc::new(config.clone());

    let (cluster, load_balancer): (Arc<dyn ContainerCluster>, Arc<dyn LoadBalancer>) = if in_memory {
        warn!("Using the in-memory cloud; nothing will be deployed to AWS");
        let cloud = Arc::new(InMemoryCloud::new());
        let cluster: Arc<dyn ContainerCluster> = cloud.clone();
        let load_balancer: Arc<dyn LoadBalancer> = cloud;
        (cluster, load_balancer)
    } else {
        config.validate().context("Configuration validation failed")?;
        let sdk_config = aws::load_sdk_config(config.aws.region.clone()).await;
        info!(
            region = ?sdk_config.region().map(|r| r.as_ref().to_string()),
            cluster = %config.aws.cluster,
            "Initialized AWS clients"
        );
        let cluster: Arc<dyn ContainerCluster> = Arc::new(EcsCluster::new(&sdk_config));
        let load_balancer: Arc<dyn LoadBalancer> = Arc::new(ElbLoadBalancer::new(&sdk_config));
        (cluster, load_balancer)
    };

    Ok(Arc::new(DeploymentOrchestrator::new(cluster, load_balancer, config)))
}
