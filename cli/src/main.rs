// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Tempo Orchestrator CLI
//!
//! The `tempo` binary deploys and stops per-agent voice services on the
//! shared cluster and load balancer.
//!
//! ## Commands
//!
//! - `tempo serve` - Run the invocation server the dashboard calls
//! - `tempo deploy|stop` - One-shot operations against the same orchestrator
//! - `tempo config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use tempo_orchestrator::bootstrap::{self, LogFormat};
use tempo_orchestrator::commands::{self, ConfigCommand};

/// Tempo Orchestrator - Per-agent voice service deployment
#[derive(Parser)]
#[command(name = "tempo")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "TEMPO_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API host (overrides server.bind_address)
    #[arg(long, global = true)]
    host: Option<String>,

    /// HTTP API port (overrides server.port)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "TEMPO_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, env = "TEMPO_LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Use the in-memory cloud instead of AWS (local dry runs)
    #[arg(long, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP invocation server
    #[command(name = "serve")]
    Serve,

    /// Deploy or update one agent
    #[command(name = "deploy")]
    Deploy {
        /// Agent identifier
        #[arg(long)]
        agent_id: String,

        /// Tenant the agent belongs to
        #[arg(long)]
        tenant_id: Option<String>,

        /// Agent configuration document (JSON or YAML)
        #[arg(long = "agent-config", value_name = "FILE")]
        agent_config: PathBuf,
    },

    /// Stop one agent
    #[command(name = "stop")]
    Stop {
        /// Agent identifier
        #[arg(long)]
        agent_id: String,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    bootstrap::init_logging(&cli.log_level, cli.log_format)?;

    match cli.command {
        Some(Commands::Serve) => {
            let mut config = bootstrap::load_config(cli.config)?;
            if let Some(host) = cli.host {
                config.server.bind_address = host;
            }
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            let service = bootstrap::build_service(&config, cli.in_memory).await?;
            commands::serve::run(&config, service).await
        }
        Some(Commands::Deploy {
            agent_id,
            tenant_id,
            agent_config,
        }) => {
            let config = bootstrap::load_config(cli.config)?;
            let service = bootstrap::build_service(&config, cli.in_memory).await?;
            commands::agent::deploy(service, agent_id, tenant_id, &agent_config).await
        }
        Some(Commands::Stop { agent_id }) => {
            let config = bootstrap::load_config(cli.config)?;
            let service = bootstrap::build_service(&config, cli.in_memory).await?;
            commands::agent::stop(service, agent_id).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config)
                .await
                .context("Config command failed")
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}
