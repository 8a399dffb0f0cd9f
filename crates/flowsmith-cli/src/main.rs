//! CLI entry point for flowsmith.
//!
//! This binary provides the `flowsmith` command: one-shot generation,
//! the HTTP server, and a catalog listing.

mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flowsmith_agent::{ServiceConfig, WorkflowService};
use flowsmith_synth::{Catalog, GenerationRequest};
use flowsmith_web::{WebConfig, WebServer};

use crate::cli::{Cli, Commands};

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing("info");

    let config =
        ServiceConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Generate {
            description,
            trigger,
            complexity,
            output,
            compact,
        } => {
            let request = GenerationRequest {
                description,
                trigger_type: trigger.map(Into::into),
                complexity: complexity.into(),
            };
            cmd_generate(&config, &request, output.as_deref(), compact).await
        }
        Commands::Serve { bind, port } => cmd_serve(config, bind, port).await,
        Commands::Catalog => cmd_catalog(),
    }
}

// ---------------------------------------------------------------------------
// Subcommand: generate
// ---------------------------------------------------------------------------

async fn cmd_generate(
    config: &ServiceConfig,
    request: &GenerationRequest,
    output: Option<&Path>,
    compact: bool,
) -> Result<()> {
    let service = WorkflowService::from_config(config).context("failed to build workflow service")?;
    let generation = service.generate(request).await;

    for issue in &generation.quality.issues {
        tracing::warn!(score = generation.quality.score, "{issue}");
    }

    let doc = &generation.workflow;
    let json = if compact {
        doc.to_json()
    } else {
        doc.to_json_pretty()
    }
    .context("failed to serialize workflow")?;

    write_output(&json, output)?;
    info!(id = %doc.id, name = %doc.name, nodes = doc.nodes.len(), "workflow generated");
    Ok(())
}

fn write_output(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommand: serve
// ---------------------------------------------------------------------------

async fn cmd_serve(
    mut config: ServiceConfig,
    bind: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let service =
        WorkflowService::from_config(&config).context("failed to build workflow service")?;
    let server = WebServer::new(
        WebConfig::from(&config),
        Arc::new(service),
        config.validation,
    );

    server
        .start()
        .await
        .with_context(|| format!("web server failed on {}", config.listen_addr()))
}

// ---------------------------------------------------------------------------
// Subcommand: catalog
// ---------------------------------------------------------------------------

fn cmd_catalog() -> Result<()> {
    let catalog = Catalog::builtin();
    println!("{:<20} {:<34} {:<22} CATEGORY", "KEY", "TYPE", "NAME");
    for template in catalog.entries() {
        println!(
            "{:<20} {:<34} {:<22} {}",
            template.kind.as_str(),
            template.node_type,
            template.name,
            template.category.as_str()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Logs go to stderr; stdout carries generated JSON.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
