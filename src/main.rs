mod config;
mod confirm;
mod deploy;
mod dnac;
mod error;
mod intent;
mod links;
mod models;
mod pipeline;
mod render;
mod synth;
mod topology;
mod utils;

use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use confirm::{AssumeYes, Confirm, Interactive};
use deploy::Timings;
use dnac::DnacClient;
use error::FusionError;
use intent::Intent;
use pipeline::{Outcome, Pipeline, RunOptions};
use render::BlockRenderer;

/// Provision a fusion router from SDA border handoff settings
#[derive(Debug, Parser)]
#[command(name = "fusion-provision", version, about)]
struct Args {
    /// Intent file (border/fusion name patterns and VRF definitions)
    #[arg(long, default_value = "./config.yaml")]
    intent: PathBuf,

    /// Directory with vrf.tera, vlan_interface.tera, bgp_peer.tera or bgp.tera overrides
    #[arg(long)]
    templates_dir: Option<PathBuf>,

    /// Answer yes at every confirmation gate
    #[arg(long)]
    yes: bool,

    /// Print the generated configuration without asking
    #[arg(long)]
    show_config: bool,

    /// Also write the generated configuration to this file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Stop after generating the configuration
    #[arg(long)]
    dry_run: bool,

    /// Treat ambiguous device or VLAN matches as errors
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fusion_provision=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    tracing::info!("-- Start --");

    tracing::info!("Step 1: Load Config File");
    let cfg = Config::load()?;
    let intent = Intent::load(&args.intent, args.strict)?;
    let renderer = match &args.templates_dir {
        Some(dir) => BlockRenderer::with_overrides(dir)?,
        None => BlockRenderer::builtin()?,
    };
    tracing::info!(
        "Intent loaded: {} border patterns, {} VRFs",
        intent.border_node_patterns.len(),
        intent.vrfs.len()
    );

    tracing::info!("Step 2: Connect to DNA Center");
    let client = DnacClient::connect(&cfg).await?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            tracing::warn!("Interrupted, stopping");
            cancel.cancel();
        });
    }

    let gate: Box<dyn Confirm> = if args.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(Interactive)
    };
    let run = Pipeline {
        controller: &client,
        config: &cfg,
        intent: &intent,
        renderer: &renderer,
        gate: gate.as_ref(),
        timings: Timings::from_config(&cfg),
        cancel: cancel.clone(),
    };
    let opts = RunOptions {
        strict: args.strict,
        show_config: args.show_config,
        output: args.output,
        dry_run: args.dry_run,
    };

    let outcome = tokio::select! {
        result = run.run(&opts) => result?,
        _ = cancel.cancelled() => {
            // a pending prompt keeps a blocking thread alive; do not wait for it
            tracing::error!("{}", FusionError::Cancelled);
            std::process::exit(1);
        }
    };

    match outcome {
        Outcome::DryRun { config } => {
            tracing::info!("Dry run complete ({} bytes generated)", config.len())
        }
        Outcome::Aborted { at } => tracing::info!("Stopped at \"{}\"", at),
        Outcome::NotPublished { reason } => tracing::warn!("Template not published: {}", reason),
        Outcome::Published { template } => {
            tracing::info!("Template {} published; no deployment target", template.name)
        }
        Outcome::Deployed { template, task } => tracing::info!(
            "Deployment {} of {} finished: {}",
            task.deployment_id,
            template.name,
            task.status
        ),
    }
    tracing::info!("-- Finished --");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
