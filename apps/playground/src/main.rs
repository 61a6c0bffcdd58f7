use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod config;
mod simulation;

use config::{load_settings, PlaygroundSettings};

/// Drives a fetch controller through a scripted sequence of argument changes
/// and prints every rendered frame as JSON.
#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "playground.toml")]
    config: PathBuf,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    min_latency_ms: Option<u64>,
    #[arg(long)]
    max_latency_ms: Option<u64>,
    #[arg(long)]
    step_ms: Option<u64>,
    /// Argument values evaluated in order, one per step.
    script: Vec<String>,
}

impl Cli {
    fn apply(self, settings: &mut PlaygroundSettings) {
        if let Some(v) = self.name {
            settings.controller.name = v;
        }
        if let Some(v) = self.min_latency_ms {
            settings.min_latency_ms = v;
        }
        if let Some(v) = self.max_latency_ms {
            settings.max_latency_ms = v;
        }
        if let Some(v) = self.step_ms {
            settings.step_ms = v;
        }
        if !self.script.is_empty() {
            settings.script = self.script;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config)?;
    cli.apply(&mut settings);
    settings.validate()?;

    let report = simulation::run(&settings).await?;
    for frame in &report.frames {
        println!("{}", serde_json::to_string(frame)?);
    }
    println!("issued {} fetches", report.issued);
    Ok(())
}
