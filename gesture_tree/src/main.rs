//! gesture_tree — interactive entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use gesture_tree::app::run;
use gesture_tree::config::{AppConfig, SourceKind};
use tracing_subscriber::EnvFilter;

/// Particle Christmas tree driven by hand gestures.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Landmark source; overrides `source.kind`.
    #[arg(short, long, value_enum)]
    source: Option<SourceKind>,

    /// Recording to replay (implies `--source replay`).
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Recognizer program (implies `--source command`).
    #[arg(long)]
    command: Option<String>,

    /// Argument passed to the recognizer; repeatable.
    #[arg(long = "arg", allow_hyphen_values = true)]
    args: Vec<String>,

    /// Seed for ornament placement and the pinch fallback.
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn apply(self, cfg: &mut AppConfig) {
        if let Some(path) = self.replay {
            cfg.source.kind        = SourceKind::Replay;
            cfg.source.replay_path = Some(path);
        }
        if let Some(program) = self.command {
            cfg.source.kind    = SourceKind::Command;
            cfg.source.command = Some(program);
        }
        if !self.args.is_empty() {
            cfg.source.args = self.args;
        }
        if let Some(kind) = self.source {
            cfg.source.kind = kind;
        }
        if let Some(seed) = self.seed {
            cfg.scene.seed = seed;
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::default(),
    };
    cli.apply(&mut cfg);

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Gesture Tree — Hand-Controlled Particle Christmas     ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    match cfg.source.kind {
        SourceKind::Sim     => println!("  Mode: Mouse + keyboard simulation  (O/F/P/H set the hand pose)"),
        SourceKind::Command => println!("  Mode: Recognizer `{}`", cfg.source.command.as_deref().unwrap_or("?")),
        SourceKind::Replay  => println!("  Mode: Replaying {}", cfg.source.replay_path.as_deref().map_or("?".to_string(), |p| p.display().to_string())),
    }
    println!();
    println!("  Opening visualizer window…");
    println!();

    run(cfg).context("gesture tree stopped")?;
    Ok(())
}
