//! Offline replay: feed a JSON Lines landmark recording through the
//! interpreter and print every intent it emits.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use gesture_intent::{decode_line, GestureInterpreter, InterpreterConfig, SceneEvent};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Replay recorded hand landmarks through the gesture interpreter")]
struct Cli {
    /// JSON Lines recording; reads stdin when omitted.
    input: Option<PathBuf>,
    #[arg(long, default_value_t = 0.4)]
    formation_confidence: f32,
    #[arg(long, default_value_t = 0.15)]
    rotation_scale: f32,
    #[arg(long, default_value_t = 0.01)]
    rotation_dead_zone: f32,
    #[arg(long, default_value_t = 0.08)]
    pinch_threshold: f32,
    /// Also print rotation events whose speed is zero.
    #[arg(long)]
    all: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut interp = GestureInterpreter::new(InterpreterConfig {
        formation_confidence: cli.formation_confidence,
        rotation_scale:       cli.rotation_scale,
        rotation_dead_zone:   cli.rotation_dead_zone,
        pinch_threshold:      cli.pinch_threshold,
    });

    let mut frames = 0usize;
    let mut emitted = 0usize;

    for (i, line) in reader.lines().enumerate() {
        let line = line.context("reading recording")?;
        let frame = match decode_line(&line) {
            Ok(sample) => sample.into_frame(),
            Err(e) => {
                debug!(line = i + 1, error = %e, "skipping line");
                continue;
            }
        };
        frames += 1;

        for event in interp.interpret(&frame).into_events() {
            if !cli.all && event == SceneEvent::SetRotationSpeed(0.0) {
                continue;
            }
            emitted += 1;
            match event {
                SceneEvent::SetFormation(f)     => println!("[{:>6}]  formation  {}", i, f.name()),
                SceneEvent::SetRotationSpeed(v) => println!("[{:>6}]  rotation   {:+.4}", i, v),
                SceneEvent::PinchStart { x, y } => println!("[{:>6}]  pinch      start ({:.3}, {:.3})", i, x, y),
                SceneEvent::PinchEnd            => println!("[{:>6}]  pinch      end", i),
            }
        }
    }

    println!("  └─ {} frames, {} events", frames, emitted);
    Ok(())
}
