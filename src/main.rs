use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use moodcam::emoji::EmojiTable;
use moodcam::{config, detect, runner, Analyzer, Camera, FrameSource};

#[derive(Parser)]
#[command(name = "moodcam")]
#[command(
    version,
    about = "Real-time webcam emotion detection with a browser UI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the browser UI and drive the capture loop
    Run {
        /// Address to bind the UI server on (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
        /// Camera device path (overrides config)
        #[arg(short, long)]
        camera: Option<String>,
    },
    /// Capture one frame, analyze it, and print the emotion scores
    Snapshot {
        /// Write the annotated frame to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load_config(None)?;

    match cli.command {
        Commands::Run { bind, camera } => {
            if let Some(bind) = bind {
                cfg.bind = bind;
            }
            if let Some(camera) = camera {
                cfg.camera = camera;
            }
            runner::run(cfg)
        }
        Commands::Snapshot { output } => snapshot(&cfg, output),
        Commands::Config => open_config(),
    }
}

fn snapshot(cfg: &config::Config, output: Option<PathBuf>) -> Result<()> {
    info!("Opening camera: {}", cfg.camera);
    let mut camera = Camera::open(&cfg.camera).context("Failed to open camera")?;

    let mut analyzer =
        Analyzer::new(cfg.analyzer_options()).context("Failed to initialize emotion analyzer")?;
    let emojis = EmojiTable::builtin();

    let mut frame = camera.next_frame().context("Failed to capture frame")?;
    let mut failures = detect::FailureTracker::default();
    let step = detect::detect_step(&mut analyzer, &mut frame, &emojis, &mut failures);

    info!("Current emotion: {}", step.glyph);
    if step.scores.is_empty() {
        info!("No emotion scores for this frame");
    }
    for (label, confidence) in &step.scores {
        info!("  {:<9} {:>5.1}", label.as_str(), confidence);
    }

    if let Some(path) = output {
        frame
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Annotated frame written to {}", path.display());
    }

    Ok(())
}

fn open_config() -> Result<()> {
    let config_path = config::CONFIG_PATH.as_os_str();
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
