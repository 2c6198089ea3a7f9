//! CLI entry and dispatch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing::info;
use ygs_core::config::{Config, DEFAULT_CONFIG_FILE};
use ygs_core::registry::WidgetRegistry;
use ygs_core::status::{StatusBar, WidgetSlot};

use crate::{logging, signals};

#[derive(Parser)]
#[command(name = "yagostatus")]
#[command(version)]
#[command(about = "i3bar status line built from independent widgets")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the configuration file
    #[arg(short, long, env = "YAGOSTATUS_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Validate the configuration and exit
    Check,
    /// List available widget kinds
    Widgets,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.log_file.as_deref())?;

    // Composition root: the only place widgets are registered.
    let registry = WidgetRegistry::builtins();

    match cli.command {
        Some(Commands::Widgets) => {
            for kind in registry.kinds() {
                println!("{kind}");
            }
            Ok(())
        }
        Some(Commands::Check) => {
            let slots = load(&cli.config, &registry)?;
            println!("{}: {} widget(s) OK", cli.config.display(), slots.len());
            Ok(())
        }
        None => {
            let slots = load(&cli.config, &registry)?;
            let bar = StatusBar::new(slots);

            // one tokio runtime for everything
            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            rt.block_on(async {
                info!(config = %cli.config.display(), "starting");
                bar.run(
                    BufReader::new(tokio::io::stdin()),
                    tokio::io::stdout(),
                    signals::terminated(),
                )
                .await
            })?;
            // Widgets ignoring stop may still be blocked in their own I/O.
            rt.shutdown_background();
            Ok(())
        }
    }
}

fn load(path: &Path, registry: &WidgetRegistry) -> Result<Vec<WidgetSlot>> {
    let config =
        Config::load(path).with_context(|| format!("invalid config {}", path.display()))?;
    config
        .build_slots(registry)
        .with_context(|| format!("invalid config {}", path.display()))
}
