use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::Context;
use celsweep_core::{
    MemoryScene, SweepConfig, SweepOutcome,
    diagnostics::init_tracing_with_options,
    fixtures::demo_scene,
    generate_inventory_report,
    inventory::write_inventory_report,
    persistence::{backup_scene, load_scene, save_scene},
    plan_sweep, remove_unexposed_cels,
};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "celsweep-cli")]
#[command(about = "Headless tools for removing unexposed cels from scene snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file; defaults to celsweep.config.toml discovery.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write the demo scene snapshot.
    Demo {
        #[arg(long, default_value = "data/demo.celsweep.json")]
        output: PathBuf,
    },
    /// Print storage counts and fingerprint for a scene.
    Inventory {
        #[arg(long)]
        scene: PathBuf,

        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Remove unexposed cels for the selected nodes.
    Sweep {
        #[arg(long)]
        scene: PathBuf,

        /// Node path to select; repeat for several nodes or groups.
        #[arg(long = "select", required = true)]
        selection: Vec<String>,

        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,

        /// Print the deletion plan without touching the scene.
        #[arg(long)]
        dry_run: bool,

        /// Write the result here instead of rewriting the scene file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn prompt(drawing_count: usize) -> bool {
    eprint!(
        "You are about to delete unexposed cels on {drawing_count} drawing nodes. Continue? [y/N] "
    );
    if io::stderr().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode output json")?;
    println!("{json}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SweepConfig::load_from(path)?,
        None => SweepConfig::load_or_default()?,
    };
    let log_dir = cli
        .log_dir
        .clone()
        .unwrap_or_else(|| config.diagnostics.log_dir.clone());
    let _telemetry = init_tracing_with_options(
        &log_dir,
        &config.diagnostics.trace_file_prefix,
        &config.diagnostics.rust_log_filter,
    )?;

    match cli.command {
        Commands::Demo { output } => {
            save_scene(&output, &demo_scene())?;
            tracing::info!(path = %output.display(), "demo scene written");
        }
        Commands::Inventory { scene, output } => {
            let report = generate_inventory_report(&load_scene(&scene)?)?;
            match output {
                Some(path) => write_inventory_report(&path, &report)?,
                None => print_json(&report)?,
            }
        }
        Commands::Sweep {
            scene: scene_path,
            selection,
            yes,
            dry_run,
            output,
        } => {
            let options = config.sweep_options(yes);
            let mut host = MemoryScene::new(load_scene(&scene_path)?);

            if dry_run {
                let plans = plan_sweep(&host, &selection, options.duplicate_columns)?;
                return print_json(&plans);
            }

            let outcome = remove_unexposed_cels(&mut host, &selection, &mut prompt, &options)?;
            let SweepOutcome::Completed(report) = &outcome else {
                tracing::info!("sweep aborted, scene left untouched");
                return Ok(());
            };

            let target = match output {
                Some(path) => path,
                None => {
                    let backup = backup_scene(&scene_path)?;
                    tracing::info!(path = %backup.display(), "scene backup written");
                    scene_path
                }
            };
            save_scene(&target, host.scene())?;
            print_json(report)?;
        }
    }

    Ok(())
}
