mod app;
mod participant;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::app::{App, RunOptions, TaskName};

/// Cognitive games on a deterministic trial engine.
#[derive(Parser, Debug)]
#[command(name = "cogsuite", version)]
struct Cli {
    /// Task settings as JSON, one section per task
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Partition a surface into a labelled board and save it as PNG
    Layout {
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long, default_value_t = 600.0)]
        height: f64,
        #[arg(long, default_value_t = 100)]
        count: usize,
        /// Use a k x k grid instead of the shattered partition
        #[arg(long)]
        grid: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Run one task with a scripted participant and print the summary
    Run {
        #[arg(value_enum)]
        task: TaskName,
        #[arg(long)]
        seed: Option<u64>,
        /// Sleep on the wall clock instead of a virtual one
        #[arg(long)]
        realtime: bool,
        /// Probability of answering correctly
        #[arg(long, default_value_t = 0.85)]
        accuracy: f64,
        /// Mean reaction time in milliseconds
        #[arg(long, default_value_t = 450)]
        mean_rt: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cogsuite=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = App::new(cli.config)?;

    let output = match cli.command {
        Command::Layout {
            width,
            height,
            count,
            grid,
            seed,
            out,
        } => {
            let seed = seed.unwrap_or_else(rand::random);
            serde_json::to_value(app.layout(width, height, count, grid, seed, &out)?)?
        }
        Command::Run {
            task,
            seed,
            realtime,
            accuracy,
            mean_rt,
        } => {
            let opts = RunOptions {
                seed: seed.unwrap_or_else(rand::random),
                accuracy,
                mean_rt_ms: mean_rt,
                realtime,
            };
            tracing::info!(seed = opts.seed, ?task, "running");
            app.run(task, &opts)?
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
