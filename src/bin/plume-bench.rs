use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use plume::bench::{JsonSink, LogSink, QueryFileMode, RunConfig, Runner};
use plume::{EngineConfig, Result};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Times batched feature gathers against the configured storage engines"
)]
struct Args {
    /// Dataset directory name under bench/data/.
    dataset: String,

    /// Run directory name under the dataset (holds metadata.json and
    /// query CSVs).
    run_id: String,

    #[arg(long, value_enum, default_value = "in-memory")]
    engine: EngineArg,

    /// Concatenate every query CSV in the run directory instead of
    /// using only the lexicographically first one.
    #[arg(long)]
    all_queries: bool,

    /// Backing file for the mmap engine. Defaults to features.bin in
    /// the dataset directory.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Also write JSON reports into this directory.
    #[arg(long)]
    json_out: Option<PathBuf>,

    /// Log filter, e.g. "info" or "plume=debug".
    #[arg(long, default_value = "info")]
    log: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum EngineArg {
    InMemory,
    Mmap,
    All,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("benchmark failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let query_mode = if args.all_queries {
        QueryFileMode::All
    } else {
        QueryFileMode::First
    };
    let run_cfg = RunConfig::load(&args.dataset, &args.run_id, query_mode)?;

    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| run_cfg.dataset_dir().join("features.bin"));

    let engines: Vec<EngineConfig> = match args.engine {
        EngineArg::InMemory => vec![EngineConfig::InMemory],
        EngineArg::Mmap => vec![EngineConfig::FlatMmap { db_path }],
        EngineArg::All => vec![
            EngineConfig::InMemory,
            EngineConfig::FlatMmap { db_path },
        ],
    };

    for engine_cfg in engines {
        let mut runner = Runner::new(engine_cfg, run_cfg.clone());
        runner.add_sink(Box::new(LogSink));
        if let Some(out_dir) = &args.json_out {
            runner.add_sink(Box::new(JsonSink::new(out_dir.clone())));
        }
        runner.run()?;
    }
    Ok(())
}
