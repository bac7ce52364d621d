#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use triad_bench::{Algorithm, RecordFilter, Variant};
use triad_bench::bench::bench_cmd::{self, RunArgs, ShowArgs};

#[derive(Parser, Debug)]
#[command(name = "triad-bench")]
#[command(about = "Compare interpreted, compiled and parallel kernels on the same workloads", long_about = None)]
struct Cli {
    /// Enable verbose logging (or set TRIAD_BENCH_LOG)
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the benchmark suite and print the comparison table
    Run {
        /// Suite file (TOML, or YAML by extension); defaults to bench-config.toml if present
        #[arg(long)]
        config: Option<PathBuf>,
        /// Algorithms to run (repeatable); defaults to all four
        #[arg(long = "algorithm", value_name = "NAME")]
        algorithms: Vec<Algorithm>,
        /// Number of measured iterations per entry
        #[arg(long)]
        iterations: Option<usize>,
        /// Number of warm-up calls per entry before measuring
        #[arg(long)]
        warmup: Option<usize>,
        /// Worker count of the parallel variant
        #[arg(long)]
        workers: Option<usize>,
        /// Pause between measured iterations, in milliseconds
        #[arg(long)]
        yield_ms: Option<u64>,
        /// Append the run record to this JSONL file
        #[arg(long)]
        jsonl: Option<PathBuf>,
        /// Write the run as CSV to this file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write a markdown report to this file
        #[arg(long)]
        markdown: Option<PathBuf>,
    },

    /// List the callables exposed across the boundary
    List,

    /// Invoke one callable with a JSON payload
    Call {
        /// Callable name, e.g. matrixMultiplyCompiledParallel
        #[arg(long)]
        callable: String,
        /// JSON payload, or @path to read it from a file
        #[arg(long)]
        payload: String,
        /// Worker count of the runtime
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Render stored run records
    Show {
        /// JSONL file (default: out/bench.jsonl)
        #[arg(long)]
        jsonl: Option<PathBuf>,
        /// Only show records of this suite
        #[arg(long)]
        suite: Option<String>,
        /// Only show results of this algorithm
        #[arg(long)]
        algorithm: Option<Algorithm>,
        /// Only show results of this variant, e.g. compiled_parallel
        #[arg(long)]
        variant: Option<Variant>,
        /// Only show the newest matching record
        #[arg(long)]
        latest: bool,
        /// Render as markdown instead of plain tables
        #[arg(long)]
        markdown: bool,
    },

    /// Export stored run records to CSV
    ExportCsv {
        /// JSONL file (default: out/bench.jsonl)
        #[arg(long)]
        jsonl: Option<PathBuf>,
        /// CSV output (default: out/bench.csv)
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let env = std::env::var("TRIAD_BENCH_LOG").unwrap_or_else(|_| {
        if verbose { "triad_bench=debug".to_string() } else { "triad_bench=info".to_string() }
    });
    let _ = tracing_subscriber::fmt()
        .with_span_events(FmtSpan::ACTIVE)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_env_filter(EnvFilter::new(env))
        .try_init();
}

fn main() {
    color_eyre::install().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run { config, algorithms, iterations, warmup, workers, yield_ms, jsonl, csv, markdown } => {
            bench_cmd::run(RunArgs {
                config,
                algorithms,
                iterations,
                warmup,
                workers,
                yield_ms,
                jsonl,
                csv,
                markdown,
                cli_args: std::env::args().collect(),
            })
            .map(|_| ())
        }
        Commands::List => bench_cmd::list(),
        Commands::Call { callable, payload, workers } => bench_cmd::call(&callable, &payload, workers),
        Commands::Show { jsonl, suite, algorithm, variant, latest, markdown } => bench_cmd::show(ShowArgs {
            jsonl,
            filter: RecordFilter { suite, algorithm, variant },
            latest,
            markdown,
        }),
        Commands::ExportCsv { jsonl, csv } => bench_cmd::export_csv(jsonl, csv),
    };

    if let Err(e) = result {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
