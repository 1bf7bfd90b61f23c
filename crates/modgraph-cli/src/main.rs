#![forbid(unsafe_code)]

mod cmd;
mod output;
mod timing;

use std::env;
use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use timing::Timings;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "modgraph: module dependency graphs and size summaries",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print per-stage timings to stderr.
    #[arg(long, global = true)]
    timing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Write one DOT requires graph per module",
        long_about = "Resolve each module, drop requires edges implied by longer paths, \
                      and write the result to <output>/<module>.dot.",
        after_help = "EXAMPLES:\n    # Graph every module\n    modgraph graphs --module-path jmods --output graphs\n\n    # Graph only the public surface of java.se\n    modgraph graphs --module-path jmods --output graphs --spec java.se"
    )]
    Graphs(cmd::graphs::GraphsArgs),

    #[command(
        about = "Write an HTML size summary",
        long_about = "Resolve the given roots and write a per-module content and size table.",
        after_help = "EXAMPLES:\n    # Summarize the whole module path\n    modgraph summary --module-path jmods -o summary.html\n\n    # Summarize what java.sql drags in\n    modgraph summary --module-path jmods -o sql.html --root java.sql"
    )]
    Summary(cmd::summary::SummaryArgs),

    #[command(
        about = "Print the modules a set of roots resolves to",
        after_help = "EXAMPLES:\n    modgraph resolve --module-path jmods --root java.sql --json"
    )]
    Resolve(cmd::resolve::ResolveArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("MODGRAPH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "modgraph=debug,info"
        } else {
            "modgraph=info,warn"
        })
    });

    let format = env::var("MODGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, timings: &mut Timings) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Graphs(args) => cmd::graphs::run_graphs(args, timings),
        Commands::Summary(args) => cmd::summary::run_summary(args, timings),
        Commands::Resolve(args) => cmd::resolve::run_resolve(args, timings),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let mut timings = Timings::new(cli.timing || timing::timing_enabled_from_env());
    let result = run(&cli, &mut timings);

    if timings.is_enabled() {
        eprintln!("timing report:");
        eprint!("{}", timings.display_table());
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = ?err, "command failed");
            // stderr is gone; nothing left to report to
            let _ = output::write_error(&mut io::stderr().lock(), &err);
            ExitCode::FAILURE
        }
    }
}
