use anyhow::Context;
use clap::Parser;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod evaluation;
mod models;
mod output;
mod report;
mod runner;
mod scenarios;
mod session;

use crate::config::Config;
use crate::evaluation::Evaluator;
use crate::output::{OutputFormat, Style};
use crate::runner::Runner;
use crate::session::Session;

/// Prompt Evaluator - score prompts for business-operations scenarios against a ten-element rubric
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Activity to start with (name or number from --list-scenarios)
    #[arg(short, long)]
    scenario: Option<String>,

    /// Evaluate the prompt in this file once instead of starting a session
    #[arg(short, long)]
    prompt_file: Option<PathBuf>,

    /// With --prompt-file, also write prompt_report.txt
    #[arg(short, long)]
    report: bool,

    /// List the available activities and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Output format: plain or json
    #[arg(short, long, default_value = "plain")]
    output: OutputFormat,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,

    /// Verbose output - log each request to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.list_scenarios {
        print!("{}", output::render_scenario_list(scenarios::default_scenario().name));
        return Ok(());
    }

    let config = Config::load(args.config.as_deref())?;
    let api_key = config.api_key()?;
    let evaluator = Evaluator::new(&config, api_key)?;

    let mut session = Session::new(evaluator);
    if let Some(scenario) = &args.scenario {
        session.select_scenario(scenario)?;
    }

    let style = Style {
        format: args.output,
        color: !args.no_color && io::stdout().is_terminal(),
    };

    match &args.prompt_file {
        Some(path) => {
            let prompt = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;
            let mut runner = Runner::new(session, io::empty(), io::stdout(), style, config.report_dir);
            runner.run_once(&prompt, args.report).await
        }
        None => {
            let mut runner = Runner::new(session, io::stdin().lock(), io::stdout(), style, config.report_dir);
            runner.run().await
        }
    }
}
