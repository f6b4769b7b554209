//! `dex` command-line entry point

use clap::Parser;
use dex::logging::init_tracing;
use dex::runner::{report_error, run_file, run_source, watch_file};
use dex::{repl, Interpreter, InterpreterConfig, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "dex")]
#[command(version)]
#[command(about = "Run Dex scripts or start an interactive session", long_about = None)]
struct Cli {
    /// Script to run; starts the REPL when omitted
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Evaluate SOURCE and print its final value
    #[arg(short, long, value_name = "SOURCE", conflicts_with = "file")]
    eval: Option<String>,

    /// Re-run FILE every time it changes
    #[arg(short, long, requires = "file")]
    watch: bool,

    /// Log debug diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Maximum nesting of function calls before StackOverflow
    #[arg(long, value_name = "N")]
    max_call_depth: Option<usize>,
}

impl Cli {
    fn config(&self) -> InterpreterConfig {
        let config = InterpreterConfig::from_env();
        match self.max_call_depth {
            Some(depth) => config.with_max_call_depth(depth),
            None => config,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config();
    debug!(max_call_depth = config.max_call_depth, "starting dex");

    match run(&cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: InterpreterConfig) -> anyhow::Result<()> {
    if let Some(source) = &cli.eval {
        let mut interpreter = Interpreter::with_config(config)?;
        let value = run_source(&mut interpreter, source)?;
        if !matches!(value, Value::Null) {
            println!("{}", value.to_colored_string());
        }
        return Ok(());
    }

    match &cli.file {
        Some(path) if cli.watch => {
            let mut interpreter = Interpreter::with_config(config)?;
            watch_file(&mut interpreter, path)
        }
        Some(path) => {
            let mut interpreter = Interpreter::with_config(config)?;
            run_file(&mut interpreter, path)?;
            Ok(())
        }
        None => repl::start(config),
    }
}
