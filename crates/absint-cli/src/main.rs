use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use absint_check::{analyze, AnalysisReport, SolverConfig};
use absint_core::diagnostic::{
    analysis_error_diagnostic, parse_error_diagnostic, violated_postcondition_diagnostic,
};
use absint_core::{parse_program, Program};

/// Output format for analysis results
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Human,
    /// Structured JSON output for automation
    Json,
}

#[derive(Parser)]
#[command(
    name = "absint",
    version,
    about = "Interval abstract interpreter for a toy imperative language"
)]
struct Cli {
    /// Source file to analyze (use `-` for stdin)
    file: PathBuf,

    /// Dump the parsed program and exit
    #[arg(long)]
    dump_ast: bool,

    /// Maximum solver iterations before giving up
    #[arg(long, default_value_t = 1000)]
    max_iterations: usize,

    /// Number of iterations before widening kicks in at loop heads
    #[arg(long, default_value_t = 3)]
    widen_delay: usize,

    /// Disable the narrowing pass after the widened fixpoint
    #[arg(long)]
    no_narrowing: bool,

    /// Output format: human (default) or json
    #[arg(long, value_enum, default_value = "human")]
    output: OutputFormat,

    /// Verbose logging (per-iteration location dumps)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let source = read_source(&cli.file)?;
    let file_path = cli.file.display().to_string();
    let program = parse_or_report(&file_path, &source)?;

    if cli.dump_ast {
        println!("{program:#?}");
        return Ok(());
    }

    let config = SolverConfig {
        max_iterations: cli.max_iterations,
        widen_delay: cli.widen_delay,
        use_narrowing: !cli.no_narrowing,
    };

    let report = match analyze(&program, config) {
        Ok(report) => report,
        Err(err) => {
            analysis_error_diagnostic(&err.to_string(), err.span()).eprint(&file_path, &source);
            bail!("analysis failed");
        }
    };

    match cli.output {
        OutputFormat::Human => print_human(&report, &file_path, &source),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    // Violated postconditions are verdicts, not failures: the analysis ran
    // to completion, so the exit code stays 0
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_source(file: &Path) -> Result<String> {
    if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("read {}", file.display()))
    }
}

fn parse_or_report(file_path: &str, source: &str) -> Result<Program> {
    match parse_program(source) {
        Ok(program) => Ok(program),
        Err(errors) => {
            for err in &errors {
                parse_error_diagnostic(&err.message, err.span).eprint(file_path, source);
            }
            bail!("parse failed with {} error(s)", errors.len());
        }
    }
}

fn print_human(report: &AnalysisReport, file_path: &str, source: &str) {
    for verdict in &report.verdicts {
        if verdict.satisfied {
            println!("postcondition satisfied: {}", verdict.condition);
        } else {
            violated_postcondition_diagnostic(&verdict.condition, verdict.span)
                .eprint(file_path, source);
        }
    }

    let violated = report.verdicts.iter().filter(|v| !v.satisfied).count();
    println!(
        "analysis completed: {} iteration(s), {} postcondition(s), {} violated, {} warning(s)",
        report.iterations,
        report.verdicts.len(),
        violated,
        report.warnings.len()
    );
    if !report.converged {
        eprintln!("warning: iteration budget exhausted before reaching a fixpoint; results may be incomplete");
    }
}
