//! junit2html: JUnit XML to self-contained HTML report CLI

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use junit2html::builder::ReportBuilder;
use junit2html::config::{
    build_ignore_set, load_config, write_starter, CliOverrides, CONFIG_FILENAME,
};
use junit2html::loader::{expand_inputs, load_inputs, LoadError};
use junit2html::output::write_atomic;
use junit2html::parser::JunitXmlParser;
use junit2html::reporter::{ConsoleReporter, HtmlReporter, JsonReporter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Merge JUnit XML results into a single self-contained HTML report
#[derive(Parser, Debug)]
#[command(name = "junit2html")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JUnit XML files, directories, or glob patterns
    #[arg(value_name = "INPUTS")]
    inputs: Vec<String>,

    /// Output HTML file (default: junit-report.html)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Report title (default: "JUnit Report")
    #[arg(long)]
    title: Option<String>,

    /// Abort on the first unreadable or malformed input
    #[arg(long)]
    strict: bool,

    /// Exit 1 when the report contains failed or errored tests
    #[arg(long)]
    fail_on_failures: bool,

    /// Print a JSON summary to stdout instead of the console summary
    #[arg(long, short)]
    json: bool,

    /// Quiet mode (no summary, no warnings)
    #[arg(long, short)]
    quiet: bool,

    /// Verbose output: list failing tests and enable debug diagnostics
    #[arg(long, short, conflicts_with = "quiet")]
    verbose: bool,

    /// Path to config file (default: search .junit2htmlrc.json in current dir and parents)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create .junit2htmlrc.json with sensible defaults
    Init {
        /// Directory in which to create config (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

/// Diagnostics go to stderr; RUST_LOG wins over the verbosity flag
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Some(Commands::Init { dir, force }) = args.command {
        return run_init(dir.as_deref(), force);
    }

    if args.inputs.is_empty() {
        anyhow::bail!("No input files given (try `junit2html --help`)");
    }

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let config = load_config(&cwd, args.config.as_deref())?;
    let options = config.merge_with_cli(CliOverrides {
        title: args.title.clone(),
        output: args.output.clone(),
        strict: args.strict,
        fail_on_failures: args.fail_on_failures,
    });
    debug!(?options, "resolved options");

    let ignore_set = if options.ignore.is_empty() {
        None
    } else {
        Some(build_ignore_set(&options.ignore)?)
    };
    let (paths, expansion_failures) = expand_inputs(&args.inputs, ignore_set.as_ref());

    let parser = JunitXmlParser::new();
    let outcome = match load_inputs(&paths, expansion_failures, &parser, options.policy) {
        Ok(outcome) => outcome,
        Err(LoadError::NothingLoaded { failures, .. }) => {
            for failure in &failures {
                eprintln!("{}: {}", "Error".red(), failure);
            }
            eprintln!("{}: No input could be loaded", "Error".red().bold());
            return Ok(ExitCode::from(2));
        }
        Err(e) => return Err(e.into()),
    };

    if !args.quiet {
        for failure in &outcome.failures {
            eprintln!("{}: Skipped {}", "Warning".yellow(), failure);
        }
    }

    let mut builder = ReportBuilder::new()
        .title(options.title.clone())
        .generated_at(Utc::now());
    for file in outcome.files {
        builder.add_file(file);
    }
    let report = builder.build();

    if report.is_empty() && !args.quiet {
        eprintln!("{}: No test cases found in the inputs", "Warning".yellow());
    }

    let html = HtmlReporter::new()
        .report(&report)
        .context("Failed to encode report data")?;
    write_atomic(&options.output, &html)
        .with_context(|| format!("Failed to write report to {}", options.output.display()))?;

    if args.json {
        println!(
            "{}",
            JsonReporter::new()
                .pretty()
                .report(&report, &options.output, &outcome.failures)
        );
    } else if !args.quiet {
        let mut console = ConsoleReporter::new();
        if args.verbose {
            console = console.verbose();
        }
        console.report(&report, &options.output);
    }

    if options.fail_on_failures && report.counts().has_problems() {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_init(dir: Option<&Path>, force: bool) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let dir = dir.unwrap_or(&cwd);

    match write_starter(dir, force)? {
        Some(path) => {
            println!("{}: Created {}", "Done".green().bold(), path.display());
        }
        None => {
            eprintln!(
                "{}: {} already exists; use --force to overwrite",
                "Warning".yellow(),
                dir.join(CONFIG_FILENAME).display()
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}
