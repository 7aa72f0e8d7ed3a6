//! # makecourse CLI
//!
//! Command-line interface for the makecourse build engine.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use makecourse_core::{BuildOptions, BuildReport, Config, CourseBuilder};
use makecourse_recipes::registry_from_config;
use makecourse_render::{PandocConverter, TemplateRenderer};

#[derive(Parser)]
#[command(name = "makecourse")]
#[command(author, version, about = "Build course documents from an XML description", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "makecourse.yml")]
    config: PathBuf,

    /// Logging verbosity (0 = warnings, 1 = progress, 2 = debug)
    #[arg(short, long, default_value_t = 0)]
    verbosity: u8,

    /// Shorthand for --verbosity 2
    #[arg(long)]
    verbose: bool,

    /// Keep staging directories under debug/ for inspection
    #[arg(short, long)]
    debug: bool,

    /// Rebuild selected units even when nothing changed
    #[arg(short, long)]
    force: bool,

    /// Single typesetting pass, skip secondary document variants
    #[arg(short, long)]
    quick: bool,

    /// Unit names or types to build (default: all)
    targets: Vec<String>,
}

fn init_tracing(cli: &Cli) {
    let verbosity = if cli.verbose { 2 } else { cli.verbosity };
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run(cli: &Cli) -> anyhow::Result<BuildReport> {
    let config = Config::from_file(&cli.config)
        .with_context(|| format!("cannot load {}", cli.config.display()))?;
    let registry = registry_from_config(&config)?;

    let renderer = TemplateRenderer::new();
    let converter = PandocConverter::new();
    let builder = CourseBuilder::new(&config, &registry, &renderer, &converter);

    let opts = BuildOptions {
        force: cli.force,
        quick: cli.quick,
        debug: cli.debug,
    };
    Ok(builder.run(&cli.targets, &opts)?)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let report = match run(&cli) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "{} built, {} up to date",
        report.built.len(),
        report.skipped.len()
    );
    if report.success() {
        ExitCode::SUCCESS
    } else {
        for (unit, error) in &report.failed {
            eprintln!("failed: {unit}: {error}");
        }
        ExitCode::FAILURE
    }
}
