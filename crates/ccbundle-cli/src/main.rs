//! ccbundle CLI - Command-line interface for ccbundle
//!
//! Provides `ccbundle scan` and `ccbundle plan`.

use anyhow::{Context, Result};
use ccbundle_core::{EnvRefRedactor, ExistingConfig, WizardConfig, WizardSession};
use ccbundle_scanner::output::{self, Format};
use ccbundle_scanner::Scanner;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "ccbundle")]
#[command(about = "ccbundle - build shareable Claude Code configuration bundles")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan Claude Code configuration
    Scan {
        /// Home directory to scan (defaults to the current user's)
        #[arg(long, value_name = "DIR")]
        home: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Build a bundle selection without the interactive wizard
    Plan {
        /// Home directory to scan (defaults to the current user's)
        #[arg(long, value_name = "DIR")]
        home: Option<PathBuf>,

        /// Wizard config file (defaults to <config dir>/ccbundle/config.toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Previously written bundle to edit
        #[arg(short, long, value_name = "FILE")]
        existing: Option<PathBuf>,

        /// Add an empty profile (repeatable)
        #[arg(short, long = "profile", value_name = "NAME")]
        profiles: Vec<String>,

        /// Skip the background discovery crawls
        #[arg(long)]
        no_discovery: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Json,
    Markdown,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Scan { home, format } => run_scan(home, format),
        Commands::Plan {
            home,
            config,
            existing,
            profiles,
            no_discovery,
        } => run_plan(home, config.as_deref(), existing.as_deref(), &profiles, no_discovery),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Log to stderr so stdout stays machine-readable
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn scanner(home: Option<PathBuf>) -> Result<Scanner> {
    match home {
        Some(home) => Ok(Scanner::new(home)),
        None => Scanner::for_current_user().context("Could not determine home directory"),
    }
}

fn run_scan(home: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let inventory = scanner(home)?.scan().context("Scan failed")?;
    let format = match format {
        OutputFormat::Json => Format::Json,
        OutputFormat::Markdown => Format::Markdown,
    };
    print!("{}", output::render(&inventory, format)?);
    Ok(())
}

fn run_plan(
    home: Option<PathBuf>,
    config: Option<&Path>,
    existing: Option<&Path>,
    profiles: &[String],
    no_discovery: bool,
) -> Result<()> {
    let config = WizardConfig::load(config).context("Failed to load config")?;
    let existing = existing
        .map(|path| {
            ExistingConfig::from_json_file(path)
                .with_context(|| format!("Failed to read existing bundle {}", path.display()))
        })
        .transpose()?;
    let inventory = scanner(home)?.scan().context("Scan failed")?;

    let mut session = WizardSession::new(&inventory, existing.as_ref(), &config);
    for name in profiles {
        if !session.create_profile(name) {
            tracing::warn!(profile = %name, "Profile already exists, keeping it");
        }
    }

    if !no_discovery {
        let started = session.start_all_discovery();
        let merged = session.wait_for_discovery();
        tracing::info!(started, merged, "Discovery finished");
    }

    let output = serde_json::json!({
        "options": session.build_options(),
        "profiles": session.profile_definitions(&EnvRefRedactor),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
