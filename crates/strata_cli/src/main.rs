//! STRATA CLI
//!
//! Checks programs against the semantic laws and resolves plugin sets.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod render;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use config::SessionConfig;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use strata_core::Program;
use strata_law::{BuiltinLaw, LawChecker};
use strata_plugin::{PluginManifest, PluginRegistry};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "STRATA - semantic law checking and plugin resolution", long_about = None)]
struct Cli {
    /// Session config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a parsed program against the laws
    Check {
        /// Path to the program (JSON)
        program: PathBuf,
        /// Law to check; repeat for several (default: all built-ins)
        #[arg(short, long = "law")]
        laws: Vec<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List built-in laws
    Laws,
    /// Resolve plugins from a manifest
    Resolve {
        /// Path to the plugin manifest (JSON array)
        #[arg(short, long)]
        manifest: PathBuf,
        /// Plugin to request; repeat for several
        #[arg(short, long = "plugin")]
        plugins: Vec<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn init_tracing(verbose: u8, json: bool) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let session = SessionConfig::load_or_default(cli.config.as_deref())?;
    debug!(?session, "Loaded session config");

    match cli.command {
        Commands::Check {
            program,
            laws,
            format,
        } => check(&program, session.with_laws(laws), format),
        Commands::Laws => {
            for name in BuiltinLaw::names() {
                println!("{}", name);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Resolve {
            manifest,
            plugins,
            format,
        } => resolve(&manifest, session.with_plugins(plugins), format),
    }
}

fn check(path: &Path, session: SessionConfig, format: Format) -> Result<ExitCode> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading program {}", path.display()))?;
    let program =
        Program::from_json(&text).wrap_err_with(|| format!("decoding program {}", path.display()))?;
    info!(items = program.len(), "Checking program");

    let result = LawChecker::new().check_selected(&program, session.laws.as_deref());

    match format {
        Format::Text => print!("{}", render::law_result(&path.display().to_string(), &result)),
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    Ok(if result.valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn load_registry(path: &Path) -> Result<PluginRegistry> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading manifest {}", path.display()))?;
    let mut registry = PluginRegistry::new();
    for manifest in PluginManifest::parse_list(&text)? {
        registry.register(manifest.into_plugin()?)?;
    }
    info!(plugins = registry.len(), "Loaded plugin manifest");
    Ok(registry)
}

fn resolve(path: &Path, session: SessionConfig, format: Format) -> Result<ExitCode> {
    let registry = load_registry(path)?;
    let latent = registry.conflicts();
    let resolution = registry.resolve(&session.plugins);

    match format {
        Format::Text => print!("{}", render::resolution(&latent, &resolution)),
        Format::Json => {
            let out = serde_json::json!({
                "registry_conflicts": latent,
                "resolution": resolution.report(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    let denied = (session.deny_conflicts && resolution.has_conflicts())
        || (session.deny_cycles && !resolution.cycles.is_empty())
        || (session.deny_missing && !resolution.missing.is_empty());
    Ok(if denied {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
