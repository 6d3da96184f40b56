//! chartgen CLI - inflate helm charts into Kubernetes resources

use chartgen_core::LoadRestrictor;
use chartgen_helm::HelmConfig;
use clap::{Parser, Subcommand};
use console::style;
use miette::Diagnostic;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;

use error::CliError;

#[derive(Parser)]
#[command(name = "chartgen")]
#[command(author = "chartgen Contributors")]
#[command(version)]
#[command(about = "Inflate helm charts into Kubernetes resources", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the charts of a generator configuration
    Inflate {
        /// Generator configuration (a single chart or helmGlobals + helmCharts)
        config: PathBuf,

        /// Root that chart homes and values files are resolved against
        /// (defaults to the directory of the configuration)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Restrict file loads to the root (rootOnly) or not (none)
        #[arg(long, default_value_t = LoadRestrictor::RootOnly)]
        load_restrictor: LoadRestrictor,

        /// Allow running helm
        #[arg(long, env = "CHARTGEN_ENABLE_HELM")]
        enable_helm: bool,

        /// helm binary to run
        #[arg(long, env = "CHARTGEN_HELM_COMMAND", default_value = "helm")]
        helm_command: String,

        /// Output file (if not set, outputs to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that the helm binary is helm v3
    HelmVersion {
        /// helm binary to run
        #[arg(long, env = "CHARTGEN_HELM_COMMAND", default_value = "helm")]
        helm_command: String,
    },
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn report(err: &CliError) {
    eprintln!("{} {}", style("Error:").red().bold().for_stderr(), err);
    if let Some(help) = err.help() {
        eprintln!("  {} {}", style("help:").cyan().for_stderr(), help);
    }
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Commands::Inflate {
            config,
            root,
            load_restrictor,
            enable_helm,
            helm_command,
            output,
        } => commands::inflate::run(
            &config,
            root.as_deref(),
            load_restrictor,
            HelmConfig {
                enabled: enable_helm,
                command: helm_command,
            },
            output.as_deref(),
        ),

        Commands::HelmVersion { helm_command } => commands::helm_version::run(&helm_command),
    };

    if let Err(err) = result {
        report(&err);
        std::process::exit(err.exit_code());
    }
}
