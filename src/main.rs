use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "sitegen")]
#[command(version, about = "Generate and deploy business websites with a coding agent")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file
    #[arg(long, global = true, default_value = sitegen::config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides [server].host)
        #[arg(long)]
        host: Option<String>,

        /// Port to serve on (overrides [server].port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable dev mode (permissive CORS)
        #[arg(long)]
        dev: bool,
    },
    /// Generate and deploy one site from a business JSON file
    Generate {
        /// Path to the business record (JSON)
        business: PathBuf,
    },
    /// Extract business fields from a free-text description
    Prefill {
        /// Description of the business
        description: String,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default sitegen.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Commands::Config { command } = &cli.command {
        return cmd::cmd_config(&cli.config, command.clone());
    }

    let settings = sitegen::config::Settings::resolve(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let _log_guard = sitegen::logging::init(cli.verbose, settings.logging.file.as_deref())?;

    match cli.command {
        Commands::Serve { host, port, dev } => {
            cmd::cmd_serve(settings, host, port, dev).await?;
        }
        Commands::Generate { business } => {
            cmd::cmd_generate(&settings, &business).await?;
        }
        Commands::Prefill { description } => {
            cmd::cmd_prefill(&settings, &description).await?;
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}
