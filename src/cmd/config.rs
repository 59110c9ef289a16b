//! `sitegen config`: view, validate or create the configuration file.

use std::path::Path;

use anyhow::Result;
use sitegen::config::Settings;

use super::super::ConfigCommands;

fn presence(secret: &Option<String>) -> &'static str {
    if secret.is_some() { "set" } else { "not set" }
}

pub fn cmd_config(config_path: &Path, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("sitegen Configuration");
            println!("=====================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No sitegen.toml found at {}", config_path.display());
                println!("Using default configuration.");
            }
            println!();

            let settings = Settings::resolve(config_path)?;

            println!("[server]");
            println!("  host = \"{}\"", settings.server.host);
            println!("  port = {}", settings.server.port);
            println!("  dev_mode = {}", settings.server.dev_mode);
            if !settings.server.cors_origins.is_empty() {
                println!("  cors_origins = {:?}", settings.server.cors_origins);
            }
            println!();

            println!("[agent]");
            println!("  claude_cmd = \"{}\"", settings.agent.claude_cmd);
            println!("  model = \"{}\"", settings.agent.model);
            println!("  timeout_secs = {}", settings.agent.timeout_secs);
            println!();

            println!("[workflow]");
            println!("  output_dir = \"{}\"", settings.workflow.output_dir.display());
            println!(
                "  max_validation_attempts = {}",
                settings.workflow.max_validation_attempts
            );
            println!();

            println!("[github]");
            if let Some(username) = &settings.github.username {
                println!("  username = \"{}\"", username);
            }
            if let Some(email) = &settings.github.email {
                println!("  email = \"{}\"", email);
            }
            println!("  visibility = \"{}\"", settings.github.visibility);
            println!();

            if let Some(file) = &settings.logging.file {
                println!("[logging]");
                println!("  file = \"{}\"", file.display());
                println!();
            }

            println!("Credentials (environment):");
            let credentials = &settings.credentials;
            println!("  ANTHROPIC_API_KEY: {}", presence(&credentials.anthropic_api_key));
            println!("  GITHUB_TOKEN: {}", presence(&credentials.github_token));
            println!("  VERCEL_TOKEN: {}", presence(&credentials.vercel_token));
            println!();

            if !config_path.exists() {
                println!("Run 'sitegen config init' to create a sitegen.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No sitegen.toml found. Using defaults.");
            }

            let settings = Settings::resolve(config_path)?;
            let warnings = settings.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("sitegen.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if let Some(parent) = config_path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                std::fs::create_dir_all(parent)?;
            }

            Settings::default().save(config_path)?;

            println!("Created sitegen.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [server] host, port, dev_mode, cors_origins");
            println!("  - [agent] claude_cmd, model, timeout_secs");
            println!("  - [workflow] output_dir, max_validation_attempts");
            println!("  - [github] username, email, visibility");
            println!();
            println!("Credentials are read from ANTHROPIC_API_KEY, GITHUB_TOKEN and VERCEL_TOKEN.");
            println!();
        }
    }

    Ok(())
}
