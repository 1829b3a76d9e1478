//! tokenfed CLI
//!
//! Command-line interface for issuing and caching access tokens.
//!
//! # Usage
//!
//! ```bash
//! # Store the client pair (once per machine)
//! tokenfed setup --id my-client --secret s3cr3t
//!
//! # Print a valid token for a scope
//! tokenfed token execution
//!
//! # Vault-sourced or GitHub tokens
//! tokenfed configure vault --url https://vault.example.com --role ci
//! tokenfed token read --alias hashicorp-vault --format json
//! ```

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokenfed_cli::config::{load_config, load_config_from_path};
use tokenfed_cli::output::{hint, render_status, render_token, OutputFormat, TokenOutput};
use tokenfed_core::{FederationContext, FederationError, ProviderAlias, Scope};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "tokenfed")]
#[command(about = "Credential and token federation for StackSpot, Vault and GitHub")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file (defaults to the platform config dir)
    #[arg(long, global = true, env = "TOKENFED_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the client ID and secret
    Setup {
        /// Client ID
        #[arg(long)]
        id: String,

        /// Client secret
        #[arg(long)]
        secret: String,
    },

    /// Configure a token provider
    Configure {
        #[command(subcommand)]
        provider: ConfigureProvider,
    },

    /// Print a valid token for a scope
    Token {
        /// Scope (execution, creation, read, write)
        scope: Scope,

        /// Provider alias (stackspot-api, hashicorp-vault, github)
        #[arg(short, long, default_value = ProviderAlias::STACKSPOT)]
        alias: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Drop cached tokens
    #[command(group(ArgGroup::new("target").required(true).args(["scope", "all"])))]
    Invalidate {
        /// Scope to invalidate
        scope: Option<Scope>,

        /// Invalidate every scope
        #[arg(long)]
        all: bool,
    },

    /// Show what is configured and cached
    Status,

    /// Remove stored credentials, provider settings and cached tokens
    Logout,
}

#[derive(Subcommand)]
enum ConfigureProvider {
    /// Vault address and role used to fetch the client pair
    Vault {
        #[arg(long)]
        url: String,

        #[arg(long)]
        role: String,

        /// KV path holding client_id and client_secret
        #[arg(long)]
        path: Option<String>,
    },

    /// GitHub personal access token (validated before saving)
    Github {
        #[arg(long)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(advice) = e.downcast_ref::<FederationError>().and_then(|f| hint(f.kind())) {
                eprintln!("Hint: {}", advice);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // Tokens go to stdout; keep logs off it.
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let loaded = match &cli.config {
        Some(path) => load_config_from_path(path)?,
        None => load_config()?,
    };
    tracing::debug!(path = ?loaded.path, from_file = loaded.from_file, "Configuration resolved");

    let context = FederationContext::from_config(loaded.config)?;
    let service = context.service();

    match cli.command {
        Commands::Setup { id, secret } => {
            service.setup_credentials(&id, &secret).await?;
            println!("Credentials stored ({} backend)", context.store().backend_name());
        }
        Commands::Configure { provider } => match provider {
            ConfigureProvider::Vault { url, role, path } => {
                service.configure_vault(&url, &role, path.as_deref()).await?;
                println!("Vault settings stored");
            }
            ConfigureProvider::Github { token } => {
                service.configure_static_token(&token).await?;
                println!("GitHub token validated and stored");
            }
        },
        Commands::Token {
            scope,
            alias,
            format,
        } => {
            let alias = ProviderAlias::new(alias);
            let token = if &alias == service.alias() {
                service.get_valid_token(scope).await?
            } else {
                service.get_provider_token(scope, &alias).await?
            };

            let rendered = render_token(
                &TokenOutput {
                    scope,
                    alias: &alias,
                    token: token.expose(),
                },
                format,
            )
            .context("Failed to render token")?;
            println!("{}", rendered);
        }
        Commands::Invalidate { scope, all } => {
            if all {
                service.invalidate_all_tokens().await?;
                println!("All tokens invalidated");
            } else if let Some(scope) = scope {
                service.invalidate_token(scope).await?;
                println!("Token for scope '{}' invalidated", scope);
            }
        }
        Commands::Status => {
            let status = service.status().await?;
            print!("{}", render_status(&status));
        }
        Commands::Logout => {
            service.teardown().await?;
            println!("Logged out");
        }
    }

    Ok(())
}
