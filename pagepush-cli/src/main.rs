//! pagepush CLI - publish static files to a git branch
//!
//! Copies a build output directory into a cached clone, commits it to the
//! publish branch (`gh-pages` by default) and pushes.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pagepush_core::{Config, TargetConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{CleanArgs, PublishArgs};

/// pagepush: publish a directory of static files to a git branch
#[derive(Parser, Debug)]
#[command(name = "pagepush")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./pagepush.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the git executable (overrides config and env)
    #[arg(long, global = true, env = "PAGEPUSH_GIT")]
    git: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Publish files to the publish branch
    #[command(visible_alias = "p")]
    Publish(PublishArgs),

    /// Remove cached clones
    Clean(CleanArgs),

    /// Show resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    if cli.verbose {
        tracing::debug!("Verbose mode enabled");
    }

    let cwd = std::env::current_dir()?;
    let config = Config::load(cli.config.as_deref(), &cwd)?.with_env_overrides();

    match cli.command {
        Some(Commands::Version) => {
            println!("pagepush {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Publish(args)) => {
            args.execute(&config, cli.git.clone(), &cwd).await?;
        }
        Some(Commands::Clean(args)) => {
            args.execute(&cwd).await?;
        }
        Some(Commands::Config) => {
            println!("pagepush Configuration");
            println!("======================");
            println!();

            let overrides = TargetConfig {
                git: cli.git.clone(),
                ..Default::default()
            };
            let names = config.target_names();
            if names.is_empty() {
                println!("No targets configured.");
            }
            for name in names {
                println!("Target: {}", name);
                match config.resolve(&name, &overrides, &cwd) {
                    Ok(options) => {
                        println!("  src:     {}", options.src.join(", "));
                        println!("  base:    {}", options.base.display());
                        println!("  clone:   {}", options.clone.display());
                        println!("  repo:    {}", options.repo.as_deref().unwrap_or("(origin of current repository)"));
                        println!("  remote:  {}", options.remote);
                        println!("  branch:  {}", options.branch);
                        println!("  mode:    {}", if options.add { "add" } else { "replace" });
                        println!("  push:    {}", options.push);
                        println!("  git:     {}", options.git);
                    }
                    Err(e) => println!("  (invalid: {})", e),
                }
                println!();
            }

            let project = cli
                .config
                .clone()
                .unwrap_or_else(|| PathBuf::from(pagepush_core::config::CONFIG_FILE));
            println!("Config file: {}", project.display());
            if cwd.join(&project).exists() {
                println!("  (exists)");
            } else {
                println!("  (not found - using defaults)");
            }
            if let Some(path) = Config::user_config_path() {
                println!("User config: {}", path.display());
            }
        }
        None => {
            println!("pagepush - publish static files to a git branch");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
