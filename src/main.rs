#![deny(clippy::mod_module_files)]
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use git_sim::{Challenge, Session, SimulatorConfig};

mod terminal;

/// Practice Git in a simulated terminal.
#[derive(Parser, Debug)]
#[command(name = "git-sim", version, about)]
struct Args {
    /// Config file to use instead of ~/.config/git-sim/config.yaml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Challenge to attempt (YAML, or JSON by extension)
    #[arg(long, value_name = "PATH")]
    challenge: Option<PathBuf>,

    /// Reject commands with repeated spaces
    #[arg(long)]
    strict: bool,

    /// Print each result as a JSON line
    #[arg(long)]
    json: bool,

    /// Write the successful commands here on exit
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config.clone() {
        Some(path) => path,
        None => SimulatorConfig::config_file_path()?,
    };
    let mut config = SimulatorConfig::load_from(Some(&config_path))?;
    if args.strict {
        config.strict_whitespace = true;
    }

    if args.init_config {
        config.save(&config_path)?;
        eprintln!("git-sim: wrote configuration to {:?}", config_path);
        return Ok(());
    }

    let session = match &args.challenge {
        Some(path) => {
            let challenge = Challenge::load(path)
                .with_context(|| format!("Failed to load challenge {:?}", path))?;
            Session::with_challenge(challenge, config)
        }
        None => Session::new(config),
    };

    let options = terminal::Options {
        json: args.json,
        export: args.export.or_else(|| session.config().export_path()),
    };

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    terminal::run(session, stdin, tokio::io::stdout(), options).await
}
