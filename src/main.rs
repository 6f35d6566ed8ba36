use anyhow::Result;
use clap::Parser;
use job_digest::cli::{handle_command, Cli, Command};
use job_digest::environment::EnvironmentConfig;
use job_digest::logging::{self, LogConfig};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<bool> {
    // A missing .env is fine; variables may come from the real environment.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    let environment = EnvironmentConfig::load(cli.config.clone())?;

    logging::init(&LogConfig {
        file: environment.log_path.clone(),
        console: !cli.quiet,
        ..Default::default()
    })?;

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => info!("No .env file found, using process environment"),
        Err(e) => return Err(e.into()),
    }
    info!(
        "Feeds: {}, profile: {}",
        environment.feeds_path.display(),
        environment.profile_path.display()
    );

    handle_command(cli.command.unwrap_or(Command::Run), environment).await
}
