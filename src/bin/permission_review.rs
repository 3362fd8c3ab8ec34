//! # Permission Review
//!
//! Emails reviewers when the permissions they own are due for review.
//!
//! Usage: `permission-review [-c PATH] [-t [--to EMAIL]]`

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use log::{error, info};
use std::path::PathBuf;

use permission_review::core::Config;
use permission_review::features::notify::{send_test_email, SmtpTransport};
use permission_review::features::reminders::ReviewScheduler;
use permission_review::features::review::{ReviewConfig, ReviewState};

#[derive(Debug, Parser)]
#[command(name = "permission-review", version)]
#[command(about = "Schedule periodic permission reviews and send email notifications.")]
struct Cli {
    /// Path to the configuration file [default: permission_review_config.json]
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Send a test email using the configured settings. Will not schedule reviews.
    #[arg(short = 't', long = "test-email")]
    test_email: bool,

    /// Recipient of the test email (defaults to the sender address)
    #[arg(long = "to", value_name = "EMAIL", requires = "test_email")]
    to: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env file
    dotenv().ok();

    let mut settings = Config::from_env()?;
    if let Some(path) = cli.config {
        settings = settings.with_config_path(path);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&settings.log_level))
        .init();

    info!("Starting permission review...");

    let config = load_review_config(&settings)?;

    let transport = SmtpTransport::new(&config.smtp)
        .with_context(|| format!("Cannot use SMTP server {}:{}", config.smtp.server, config.smtp.port))?;

    if cli.test_email {
        let email = send_test_email(&transport, &config, cli.to.as_deref())
            .await
            .context("Failed to send test email")?;
        println!("Test email sent successfully to {}. Check your inbox.", email.to);
        return Ok(());
    }

    let state_path = settings.state_path();
    let state = ReviewState::load(&state_path)
        .with_context(|| format!("Cannot open review state at {}", state_path.display()))?;
    info!("Review state: {}", state.path().display());

    let mut scheduler = ReviewScheduler::new(config, state, Box::new(transport));
    scheduler.run(shutdown_signal()).await;

    info!("Permission review stopped");
    Ok(())
}

/// Load the review config and fold in credentials from the environment
fn load_review_config(settings: &Config) -> Result<ReviewConfig> {
    let mut config = ReviewConfig::load(&settings.config_path)?;
    config.apply_credentials(settings.smtp_username.clone(), settings.smtp_password.clone());
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
