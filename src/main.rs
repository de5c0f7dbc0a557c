use std::path::PathBuf;

use anyhow::Context;

use paperless_intake::channels::{InboundEmail, SmtpForwarder, read_raw_email};
use paperless_intake::config::IntakeConfig;
use paperless_intake::error::Result;
use paperless_intake::paperless::{PaperlessClient, ServiceContext};
use paperless_intake::pipeline::{IntakeReport, process_email};

/// Usage: `paperless-intake [EMAIL_FILE|-] [RECIPIENT]`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().filter(|p| p != "-").map(PathBuf::from);
    let recipient = args
        .next()
        .or_else(|| std::env::var("INTAKE_RECIPIENT").ok());

    let report = run(path, recipient)
        .await
        .context("paperless-intake could not start")?;

    eprintln!(
        "paperless-intake: {} submitted, {} failed ({} forwarded), {} skipped",
        report.submitted(),
        report.failed(),
        report.forwarded(),
        report.skipped()
    );

    Ok(())
}

/// Load config, read the message, and push its attachments through the pipeline.
///
/// Only setup failures surface here; per-attachment failures live in the report.
async fn run(path: Option<PathBuf>, recipient: Option<String>) -> Result<IntakeReport> {
    let config = IntakeConfig::from_env()?;

    let raw = read_raw_email(path.as_deref()).await?;
    let email = InboundEmail::parse(raw, recipient.as_deref())?;

    let service = PaperlessClient::new(ServiceContext::from_config(&config.service)?);
    let forwarder = SmtpForwarder::new(config.smtp.clone());

    Ok(process_email(
        &email,
        &service,
        &forwarder,
        &config.tagging,
        &config.fallback_mailbox,
    )
    .await)
}
