//! Email I/O: reading the inbound message and forwarding it on failure.
//!
//! Outbound goes through lettre's blocking SMTP transport, run on the
//! blocking pool so the upload loop is never stalled by the relay.

use std::path::Path;

use async_trait::async_trait;
use lettre::address::Envelope;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use tokio::io::AsyncReadExt;

use crate::config::{SmtpConfig, SmtpSecurity};
use crate::error::{ForwardError, MailError};

/// Delivers an unmodified message to another mailbox.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Forward `raw` verbatim to `to`.
    async fn forward(&self, raw: &[u8], to: &str) -> Result<(), ForwardError>;
}

/// Forwarder backed by an SMTP relay.
pub struct SmtpForwarder {
    config: SmtpConfig,
}

impl SmtpForwarder {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Forwarder for SmtpForwarder {
    async fn forward(&self, raw: &[u8], to: &str) -> Result<(), ForwardError> {
        let envelope = build_envelope(&self.config.from_address, to)?;
        let config = self.config.clone();
        let raw = raw.to_vec();

        tokio::task::spawn_blocking(move || send_raw(&config, &envelope, &raw))
            .await
            .map_err(|e| ForwardError::SendFailed(format!("SMTP task panicked: {e}")))??;

        tracing::info!("Forwarded original message to {to}");
        Ok(())
    }
}

/// Build the SMTP envelope for a verbatim forward.
pub fn build_envelope(from: &str, to: &str) -> Result<Envelope, ForwardError> {
    let sender = parse_address(from)?;
    let recipient = parse_address(to)?;
    Envelope::new(Some(sender), vec![recipient]).map_err(|e| ForwardError::InvalidAddress {
        address: to.to_string(),
        reason: e.to_string(),
    })
}

fn parse_address(address: &str) -> Result<Address, ForwardError> {
    address
        .trim()
        .parse()
        .map_err(|e: lettre::address::AddressError| ForwardError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

fn send_raw(config: &SmtpConfig, envelope: &Envelope, raw: &[u8]) -> Result<(), ForwardError> {
    let builder = match config.security() {
        SmtpSecurity::Implicit => SmtpTransport::relay(&config.host),
        SmtpSecurity::StartTls => SmtpTransport::starttls_relay(&config.host),
    };
    let mut builder = builder
        .map_err(|e| ForwardError::Relay(e.to_string()))?
        .port(config.port);

    if !config.username.is_empty() {
        builder = builder.credentials(Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        ));
    }

    builder
        .build()
        .send_raw(envelope, raw)
        .map_err(|e| ForwardError::SendFailed(e.to_string()))?;
    Ok(())
}

/// Read the raw message from a file, or from stdin when no path is given.
pub async fn read_raw_email(path: Option<&Path>) -> Result<Vec<u8>, MailError> {
    match path {
        Some(path) => Ok(tokio::fs::read(path).await?),
        None => {
            let mut raw = Vec::new();
            tokio::io::stdin().read_to_end(&mut raw).await?;
            Ok(raw)
        }
    }
}
