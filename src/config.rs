//! Configuration types, built from environment variables.

use std::collections::HashMap;

use secrecy::SecretString;
use tracing::warn;

use crate::error::ConfigError;

/// Connection settings for the Paperless API.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// API base URL, e.g. `https://paperless.example.com/api` (no trailing slash).
    pub base_url: String,
    /// Paperless API token, sent as `Authorization: Token <token>`.
    pub token: SecretString,
    /// Access-proxy client ID (`CF-Access-Client-Id`), if the API sits behind one.
    pub access_client_id: Option<String>,
    /// Access-proxy client secret (`CF-Access-Client-Secret`).
    pub access_client_secret: Option<SecretString>,
}

/// Rules that decide which attachments are uploaded and how they are tagged.
#[derive(Debug, Clone, Default)]
pub struct TaggingConfig {
    /// Tag ID applied to every document.
    pub forced_tag: Option<u64>,
    /// Tag ID applied only when the subject carries no hashtags.
    pub default_tag: Option<u64>,
    /// MIME types that are never uploaded.
    pub ignored_mime_types: Vec<String>,
    /// Plus-address tag name (lowercase) → permission group ID.
    pub tag_groups: HashMap<String, u64>,
    /// User granted view/change alongside the groups.
    pub permission_user: Option<u64>,
}

/// Submission port used when `SMTP_PORT` is unset.
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Port on which the relay expects TLS from the first byte (SMTPS).
pub const SMTPS_PORT: u16 = 465;

/// How the relay connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// TLS handshake immediately after connecting.
    Implicit,
    /// Plaintext greeting, then a mandatory STARTTLS upgrade.
    StartTls,
}

impl SmtpSecurity {
    /// Port 465 speaks implicit TLS; every other port gets STARTTLS.
    pub fn for_port(port: u16) -> Self {
        if port == SMTPS_PORT {
            Self::Implicit
        } else {
            Self::StartTls
        }
    }
}

/// SMTP relay used to forward messages that failed to upload.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl SmtpConfig {
    pub fn security(&self) -> SmtpSecurity {
        SmtpSecurity::for_port(self.port)
    }
}

/// Complete configuration for one intake run.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub service: ServiceConfig,
    pub tagging: TaggingConfig,
    pub smtp: SmtpConfig,
    /// Mailbox that receives the original message when an upload fails.
    pub fallback_mailbox: String,
}

impl IntakeConfig {
    /// Build config from environment variables.
    ///
    /// Fails only when a required variable is missing. Malformed optional
    /// values are logged and treated as unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = required("PAPERLESS_API_BASE")?
            .trim_end_matches('/')
            .to_string();
        let token = SecretString::from(required("PAPERLESS_TOKEN")?);

        let service = ServiceConfig {
            base_url,
            token,
            access_client_id: optional("CF_ACCESS_CLIENT_ID"),
            access_client_secret: optional("CF_ACCESS_CLIENT_SECRET").map(SecretString::from),
        };

        let tagging = TaggingConfig {
            forced_tag: parse_tag_id(
                "PAPERLESS_FORCED_TAG",
                optional("PAPERLESS_FORCED_TAG").as_deref(),
            ),
            default_tag: parse_tag_id(
                "PAPERLESS_DEFAULT_TAG",
                optional("PAPERLESS_DEFAULT_TAG").as_deref(),
            ),
            ignored_mime_types: parse_mime_list(&optional("IGNORED_MIME_TYPES").unwrap_or_default()),
            tag_groups: parse_tag_groups(&optional("INTAKE_TAG_GROUPS").unwrap_or_default()),
            permission_user: parse_tag_id(
                "INTAKE_PERMISSION_USER",
                optional("INTAKE_PERMISSION_USER").as_deref(),
            ),
        };

        let username = optional("SMTP_USERNAME").unwrap_or_default();
        let smtp = SmtpConfig {
            host: required("SMTP_HOST")?,
            port: optional("SMTP_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            password: SecretString::from(optional("SMTP_PASSWORD").unwrap_or_default()),
            from_address: optional("SMTP_FROM_ADDRESS").unwrap_or_else(|| username.clone()),
            username,
        };

        Ok(Self {
            service,
            tagging,
            smtp,
            fallback_mailbox: required("POSTMASTER_EMAIL")?,
        })
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Read a variable, treating empty or whitespace-only values as unset.
fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse a numeric ID. Non-numeric input is logged and treated as unset.
pub fn parse_tag_id(key: &str, raw: Option<&str>) -> Option<u64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(key, value = raw, error = %e, "Ignoring non-numeric ID");
            None
        }
    }
}

/// Split a comma-separated MIME type list, trimming entries and dropping empties.
pub fn parse_mime_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse `name:group,name:group` into a lowercase tag → group map.
///
/// Malformed entries are logged and skipped.
pub fn parse_tag_groups(raw: &str) -> HashMap<String, u64> {
    let mut groups = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let parsed = entry
            .split_once(':')
            .map(|(name, id)| (name.trim().to_lowercase(), id.trim().parse::<u64>()));
        match parsed {
            Some((name, Ok(id))) if !name.is_empty() => {
                groups.insert(name, id);
            }
            _ => warn!(entry, "Ignoring malformed INTAKE_TAG_GROUPS entry"),
        }
    }
    groups
}
