//! Email-specific types: the parsed inbound message and its attachments.

use mail_parser::{MessageParser, MimeHeaders};

use crate::error::MailError;

/// How an attachment was presented in the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Attachment => "attachment",
        }
    }
}

/// A decoded MIME part that is not part of the message body.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: Option<String>,
    /// Lowercase `type/subtype`.
    pub mime_type: String,
    pub disposition: Disposition,
    pub content: Vec<u8>,
}

/// One inbound email, as handed to the pipeline.
#[derive(Debug, Clone)]
pub struct InboundEmail {
    pub subject: Option<String>,
    /// Envelope recipient; carries the plus-address tags.
    pub recipient: String,
    pub attachments: Vec<Attachment>,
    /// The message exactly as received, for verbatim forwarding.
    pub raw: Vec<u8>,
}

impl InboundEmail {
    /// Parse a raw RFC 5322 message.
    ///
    /// `recipient` is the envelope recipient. When it is not known the first
    /// `To:` address of the message is used instead.
    pub fn parse(raw: Vec<u8>, recipient: Option<&str>) -> Result<Self, MailError> {
        let (subject, recipient, attachments) = {
            let parsed = MessageParser::default()
                .parse(raw.as_slice())
                .ok_or(MailError::Unparseable)?;

            let recipient = match recipient.map(str::trim).filter(|r| !r.is_empty()) {
                Some(r) => r.to_string(),
                None => extract_addresses(parsed.to())
                    .into_iter()
                    .next()
                    .ok_or(MailError::MissingRecipient)?,
            };

            let attachments: Vec<Attachment> =
                parsed.attachments().map(attachment_from_part).collect();
            (parsed.subject().map(str::to_string), recipient, attachments)
        };

        Ok(Self {
            subject,
            recipient,
            attachments,
            raw,
        })
    }
}

fn attachment_from_part(part: &mail_parser::MessagePart<'_>) -> Attachment {
    let mime_type = part
        .content_type()
        .map(|ct: &mail_parser::ContentType| match ct.subtype() {
            Some(sub) => format!("{}/{}", ct.ctype(), sub),
            None => ct.ctype().to_string(),
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
        .to_lowercase();

    // Without an explicit header, a part referenced by Content-ID is inline,
    // so a headerless image carrying a Content-ID is later skipped as an
    // embedded resource rather than uploaded.
    let disposition = match part.content_disposition() {
        Some(d) if d.ctype().eq_ignore_ascii_case("inline") => Disposition::Inline,
        Some(_) => Disposition::Attachment,
        None if part.content_id().is_some() => Disposition::Inline,
        None => Disposition::Attachment,
    };

    Attachment {
        filename: part.attachment_name().map(str::to_string),
        mime_type,
        disposition,
        content: part.contents().to_vec(),
    }
}

/// Extract email addresses from an optional mail_parser Address field.
///
/// Returns an empty vec if the address is None.
pub fn extract_addresses(addr: Option<&mail_parser::Address>) -> Vec<String> {
    let Some(addr) = addr else {
        return Vec::new();
    };
    match addr {
        mail_parser::Address::List(addrs) => addrs
            .iter()
            .filter_map(|a| a.address.as_ref().map(|s| s.to_string()))
            .collect(),
        mail_parser::Address::Group(groups) => groups
            .iter()
            .flat_map(|g| {
                g.addresses
                    .iter()
                    .filter_map(|a| a.address.as_ref().map(|s| s.to_string()))
            })
            .collect(),
    }
}
