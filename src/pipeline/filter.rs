//! Attachment eligibility.
//!
//! Evaluated in order:
//! 1. MIME type in the ignored set → skip
//! 2. Inline and not a document type → skip (inline PDFs/Word files still go through)
//! 3. Everything else is uploaded

use serde::Serialize;

use crate::channels::{Attachment, Disposition};

/// MIME types uploaded even when they arrive inline.
pub const DOCUMENT_MIME_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Why an attachment was not uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    IgnoredMimeType,
    InlineNonDocument,
}

impl SkipReason {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::IgnoredMimeType => "ignored MIME type",
            Self::InlineNonDocument => "inline non-document",
        }
    }
}

/// Return the reason to skip `attachment`, or `None` if it should be uploaded.
///
/// `ignored` entries are expected lowercase.
pub fn exclusion_reason(attachment: &Attachment, ignored: &[String]) -> Option<SkipReason> {
    let mime = attachment.mime_type.to_lowercase();

    if ignored.iter().any(|m| *m == mime) {
        return Some(SkipReason::IgnoredMimeType);
    }

    if attachment.disposition == Disposition::Inline && !DOCUMENT_MIME_TYPES.contains(&mime.as_str())
    {
        return Some(SkipReason::InlineNonDocument);
    }

    None
}
