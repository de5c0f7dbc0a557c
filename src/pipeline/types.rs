//! Per-invocation report types.

use serde::Serialize;

use crate::pipeline::filter::SkipReason;

/// What happened to one attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttachmentOutcome {
    /// Filtered out before upload.
    Skipped { reason: SkipReason },
    /// Accepted by the service.
    Submitted { status: u16 },
    /// Upload failed; `status` is `None` for transport errors.
    Failed { status: Option<u16>, forwarded: bool },
}

impl AttachmentOutcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped { .. } => "skipped",
            Self::Submitted { .. } => "submitted",
            Self::Failed { .. } => "failed",
        }
    }
}

/// One attachment's entry in the report.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentReport {
    /// Position in the original message.
    pub index: usize,
    pub filename: Option<String>,
    pub outcome: AttachmentOutcome,
}

/// Result of processing one inbound email.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntakeReport {
    /// Number of tag names known to the service at fetch time.
    pub vocabulary_size: usize,
    pub attachments: Vec<AttachmentReport>,
}

impl IntakeReport {
    fn count(&self, label: &str) -> usize {
        self.attachments
            .iter()
            .filter(|a| a.outcome.label() == label)
            .count()
    }

    pub fn submitted(&self) -> usize {
        self.count("submitted")
    }

    pub fn failed(&self) -> usize {
        self.count("failed")
    }

    pub fn skipped(&self) -> usize {
        self.count("skipped")
    }

    /// Number of verbatim forwards sent to the fallback mailbox.
    pub fn forwarded(&self) -> usize {
        self.attachments
            .iter()
            .filter(|a| matches!(a.outcome, AttachmentOutcome::Failed { forwarded: true, .. }))
            .count()
    }
}
