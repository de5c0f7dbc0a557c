//! Title and tag resolution for one attachment.
//!
//! Tag IDs are appended in a fixed order, duplicates allowed:
//! 1. forced tag
//! 2. plus-address tags
//! 3. subject hashtags, or the default tag when there are none
//!
//! Plus-address tags are always additive; hashtags and the default tag
//! are mutually exclusive.

use tracing::{debug, warn};

use crate::channels::{Attachment, InboundEmail};
use crate::config::TaggingConfig;
use crate::pipeline::tags::{group_ids, recipient_tags, subject_tags};
use crate::pipeline::vocabulary::TagVocabulary;

/// Title used when neither the subject nor the filename yields one.
pub const FALLBACK_TITLE: &str = "UNKNOWN";

/// What gets uploaded for one attachment, besides its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSubmission {
    /// Never empty.
    pub title: String,
    pub tag_ids: Vec<u64>,
    pub group_ids: Vec<u64>,
}

impl ResolvedSubmission {
    /// Tag IDs as the comma-joined form field, or `None` when there are none.
    pub fn tags_field(&self) -> Option<String> {
        if self.tag_ids.is_empty() {
            return None;
        }
        Some(
            self.tag_ids
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

/// Resolve title, tag IDs and group IDs for `attachment`.
pub fn resolve(
    attachment: &Attachment,
    email: &InboundEmail,
    vocabulary: &TagVocabulary,
    config: &TaggingConfig,
) -> ResolvedSubmission {
    let subject = subject_tags(email.subject.as_deref());
    let plus_tags = recipient_tags(&email.recipient);

    let title = resolve_title(&subject.cleaned_subject, attachment.filename.as_deref());

    let mut tag_ids = Vec::new();
    tag_ids.extend(config.forced_tag);

    for name in &plus_tags {
        match vocabulary.get(name) {
            Some(id) => {
                debug!(tag = %name, id, recipient = %email.recipient, "Applied plus-address tag");
                tag_ids.push(id);
            }
            None => warn!(tag = %name, "Plus-address tag not found in Paperless"),
        }
    }

    if subject.tags.is_empty() {
        tag_ids.extend(config.default_tag);
    } else {
        for name in &subject.tags {
            match vocabulary.get(name) {
                Some(id) => tag_ids.push(id),
                None => warn!(tag = %name, "Subject tag not found in Paperless"),
            }
        }
    }

    ResolvedSubmission {
        title,
        tag_ids,
        group_ids: group_ids(&plus_tags, &config.tag_groups),
    }
}

/// Cleaned subject, else filename, else [`FALLBACK_TITLE`].
pub fn resolve_title(cleaned_subject: &str, filename: Option<&str>) -> String {
    [Some(cleaned_subject), filename]
        .into_iter()
        .flatten()
        .find(|t| !t.is_empty())
        .unwrap_or(FALLBACK_TITLE)
        .to_string()
}
