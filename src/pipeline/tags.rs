//! Tag extraction from email metadata.
//!
//! Two sources, both pure string parsing:
//! - recipient plus-addressing: `docs+nunc+tax@example.com` → `["nunc", "tax"]`
//! - subject hashtags: `"Invoice #finance"` → `["finance"]`, title `"Invoice"`

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("hashtag pattern is valid"));

/// Tags parsed out of a subject line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectTags {
    /// Lowercased hashtag names in order of appearance, duplicates kept.
    pub tags: Vec<String>,
    /// The subject with every hashtag removed, trimmed.
    pub cleaned_subject: String,
}

/// Extract plus-address tags from a recipient address.
///
/// Only the local part is considered; everything after its first `+` is split
/// on `+`, lowercased, and empty segments are dropped.
pub fn recipient_tags(address: &str) -> Vec<String> {
    let local = address.split('@').next().unwrap_or_default();
    let Some((_, suffix)) = local.split_once('+') else {
        return Vec::new();
    };
    suffix
        .split('+')
        .map(str::to_lowercase)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Map plus-address tags to permission groups, preserving order.
///
/// Tags without a configured group are skipped.
pub fn group_ids(tags: &[String], tag_groups: &HashMap<String, u64>) -> Vec<u64> {
    tags.iter()
        .filter_map(|t| tag_groups.get(t).copied())
        .collect()
}

/// Extract hashtags and the cleaned title from an optional subject.
pub fn subject_tags(subject: Option<&str>) -> SubjectTags {
    let Some(subject) = subject else {
        return SubjectTags::default();
    };

    let tags = HASHTAG
        .captures_iter(subject)
        .map(|c| c[1].to_lowercase())
        .collect();
    let cleaned_subject = HASHTAG.replace_all(subject, "").trim().to_string();

    SubjectTags {
        tags,
        cleaned_subject,
    }
}
