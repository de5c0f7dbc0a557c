//! Tag vocabulary: the service's tag names resolved to IDs.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::paperless::{DocumentService, RemoteTag};

/// Lowercase tag name → tag ID, as known to the service at fetch time.
#[derive(Debug, Clone, Default)]
pub struct TagVocabulary {
    ids: HashMap<String, u64>,
}

impl TagVocabulary {
    pub fn from_tags(tags: impl IntoIterator<Item = RemoteTag>) -> Self {
        let ids = tags
            .into_iter()
            .map(|t| (t.name.to_lowercase(), t.id))
            .collect();
        Self { ids }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.ids.get(&name.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Fetch the vocabulary. Failures are logged and yield an empty vocabulary,
/// so uploads still go ahead with only numeric tags.
pub async fn fetch_vocabulary(service: &dyn DocumentService) -> TagVocabulary {
    match service.list_tags().await {
        Ok(tags) => {
            let vocabulary = TagVocabulary::from_tags(tags);
            debug!(count = vocabulary.len(), "Fetched tag vocabulary");
            vocabulary
        }
        Err(e) => {
            warn!(error = %e, "Failed to fetch tags; continuing without tag names");
            TagVocabulary::default()
        }
    }
}
