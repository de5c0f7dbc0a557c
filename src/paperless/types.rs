//! Wire types for the Paperless REST API.

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// A tag as returned by `GET /tags/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteTag {
    pub id: u64,
    pub name: String,
}

/// Paginated tag listing. Only `results` is read.
#[derive(Debug, Clone, Deserialize)]
pub struct TagList {
    pub results: Vec<RemoteTag>,
}

/// Users and groups granted one permission level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grantees {
    pub users: Vec<u64>,
    pub groups: Vec<u64>,
}

/// The `set_permissions` field of a document upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPermissions {
    pub view: Grantees,
    pub change: Grantees,
}

impl SetPermissions {
    /// Grant view and change to the same users and groups.
    pub fn view_and_change(users: Vec<u64>, groups: Vec<u64>) -> Self {
        let grantees = Grantees { users, groups };
        Self {
            view: grantees.clone(),
            change: grantees,
        }
    }
}

/// Everything sent to `POST /documents/post_document/` for one attachment.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub filename: Option<String>,
    pub content: Vec<u8>,
    pub title: String,
    /// Comma-joined tag IDs; `None` omits the field.
    pub tags: Option<String>,
    pub permissions: Option<SetPermissions>,
}

impl DocumentUpload {
    /// Encode as a multipart form.
    pub fn into_form(self) -> Result<Form, ServiceError> {
        let mut document = Part::bytes(self.content);
        if let Some(name) = self.filename {
            document = document.file_name(name);
        }

        let mut form = Form::new()
            .part("document", document)
            .text("title", self.title);

        if let Some(tags) = self.tags {
            form = form.text("tags", tags);
        }
        if let Some(permissions) = self.permissions {
            form = form.text("set_permissions", serde_json::to_string(&permissions)?);
        }
        Ok(form)
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct ServiceResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ServiceResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
