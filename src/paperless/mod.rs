//! Paperless-ngx document service: wire types and HTTP client.

pub mod client;
pub mod types;

pub use client::{DocumentService, PaperlessClient, ServiceContext};
pub use types::{DocumentUpload, Grantees, RemoteTag, ServiceResponse, SetPermissions, TagList};
