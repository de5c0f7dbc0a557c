//! Paperless Intake — uploads email attachments to Paperless-ngx.

pub mod channels;
pub mod config;
pub mod error;
pub mod paperless;
pub mod pipeline;
