//! Document intake pipeline.
//!
//! Each inbound email flows through:
//! 1. `vocabulary::fetch_vocabulary()` — tag names known to Paperless
//! 2. `filter::exclusion_reason()` — per-attachment eligibility
//! 3. `resolver::resolve()` — title, tag IDs and permission groups
//! 4. `processor::process_email()` — upload, and forward the email on failure

pub mod filter;
pub mod processor;
pub mod resolver;
pub mod tags;
pub mod types;
pub mod vocabulary;

pub use processor::process_email;
pub use resolver::ResolvedSubmission;
pub use types::{AttachmentOutcome, AttachmentReport, IntakeReport};
pub use vocabulary::TagVocabulary;
