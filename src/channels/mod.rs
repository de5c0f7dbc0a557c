//! Email channel: inbound message model and fallback forwarding.

pub mod email;
pub mod email_types;

pub use email::{Forwarder, SmtpForwarder, read_raw_email};
pub use email_types::{Attachment, Disposition, InboundEmail};
