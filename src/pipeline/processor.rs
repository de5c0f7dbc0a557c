//! Submission orchestrator: uploads each eligible attachment of one email.
//!
//! Flow:
//! 1. Fetch the tag vocabulary (once per email)
//! 2. For each attachment, in order: filter → resolve → upload
//! 3. On a failed upload, forward the original email to the fallback mailbox
//!
//! Attachments are handled one at a time; a failure never stops the batch.

use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::channels::{Attachment, Forwarder, InboundEmail};
use crate::config::TaggingConfig;
use crate::paperless::{DocumentService, DocumentUpload, SetPermissions};
use crate::pipeline::filter::exclusion_reason;
use crate::pipeline::resolver::{ResolvedSubmission, resolve};
use crate::pipeline::types::{AttachmentOutcome, AttachmentReport, IntakeReport};
use crate::pipeline::vocabulary::{TagVocabulary, fetch_vocabulary};

/// Process one inbound email end to end.
///
/// Never fails: every recoverable problem is logged and reflected in the
/// returned report.
pub async fn process_email(
    email: &InboundEmail,
    service: &dyn DocumentService,
    forwarder: &dyn Forwarder,
    tagging: &TaggingConfig,
    fallback_mailbox: &str,
) -> IntakeReport {
    let span = info_span!("intake", invocation = %Uuid::new_v4());
    async move {
        info!(
            subject = email.subject.as_deref().unwrap_or_default(),
            recipient = %email.recipient,
            attachments = email.attachments.len(),
            "Processing inbound email"
        );
        for (idx, att) in email.attachments.iter().enumerate() {
            debug!(
                idx,
                filename = att.filename.as_deref().unwrap_or_default(),
                mime_type = %att.mime_type,
                disposition = att.disposition.as_str(),
                size = att.content.len(),
                "Attachment"
            );
        }

        let vocabulary = fetch_vocabulary(service).await;
        let mut report = IntakeReport {
            vocabulary_size: vocabulary.len(),
            attachments: Vec::with_capacity(email.attachments.len()),
        };

        for (index, attachment) in email.attachments.iter().enumerate() {
            let outcome = match exclusion_reason(attachment, &tagging.ignored_mime_types) {
                Some(reason) => {
                    info!(
                        filename = attachment.filename.as_deref().unwrap_or_default(),
                        mime_type = %attachment.mime_type,
                        reason = reason.label(),
                        "Skipping attachment"
                    );
                    AttachmentOutcome::Skipped { reason }
                }
                None => {
                    submit_attachment(
                        attachment,
                        email,
                        &vocabulary,
                        service,
                        forwarder,
                        tagging,
                        fallback_mailbox,
                    )
                    .await
                }
            };

            report.attachments.push(AttachmentReport {
                index,
                filename: attachment.filename.clone(),
                outcome,
            });
        }

        info!(
            submitted = report.submitted(),
            failed = report.failed(),
            skipped = report.skipped(),
            "Finished inbound email"
        );
        report
    }
    .instrument(span)
    .await
}

/// Resolve, upload, and handle the outcome for one eligible attachment.
async fn submit_attachment(
    attachment: &Attachment,
    email: &InboundEmail,
    vocabulary: &TagVocabulary,
    service: &dyn DocumentService,
    forwarder: &dyn Forwarder,
    tagging: &TaggingConfig,
    fallback_mailbox: &str,
) -> AttachmentOutcome {
    let filename = attachment.filename.as_deref().unwrap_or_default();
    info!(filename, mime_type = %attachment.mime_type, "Processing attachment");

    let resolved = resolve(attachment, email, vocabulary, tagging);
    let upload = build_upload(attachment, &resolved, tagging.permission_user);
    info!(
        title = %upload.title,
        tags = upload.tags.as_deref().unwrap_or_default(),
        groups = ?resolved.group_ids,
        "Uploading document"
    );

    let status = match service.post_document(upload).await {
        Ok(resp) if resp.is_success() => {
            info!(filename, body = %resp.body, "Submitted document to Paperless");
            return AttachmentOutcome::Submitted {
                status: resp.status.as_u16(),
            };
        }
        Ok(resp) => {
            warn!(filename, status = %resp.status, body = %resp.body, "Failed to submit document");
            Some(resp.status.as_u16())
        }
        Err(e) => {
            warn!(filename, error = %e, "Failed to submit document");
            None
        }
    };

    let forwarded = match forwarder.forward(&email.raw, fallback_mailbox).await {
        Ok(()) => true,
        Err(e) => {
            error!(filename, to = fallback_mailbox, error = %e, "Failed to forward original email");
            false
        }
    };

    AttachmentOutcome::Failed { status, forwarded }
}

/// Build the multipart upload for one attachment.
///
/// `set_permissions` is only sent when at least one group was resolved.
pub fn build_upload(
    attachment: &Attachment,
    resolved: &ResolvedSubmission,
    permission_user: Option<u64>,
) -> DocumentUpload {
    let permissions = (!resolved.group_ids.is_empty()).then(|| {
        SetPermissions::view_and_change(
            permission_user.into_iter().collect(),
            resolved.group_ids.clone(),
        )
    });

    DocumentUpload {
        filename: attachment.filename.clone(),
        content: attachment.content.clone(),
        title: resolved.title.clone(),
        tags: resolved.tags_field(),
        permissions,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::*;
    use crate::channels::Disposition;
    use crate::error::{ForwardError, ServiceError};
    use crate::paperless::{RemoteTag, ServiceResponse};
    use crate::pipeline::filter::SkipReason;

    /// Mock service: fixed vocabulary, uploads fail when the title matches.
    struct MockService {
        tags: Vec<RemoteTag>,
        fail_titles: Vec<String>,
        transport_error: bool,
        uploads: Mutex<Vec<DocumentUpload>>,
    }

    impl MockService {
        fn new() -> Self {
            Self {
                tags: vec![
                    RemoteTag {
                        id: 1,
                        name: "Finance".into(),
                    },
                    RemoteTag {
                        id: 2,
                        name: "nunc".into(),
                    },
                ],
                fail_titles: Vec::new(),
                transport_error: false,
                uploads: Mutex::new(Vec::new()),
            }
        }

        fn failing(titles: &[&str]) -> Self {
            Self {
                fail_titles: titles.iter().map(|t| t.to_string()).collect(),
                ..Self::new()
            }
        }

        fn uploads(&self) -> Vec<DocumentUpload> {
            self.uploads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentService for MockService {
        async fn list_tags(&self) -> Result<Vec<RemoteTag>, ServiceError> {
            Ok(self.tags.clone())
        }

        async fn post_document(
            &self,
            upload: DocumentUpload,
        ) -> Result<ServiceResponse, ServiceError> {
            let fail = self.fail_titles.contains(&upload.title);
            self.uploads.lock().unwrap().push(upload);
            if self.transport_error {
                // Stands in for a connection failure.
                return Err(ServiceError::InvalidHeader {
                    name: "Authorization",
                    reason: "simulated".into(),
                });
            }
            Ok(if fail {
                ServiceResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "boom".into(),
                }
            } else {
                ServiceResponse {
                    status: StatusCode::OK,
                    body: "\"5c1a\"".into(),
                }
            })
        }
    }

    /// Records every forward; optionally fails them.
    #[derive(Default)]
    struct RecordingForwarder {
        sent: Mutex<Vec<(Vec<u8>, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Forwarder for RecordingForwarder {
        async fn forward(&self, raw: &[u8], to: &str) -> Result<(), ForwardError> {
            self.sent.lock().unwrap().push((raw.to_vec(), to.to_string()));
            if self.fail {
                return Err(ForwardError::SendFailed("relay down".into()));
            }
            Ok(())
        }
    }

    fn attachment(filename: &str, mime: &str, disposition: Disposition) -> Attachment {
        Attachment {
            filename: Some(filename.into()),
            mime_type: mime.into(),
            disposition,
            content: filename.as_bytes().to_vec(),
        }
    }

    fn email(subject: Option<&str>, attachments: Vec<Attachment>) -> InboundEmail {
        InboundEmail {
            subject: subject.map(str::to_string),
            recipient: "docs+nunc@example.com".into(),
            attachments,
            raw: b"raw message bytes".to_vec(),
        }
    }

    const POSTMASTER: &str = "postmaster@example.com";

    // ── build_upload ────────────────────────────────────────────────

    #[test]
    fn upload_without_groups_has_no_permissions() {
        let att = attachment("a.pdf", "application/pdf", Disposition::Attachment);
        let resolved = ResolvedSubmission {
            title: "A".into(),
            tag_ids: vec![],
            group_ids: vec![],
        };
        let upload = build_upload(&att, &resolved, Some(3));
        assert!(upload.permissions.is_none());
        assert!(upload.tags.is_none());
        assert_eq!(upload.filename.as_deref(), Some("a.pdf"));
        assert_eq!(upload.content, b"a.pdf");
    }

    #[test]
    fn upload_with_groups_grants_user_and_groups() {
        let att = attachment("a.pdf", "application/pdf", Disposition::Attachment);
        let resolved = ResolvedSubmission {
            title: "A".into(),
            tag_ids: vec![4, 2],
            group_ids: vec![6],
        };
        let upload = build_upload(&att, &resolved, Some(3));
        assert_eq!(upload.tags.as_deref(), Some("4,2"));
        assert_eq!(
            upload.permissions,
            Some(SetPermissions::view_and_change(vec![3], vec![6]))
        );
    }

    #[test]
    fn upload_with_groups_and_no_user() {
        let att = attachment("a.pdf", "application/pdf", Disposition::Attachment);
        let resolved = ResolvedSubmission {
            title: "A".into(),
            tag_ids: vec![],
            group_ids: vec![6, 6],
        };
        let upload = build_upload(&att, &resolved, None);
        let permissions = upload.permissions.unwrap();
        assert!(permissions.view.users.is_empty());
        assert_eq!(permissions.change.groups, vec![6, 6]);
    }

    // ── process_email ───────────────────────────────────────────────

    #[tokio::test]
    async fn submits_eligible_attachments_in_order() {
        let service = MockService::new();
        let forwarder = RecordingForwarder::default();
        let msg = email(
            Some("Invoice #finance"),
            vec![
                attachment("one.pdf", "application/pdf", Disposition::Attachment),
                attachment("logo.png", "image/png", Disposition::Inline),
                attachment("two.docx", "application/msword", Disposition::Inline),
            ],
        );

        let report =
            process_email(&msg, &service, &forwarder, &TaggingConfig::default(), POSTMASTER).await;

        assert_eq!(report.vocabulary_size, 2);
        assert_eq!(report.submitted(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(
            report.attachments[1].outcome,
            AttachmentOutcome::Skipped {
                reason: SkipReason::InlineNonDocument
            }
        );

        let uploads = service.uploads();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].filename.as_deref(), Some("one.pdf"));
        assert_eq!(uploads[1].filename.as_deref(), Some("two.docx"));
        assert_eq!(uploads[0].title, "Invoice");
        // nunc (plus-address) then finance (hashtag)
        assert_eq!(uploads[0].tags.as_deref(), Some("2,1"));
        assert!(forwarder.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ignored_types_never_uploaded() {
        let service = MockService::new();
        let forwarder = RecordingForwarder::default();
        let tagging = TaggingConfig {
            ignored_mime_types: vec!["application/pdf".into()],
            ..Default::default()
        };
        let msg = email(
            None,
            vec![attachment("a.pdf", "application/pdf", Disposition::Attachment)],
        );

        let report = process_email(&msg, &service, &forwarder, &tagging, POSTMASTER).await;

        assert_eq!(report.skipped(), 1);
        assert!(service.uploads().is_empty());
    }

    #[tokio::test]
    async fn failed_upload_forwards_once_and_continues() {
        let service = MockService::failing(&["first.pdf"]);
        let forwarder = RecordingForwarder::default();
        let msg = email(
            None,
            vec![
                attachment("first.pdf", "application/pdf", Disposition::Attachment),
                attachment("second.pdf", "application/pdf", Disposition::Attachment),
            ],
        );

        let report =
            process_email(&msg, &service, &forwarder, &TaggingConfig::default(), POSTMASTER).await;

        let sent = forwarder.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, b"raw message bytes");
        assert_eq!(sent[0].1, POSTMASTER);

        assert_eq!(service.uploads().len(), 2);
        assert_eq!(
            report.attachments[0].outcome,
            AttachmentOutcome::Failed {
                status: Some(500),
                forwarded: true
            }
        );
        assert_eq!(
            report.attachments[1].outcome,
            AttachmentOutcome::Submitted { status: 200 }
        );
    }

    #[tokio::test]
    async fn each_failing_attachment_forwards() {
        let service = MockService::failing(&["a.pdf", "b.pdf"]);
        let forwarder = RecordingForwarder::default();
        let msg = email(
            None,
            vec![
                attachment("a.pdf", "application/pdf", Disposition::Attachment),
                attachment("b.pdf", "application/pdf", Disposition::Attachment),
            ],
        );

        let report =
            process_email(&msg, &service, &forwarder, &TaggingConfig::default(), POSTMASTER).await;

        assert_eq!(report.failed(), 2);
        assert_eq!(forwarder.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn transport_error_forwards() {
        let service = MockService {
            transport_error: true,
            ..MockService::new()
        };
        let forwarder = RecordingForwarder::default();
        let msg = email(
            None,
            vec![attachment("a.pdf", "application/pdf", Disposition::Attachment)],
        );

        let report =
            process_email(&msg, &service, &forwarder, &TaggingConfig::default(), POSTMASTER).await;

        assert_eq!(
            report.attachments[0].outcome,
            AttachmentOutcome::Failed {
                status: None,
                forwarded: true
            }
        );
    }

    #[tokio::test]
    async fn failed_forward_does_not_abort_batch() {
        let service = MockService::failing(&["a.pdf"]);
        let forwarder = RecordingForwarder {
            fail: true,
            ..Default::default()
        };
        let msg = email(
            None,
            vec![
                attachment("a.pdf", "application/pdf", Disposition::Attachment),
                attachment("b.pdf", "application/pdf", Disposition::Attachment),
            ],
        );

        let report =
            process_email(&msg, &service, &forwarder, &TaggingConfig::default(), POSTMASTER).await;

        assert_eq!(
            report.attachments[0].outcome,
            AttachmentOutcome::Failed {
                status: Some(500),
                forwarded: false
            }
        );
        assert_eq!(report.submitted(), 1);
        assert_eq!(report.forwarded(), 0);
    }

    #[tokio::test]
    async fn permissions_sent_for_mapped_plus_tag() {
        let service = MockService::new();
        let forwarder = RecordingForwarder::default();
        let tagging = TaggingConfig {
            tag_groups: HashMap::from([("nunc".to_string(), 6)]),
            permission_user: Some(3),
            ..Default::default()
        };
        let msg = email(
            Some("Scan"),
            vec![attachment("a.pdf", "application/pdf", Disposition::Attachment)],
        );

        process_email(&msg, &service, &forwarder, &tagging, POSTMASTER).await;

        let uploads = service.uploads();
        assert_eq!(
            uploads[0].permissions,
            Some(SetPermissions::view_and_change(vec![3], vec![6]))
        );
    }

    #[tokio::test]
    async fn email_without_attachments_only_fetches_tags() {
        let service = MockService::new();
        let forwarder = RecordingForwarder::default();
        let msg = email(Some("Hello"), vec![]);

        let report =
            process_email(&msg, &service, &forwarder, &TaggingConfig::default(), POSTMASTER).await;

        assert!(report.attachments.is_empty());
        assert!(service.uploads().is_empty());
    }
}
