use std::sync::Arc;

use super::common::*;
use crate::workflows::partners::domain::DocumentKind;
use crate::workflows::partners::ledger::DocumentUpload;
use crate::workflows::partners::repository::PartnerRepository;
use crate::workflows::partners::service::PartnerServiceError;
use crate::workflows::partners::workflow::ValidationIssue;

fn upload(kind: DocumentKind, name: &str) -> DocumentUpload {
    DocumentUpload {
        document_type: kind,
        document_name: name.to_string(),
        document_data: "ZmFrZS1wZGYtYnl0ZXM=".to_string(),
    }
}

#[test]
fn upload_appends_metadata_with_vault_reference() {
    let (service, _, _) = build_service();
    let record = draft_partner(&service);

    let updated = service
        .upload_document(
            &admin(),
            &record.id,
            upload(DocumentKind::BusinessLicense, "license.pdf"),
            None,
        )
        .expect("upload succeeds");

    assert_eq!(updated.documents.len(), 1);
    let document = &updated.documents[0];
    assert!(document.blob_ref.starts_with("vault://"));
    assert!(!document.verified);
    assert_eq!(document.uploaded_by, "usr-admin");
}

#[test]
fn vault_failure_leaves_no_phantom_document() {
    let (service, repository) = build_service_with_vault(Arc::new(FailingVault));
    let record = service
        .create_by_manager(&admin(), registration())
        .expect("partner creation succeeds");

    match service.upload_document(
        &admin(),
        &record.id,
        upload(DocumentKind::TaxDocument, "w9.pdf"),
        None,
    ) {
        Err(PartnerServiceError::Vault(_)) => {}
        other => panic!("expected vault error, got {other:?}"),
    }

    let stored = repository
        .fetch(&record.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert!(
        stored.documents.is_empty(),
        "metadata must only exist once the blob is durable"
    );
}

#[test]
fn upload_validates_name_and_payload() {
    let (service, _, _) = build_service();
    let record = draft_partner(&service);

    let unnamed = upload(DocumentKind::TaxDocument, "  ");
    match service.upload_document(&admin(), &record.id, unnamed, None) {
        Err(PartnerServiceError::Validation(ValidationIssue::DocumentNameRequired)) => {}
        other => panic!("expected name validation, got {other:?}"),
    }

    let mut empty = upload(DocumentKind::TaxDocument, "w9.pdf");
    empty.document_data = String::new();
    match service.upload_document(&admin(), &record.id, empty, None) {
        Err(PartnerServiceError::Validation(ValidationIssue::DocumentDataRequired)) => {}
        other => panic!("expected payload validation, got {other:?}"),
    }
}

#[test]
fn multiple_versions_of_a_kind_coexist() {
    let (service, _, _) = build_service();
    let record = draft_partner(&service);

    service
        .upload_document(&admin(), &record.id, upload(DocumentKind::TaxDocument, "w9-2024.pdf"), None)
        .expect("first upload succeeds");
    let updated = service
        .upload_document(&admin(), &record.id, upload(DocumentKind::TaxDocument, "w9-2025.pdf"), None)
        .expect("second upload succeeds");

    assert_eq!(updated.documents.len(), 2, "earlier versions are never removed");
    let authoritative = updated
        .latest_document_of_kind(DocumentKind::TaxDocument)
        .expect("latest of kind");
    assert_eq!(authoritative.name, "w9-2025.pdf");
}

#[test]
fn verification_is_gated_and_irreversible() {
    let (service, _, _) = build_service();
    let own = self_registered_partner(&service);
    let owner = partner_actor(own.owner_user_id.as_deref().expect("owner id"));

    service
        .upload_document(&owner, &own.id, upload(DocumentKind::IdentityProof, "passport.pdf"), None)
        .expect("owner uploads");

    match service.verify_document(&owner, &own.id, 0, None) {
        Err(PartnerServiceError::Unauthorized(_)) => {}
        other => panic!("expected unauthorized, got {other:?}"),
    }

    let verified = service
        .verify_document(&l1_approver(), &own.id, 0, None)
        .expect("approver verifies");
    assert!(verified.documents[0].verified);
    assert_eq!(verified.documents[0].verified_by.as_deref(), Some("usr-l1"));

    // A second verification is absorbed without touching the record.
    let again = service
        .verify_document(&l2_approver(), &own.id, 0, None)
        .expect("re-verification is a no-op");
    assert_eq!(again.documents[0].verified_by.as_deref(), Some("usr-l1"));
    assert_eq!(again.version, verified.version);
}

#[test]
fn verifying_a_missing_document_fails_validation() {
    let (service, _, _) = build_service();
    let record = draft_partner(&service);

    match service.verify_document(&admin(), &record.id, 3, None) {
        Err(PartnerServiceError::Validation(ValidationIssue::UnknownDocument(3))) => {}
        other => panic!("expected unknown document validation, got {other:?}"),
    }
}

#[test]
fn upload_is_owner_or_manager_only() {
    let (service, _, _) = build_service();
    let record = draft_partner(&service);

    match service.upload_document(
        &rep(),
        &record.id,
        upload(DocumentKind::BankStatement, "statement.pdf"),
        None,
    ) {
        Err(PartnerServiceError::Unauthorized(_)) => {}
        other => panic!("expected unauthorized, got {other:?}"),
    }

    let stranger = partner_actor("usr-not-the-owner");
    match service.upload_document(
        &stranger,
        &record.id,
        upload(DocumentKind::BankStatement, "statement.pdf"),
        None,
    ) {
        Err(PartnerServiceError::Unauthorized(_)) => {}
        other => panic!("expected unauthorized, got {other:?}"),
    }
}

#[test]
fn document_uploads_count_toward_onboarding_progress() {
    let (service, _, _) = build_service();
    let record = draft_partner(&service);
    assert_eq!(record.onboarding_progress, 10);

    service
        .upload_document(&admin(), &record.id, upload(DocumentKind::BusinessLicense, "license.pdf"), None)
        .expect("first upload");
    let two_docs = service
        .upload_document(&admin(), &record.id, upload(DocumentKind::TaxDocument, "w9.pdf"), None)
        .expect("second upload");

    assert_eq!(two_docs.onboarding_progress, 30, "paperwork milestone needs two documents");
}
