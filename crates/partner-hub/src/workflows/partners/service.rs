use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::assignment::{self, AssignmentError, CommissionAssignment};
use super::capability::{authorize, AccessDenied, Operation};
use super::catalog::{CatalogError, ProductCatalog};
use super::domain::{
    Actor, Document, Note, NoteVisibility, PartnerId, PartnerRegistration, PartnerStatus,
    PartnerTier, Role,
};
use super::ledger::{DocumentUpload, DocumentVault, VaultError};
use super::progress;
use super::repository::{
    NotificationError, NotificationPublisher, PartnerDirectoryView, PartnerNotification,
    PartnerRecord, PartnerRepository, RepositoryError,
};
use super::resubmission::{self, ProfileUpdate};
use super::workflow::{self, ValidationIssue, WorkflowCommand, WorkflowError};

/// Service composing the capability gate, state machine, record store, and
/// the external catalog/vault/notification collaborators.
pub struct PartnerService<R, N> {
    repository: Arc<R>,
    notifications: Arc<N>,
    catalog: Arc<dyn ProductCatalog>,
    vault: Arc<dyn DocumentVault>,
}

static PARTNER_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static USER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_partner_id() -> PartnerId {
    let id = PARTNER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PartnerId(format!("ptr-{id:06}"))
}

fn next_user_id() -> String {
    let id = USER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("usr-{id:06}")
}

impl<R, N> PartnerService<R, N>
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(
        repository: Arc<R>,
        notifications: Arc<N>,
        catalog: Arc<dyn ProductCatalog>,
        vault: Arc<dyn DocumentVault>,
    ) -> Self {
        Self {
            repository,
            notifications,
            catalog,
            vault,
        }
    }

    /// Unauthenticated self-registration. Account provisioning is handled by
    /// the identity layer; the engine mints the owning user id and records
    /// the linkage so the credentials can be attached out of band.
    pub fn self_register(
        &self,
        registration: PartnerRegistration,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        validate_registration(&registration)?;
        let owner_id = next_user_id();
        // Applicants never pick their own tier; a reviewer assigns it.
        let record = new_record(
            registration,
            Some(owner_id.clone()),
            owner_id,
            Role::Partner,
            false,
        );
        let stored = self.repository.insert(record)?;
        info!(partner = %stored.id.0, "partner self-registered");
        Ok(stored)
    }

    /// Admin/manager-led creation, optionally tiered at creation time.
    pub fn create_by_manager(
        &self,
        actor: &Actor,
        registration: PartnerRegistration,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        authorize(actor, Operation::CreatePartner, None)?;
        validate_registration(&registration)?;
        let record = new_record(registration, None, actor.id.clone(), actor.role, true);
        let stored = self.repository.insert(record)?;
        info!(partner = %stored.id.0, created_by = %actor.id, "partner created");
        Ok(stored)
    }

    pub fn get(&self, actor: &Actor, id: &PartnerId) -> Result<PartnerRecord, PartnerServiceError> {
        let record = self.fetch_required(id)?;
        authorize(actor, Operation::ViewPartner, Some(&record))?;
        Ok(record)
    }

    /// Directory listing: internal roles see everything, partner accounts
    /// see only the records they own.
    pub fn directory(&self, actor: &Actor) -> Result<Vec<PartnerDirectoryView>, PartnerServiceError> {
        authorize(actor, Operation::ViewDirectory, None)?;
        let records = if actor.role.is_internal() {
            self.repository.all()?
        } else {
            self.repository.owned_by(&actor.id)?
        };
        Ok(records.iter().map(PartnerRecord::directory_view).collect())
    }

    pub fn l1_queue(&self, actor: &Actor) -> Result<Vec<PartnerDirectoryView>, PartnerServiceError> {
        authorize(actor, Operation::ViewL1Queue, None)?;
        let records = self.repository.by_status(PartnerStatus::PendingL1)?;
        Ok(records.iter().map(PartnerRecord::directory_view).collect())
    }

    pub fn l2_queue(&self, actor: &Actor) -> Result<Vec<PartnerDirectoryView>, PartnerServiceError> {
        authorize(actor, Operation::ViewL2Queue, None)?;
        let records = self.repository.by_status(PartnerStatus::PendingL2)?;
        Ok(records.iter().map(PartnerRecord::directory_view).collect())
    }

    pub fn rejected(&self, actor: &Actor) -> Result<Vec<PartnerDirectoryView>, PartnerServiceError> {
        self.listing_by_status(actor, PartnerStatus::Rejected)
    }

    pub fn on_hold(&self, actor: &Actor) -> Result<Vec<PartnerDirectoryView>, PartnerServiceError> {
        self.listing_by_status(actor, PartnerStatus::OnHold)
    }

    fn listing_by_status(
        &self,
        actor: &Actor,
        status: PartnerStatus,
    ) -> Result<Vec<PartnerDirectoryView>, PartnerServiceError> {
        authorize(actor, Operation::ViewDirectory, None)?;
        let records = self.repository.by_status(status)?;
        let views = records
            .iter()
            .filter(|record| {
                actor.role.is_internal()
                    || record.owner_user_id.as_deref() == Some(actor.id.as_str())
            })
            .map(PartnerRecord::directory_view)
            .collect();
        Ok(views)
    }

    /// Reviewer tiering, a precondition for L1 and not an approval step.
    pub fn assign_tier(
        &self,
        actor: &Actor,
        id: &PartnerId,
        tier: PartnerTier,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        let record = self.fetch_required(id)?;
        authorize(actor, Operation::AssignTier, Some(&record))?;
        if let Some(replay) = replayed(&record, idempotency_key.as_deref()) {
            return Ok(replay);
        }
        if !assignment::tier_assignable(record.status) {
            return Err(PartnerServiceError::InvalidTransition {
                from: record.status,
                operation: Operation::AssignTier,
            });
        }
        let mut next = record.clone();
        next.tier = Some(tier);
        self.persist(record.version, next, idempotency_key)
    }

    pub fn send_to_l1(
        &self,
        actor: &Actor,
        id: &PartnerId,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        self.apply_command(actor, id, WorkflowCommand::SendToL1, idempotency_key)
    }

    pub fn approve_l1(
        &self,
        actor: &Actor,
        id: &PartnerId,
        comments: Option<String>,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        self.apply_command(actor, id, WorkflowCommand::ApproveL1 { comments }, idempotency_key)
    }

    pub fn reject_l1(
        &self,
        actor: &Actor,
        id: &PartnerId,
        reason: String,
        comments: Option<String>,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        self.apply_command(
            actor,
            id,
            WorkflowCommand::RejectL1 { reason, comments },
            idempotency_key,
        )
    }

    pub fn approve_l2(
        &self,
        actor: &Actor,
        id: &PartnerId,
        comments: Option<String>,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        self.apply_command(actor, id, WorkflowCommand::ApproveL2 { comments }, idempotency_key)
    }

    pub fn reject_l2(
        &self,
        actor: &Actor,
        id: &PartnerId,
        reason: String,
        comments: Option<String>,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        self.apply_command(
            actor,
            id,
            WorkflowCommand::RejectL2 { reason, comments },
            idempotency_key,
        )
    }

    pub fn put_on_hold(
        &self,
        actor: &Actor,
        id: &PartnerId,
        reason: String,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        self.apply_command(actor, id, WorkflowCommand::PutOnHold { reason }, idempotency_key)
    }

    pub fn resume_from_hold(
        &self,
        actor: &Actor,
        id: &PartnerId,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        self.apply_command(actor, id, WorkflowCommand::ResumeFromHold, idempotency_key)
    }

    pub fn send_back_to_partner(
        &self,
        actor: &Actor,
        id: &PartnerId,
        message: String,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        self.apply_command(
            actor,
            id,
            WorkflowCommand::SendBackToPartner { message },
            idempotency_key,
        )
    }

    pub fn reject_permanently(
        &self,
        actor: &Actor,
        id: &PartnerId,
        reason: String,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        self.apply_command(
            actor,
            id,
            WorkflowCommand::RejectPermanently { reason },
            idempotency_key,
        )
    }

    /// Re-enters a turned-away partner at L1, optionally applying bundled
    /// corrections atomically with the transition.
    pub fn resubmit(
        &self,
        actor: &Actor,
        id: &PartnerId,
        updates: ProfileUpdate,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        let record = self.fetch_required(id)?;
        authorize(actor, Operation::Resubmit, Some(&record))?;
        if let Some(replay) = replayed(&record, idempotency_key.as_deref()) {
            return Ok(replay);
        }
        let now = Utc::now();
        let mut next = workflow::apply(&record, actor, &WorkflowCommand::Resubmit, now)?;
        resubmission::ensure_feedback_exists(&record)?;
        resubmission::apply_updates(&mut next, &updates);
        let stored = self.persist(record.version, next, idempotency_key)?;
        info!(partner = %stored.id.0, count = stored.rejection_count, "partner resubmitted");
        Ok(stored)
    }

    /// Appends a document. The blob goes to the vault first; metadata is
    /// written only once the vault has confirmed durability.
    pub fn upload_document(
        &self,
        actor: &Actor,
        id: &PartnerId,
        upload: DocumentUpload,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        let record = self.fetch_required(id)?;
        authorize(actor, Operation::UploadDocument, Some(&record))?;
        if let Some(replay) = replayed(&record, idempotency_key.as_deref()) {
            return Ok(replay);
        }
        if upload.document_name.trim().is_empty() {
            return Err(ValidationIssue::DocumentNameRequired.into());
        }
        if upload.document_data.is_empty() {
            return Err(ValidationIssue::DocumentDataRequired.into());
        }

        let blob_ref = self
            .vault
            .store(id, &upload.document_name, &upload.document_data)?;

        let now = Utc::now();
        let mut next = record.clone();
        next.documents.push(Document {
            kind: upload.document_type,
            name: upload.document_name,
            blob_ref,
            uploaded_by: actor.id.clone(),
            uploaded_at: now,
            verified: false,
            verified_by: None,
            verified_at: None,
        });
        self.persist(record.version, next, idempotency_key)
    }

    /// Marks a document verified. Irreversible; verifying an already
    /// verified document is a no-op.
    pub fn verify_document(
        &self,
        actor: &Actor,
        id: &PartnerId,
        document_index: usize,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        let record = self.fetch_required(id)?;
        authorize(actor, Operation::VerifyDocument, Some(&record))?;
        if let Some(replay) = replayed(&record, idempotency_key.as_deref()) {
            return Ok(replay);
        }
        if document_index >= record.documents.len() {
            return Err(ValidationIssue::UnknownDocument(document_index).into());
        }
        if record.documents[document_index].verified {
            return Ok(record);
        }

        let now = Utc::now();
        let mut next = record.clone();
        let document = &mut next.documents[document_index];
        document.verified = true;
        document.verified_by = Some(actor.id.clone());
        document.verified_at = Some(now);
        self.persist(record.version, next, idempotency_key)
    }

    /// Replaces the partner's commission terms. Legal only once approved;
    /// re-invocation overwrites the previous assignment wholesale.
    pub fn assign_products(
        &self,
        actor: &Actor,
        id: &PartnerId,
        commission: CommissionAssignment,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        let record = self.fetch_required(id)?;
        authorize(actor, Operation::AssignProducts, Some(&record))?;
        if let Some(replay) = replayed(&record, idempotency_key.as_deref()) {
            return Ok(replay);
        }
        if record.status != PartnerStatus::Approved {
            return Err(PartnerServiceError::InvalidTransition {
                from: record.status,
                operation: Operation::AssignProducts,
            });
        }

        let resolved = assignment::resolve_products(self.catalog.as_ref(), &commission)?;
        let mut next = record.clone();
        next.assigned_products = resolved;
        next.payout_period = Some(commission.payout_period);
        let stored = self.persist(record.version, next, idempotency_key)?;
        info!(
            partner = %stored.id.0,
            products = stored.assigned_products.len(),
            "commission terms assigned"
        );
        Ok(stored)
    }

    pub fn add_note(
        &self,
        actor: &Actor,
        id: &PartnerId,
        note: String,
        visibility: NoteVisibility,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        let record = self.fetch_required(id)?;
        authorize(actor, Operation::AddNote, Some(&record))?;
        if note.trim().is_empty() {
            return Err(ValidationIssue::NoteRequired.into());
        }

        let now = Utc::now();
        let mut next = record.clone();
        next.notes.push(Note {
            note,
            visibility,
            created_by: actor.id.clone(),
            created_by_name: actor.name.clone(),
            created_at: now,
        });
        self.persist(record.version, next, None)
    }

    /// Shared path for pure state-machine commands: authorize, replay-check,
    /// apply, persist with the version read at fetch time, then notify.
    fn apply_command(
        &self,
        actor: &Actor,
        id: &PartnerId,
        command: WorkflowCommand,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        let record = self.fetch_required(id)?;
        authorize(actor, command.operation(), Some(&record))?;
        if let Some(replay) = replayed(&record, idempotency_key.as_deref()) {
            return Ok(replay);
        }

        let now = Utc::now();
        let next = workflow::apply(&record, actor, &command, now)?;
        let status_changed = next.status != record.status;
        let stored = self.persist(record.version, next, idempotency_key)?;

        info!(
            partner = %stored.id.0,
            operation = command.operation().label(),
            status = stored.status.label(),
            "workflow transition applied"
        );

        if status_changed {
            self.notify_status_change(&stored)?;
        }
        Ok(stored)
    }

    fn fetch_required(&self, id: &PartnerId) -> Result<PartnerRecord, PartnerServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    fn persist(
        &self,
        previous_version: u64,
        mut next: PartnerRecord,
        idempotency_key: Option<String>,
    ) -> Result<PartnerRecord, PartnerServiceError> {
        let now = Utc::now();
        next.onboarding_progress = progress::onboarding_progress(&next);
        next.updated_at = now;
        if let Some(key) = idempotency_key {
            next.record_applied_key(key);
        }
        Ok(self.repository.update(next, previous_version)?)
    }

    fn notify_status_change(&self, record: &PartnerRecord) -> Result<(), PartnerServiceError> {
        let template = match record.status {
            PartnerStatus::Approved => "partner_approved",
            PartnerStatus::Rejected => "partner_rejected",
            PartnerStatus::OnHold => "partner_on_hold",
            PartnerStatus::MoreInfoNeeded => "partner_feedback_requested",
            _ => return Ok(()),
        };

        let mut details = BTreeMap::new();
        details.insert("status".to_string(), record.status.label().to_string());
        if let Some(rejection) = &record.rejection {
            details.insert("reason".to_string(), rejection.reason.clone());
            details.insert("level".to_string(), rejection.level.label().to_string());
        }
        if let Some(hold) = &record.hold {
            details.insert("reason".to_string(), hold.reason.clone());
        }

        self.notifications.publish(PartnerNotification {
            template: template.to_string(),
            partner_id: record.id.clone(),
            details,
        })?;
        Ok(())
    }
}

fn validate_registration(registration: &PartnerRegistration) -> Result<(), ValidationIssue> {
    if registration.profile.company_name.trim().is_empty() {
        return Err(ValidationIssue::CompanyNameRequired);
    }
    if registration.profile.contact.email.trim().is_empty() {
        return Err(ValidationIssue::ContactEmailRequired);
    }
    Ok(())
}

fn new_record(
    registration: PartnerRegistration,
    owner_user_id: Option<String>,
    created_by: String,
    created_by_role: Role,
    keep_tier: bool,
) -> PartnerRecord {
    let now = Utc::now();
    let tier = if keep_tier { registration.tier } else { None };
    let mut record = PartnerRecord {
        id: next_partner_id(),
        owner_user_id,
        profile: registration.profile,
        status: PartnerStatus::Draft,
        tier,
        created_by,
        created_by_role,
        onboarding_progress: 0,
        documents: Vec::new(),
        approval_workflow: Vec::new(),
        notes: Vec::new(),
        assigned_products: Vec::new(),
        payout_period: None,
        rejection: None,
        rejection_count: 0,
        permanently_rejected: false,
        hold: None,
        applied_request_keys: Vec::new(),
        version: 1,
        created_at: now,
        updated_at: now,
        submitted_at: None,
    };
    record.onboarding_progress = progress::onboarding_progress(&record);
    record
}

fn replayed(record: &PartnerRecord, idempotency_key: Option<&str>) -> Option<PartnerRecord> {
    idempotency_key
        .filter(|key| record.has_applied_key(key))
        .map(|_| record.clone())
}

/// Error raised by the partner service. `kind` is the machine-readable
/// discriminator carried on every HTTP error payload.
#[derive(Debug, thiserror::Error)]
pub enum PartnerServiceError {
    #[error("cannot {op} while partner is {state}", op = .operation.label(), state = .from.label())]
    InvalidTransition {
        from: PartnerStatus,
        operation: Operation,
    },
    #[error(transparent)]
    Unauthorized(#[from] AccessDenied),
    #[error(transparent)]
    Validation(#[from] ValidationIssue),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Vault(#[from] VaultError),
}

impl PartnerServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            PartnerServiceError::InvalidTransition { .. } => "invalid_transition",
            PartnerServiceError::Unauthorized(_) => "unauthorized",
            PartnerServiceError::Validation(_) => "validation_error",
            PartnerServiceError::Repository(RepositoryError::NotFound) => "not_found",
            PartnerServiceError::Repository(RepositoryError::VersionConflict { .. })
            | PartnerServiceError::Repository(RepositoryError::Conflict) => "conflict",
            PartnerServiceError::Repository(RepositoryError::Unavailable(_))
            | PartnerServiceError::Notification(_)
            | PartnerServiceError::Catalog(_)
            | PartnerServiceError::Vault(_) => "internal",
        }
    }
}

impl From<WorkflowError> for PartnerServiceError {
    fn from(value: WorkflowError) -> Self {
        match value {
            WorkflowError::InvalidTransition { from, operation } => {
                PartnerServiceError::InvalidTransition { from, operation }
            }
            WorkflowError::Validation(issue) => PartnerServiceError::Validation(issue),
        }
    }
}

impl From<AssignmentError> for PartnerServiceError {
    fn from(value: AssignmentError) -> Self {
        match value {
            AssignmentError::Validation(issue) => PartnerServiceError::Validation(issue),
            AssignmentError::Catalog(error) => PartnerServiceError::Catalog(error),
        }
    }
}
