use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ApprovalLevel, ApprovalStep, Document, DocumentKind, HoldInfo, Note, PartnerId, PartnerProfile,
    PartnerStatus, PartnerTier, PayoutPeriod, ProductCommission, RejectionInfo, Role,
};

/// Retries carrying a key the record has already applied are treated as
/// replays; only this many recent keys are retained per partner.
pub(crate) const IDEMPOTENCY_KEY_WINDOW: usize = 32;

/// The aggregate root. Every other component mutates a partner only through
/// a repository round-trip of this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerRecord {
    pub id: PartnerId,
    pub owner_user_id: Option<String>,
    pub profile: PartnerProfile,
    pub status: PartnerStatus,
    pub tier: Option<PartnerTier>,
    pub created_by: String,
    pub created_by_role: Role,
    pub onboarding_progress: u8,
    pub documents: Vec<Document>,
    pub approval_workflow: Vec<ApprovalStep>,
    pub notes: Vec<Note>,
    pub assigned_products: Vec<ProductCommission>,
    pub payout_period: Option<PayoutPeriod>,
    pub rejection: Option<RejectionInfo>,
    pub rejection_count: u32,
    pub permanently_rejected: bool,
    pub hold: Option<HoldInfo>,
    pub applied_request_keys: Vec<String>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl PartnerRecord {
    /// Most recent step for a level, regardless of outcome. Prior steps for
    /// the same level are retained for audit but never consulted as current.
    pub fn current_step(&self, level: ApprovalLevel) -> Option<&ApprovalStep> {
        self.approval_workflow
            .iter()
            .rev()
            .find(|step| step.level == level)
    }

    pub(crate) fn current_step_mut(&mut self, level: ApprovalLevel) -> Option<&mut ApprovalStep> {
        self.approval_workflow
            .iter_mut()
            .rev()
            .find(|step| step.level == level)
    }

    /// Authoritative document for a kind: the most recently uploaded one.
    pub fn latest_document_of_kind(&self, kind: DocumentKind) -> Option<&Document> {
        self.documents.iter().rev().find(|doc| doc.kind == kind)
    }

    pub fn has_applied_key(&self, key: &str) -> bool {
        self.applied_request_keys.iter().any(|seen| seen == key)
    }

    pub(crate) fn record_applied_key(&mut self, key: String) {
        self.applied_request_keys.push(key);
        if self.applied_request_keys.len() > IDEMPOTENCY_KEY_WINDOW {
            let excess = self.applied_request_keys.len() - IDEMPOTENCY_KEY_WINDOW;
            self.applied_request_keys.drain(..excess);
        }
    }

    pub fn status_view(&self) -> PartnerStatusView {
        PartnerStatusView {
            partner_id: self.id.clone(),
            status: self.status.label(),
            tier: self.tier.map(PartnerTier::label),
            onboarding_progress: self.onboarding_progress,
            rejection_count: self.rejection_count,
            rejection_reason: self.rejection.as_ref().map(|info| info.reason.clone()),
            rejected_level: self.rejection.as_ref().map(|info| info.level.label()),
            hold_reason: self.hold.as_ref().map(|info| info.reason.clone()),
            workflow_steps: self.approval_workflow.len(),
        }
    }

    pub fn directory_view(&self) -> PartnerDirectoryView {
        PartnerDirectoryView {
            partner_id: self.id.clone(),
            company_name: self.profile.company_name.clone(),
            contact_email: self.profile.contact.email.clone(),
            status: self.status.label(),
            tier: self.tier.map(PartnerTier::label),
            onboarding_progress: self.onboarding_progress,
        }
    }
}

/// Minimal confirmation returned by every mutating endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PartnerStatusView {
    pub partner_id: PartnerId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<&'static str>,
    pub onboarding_progress: u8,
    pub rejection_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_level: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_reason: Option<String>,
    pub workflow_steps: usize,
}

/// Row shape for directory and queue listings.
#[derive(Debug, Clone, Serialize)]
pub struct PartnerDirectoryView {
    pub partner_id: PartnerId,
    pub company_name: String,
    pub contact_email: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<&'static str>,
    pub onboarding_progress: u8,
}

/// Storage abstraction so the service module can be exercised in isolation.
/// `update` carries the version the caller read; implementations must refuse
/// the write when the stored version differs, which is how two concurrent
/// approvals of the same partner resolve to exactly one winner.
pub trait PartnerRepository: Send + Sync {
    fn insert(&self, record: PartnerRecord) -> Result<PartnerRecord, RepositoryError>;
    fn update(
        &self,
        record: PartnerRecord,
        expected_version: u64,
    ) -> Result<PartnerRecord, RepositoryError>;
    fn fetch(&self, id: &PartnerId) -> Result<Option<PartnerRecord>, RepositoryError>;
    fn by_status(&self, status: PartnerStatus) -> Result<Vec<PartnerRecord>, RepositoryError>;
    fn owned_by(&self, user_id: &str) -> Result<Vec<PartnerRecord>, RepositoryError>;
    fn all(&self) -> Result<Vec<PartnerRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("concurrent modification detected (expected version {expected}, found {found})")]
    VersionConflict { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook (e-mail/webhook adapters live behind this).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: PartnerNotification) -> Result<(), NotificationError>;
}

/// Payload handed to the notification transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerNotification {
    pub template: String,
    pub partner_id: PartnerId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
