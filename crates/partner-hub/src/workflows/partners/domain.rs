use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for partner records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartnerId(pub String);

/// Classification governing a partner's eligibility and base terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl PartnerTier {
    pub const fn label(self) -> &'static str {
        match self {
            PartnerTier::Bronze => "bronze",
            PartnerTier::Silver => "silver",
            PartnerTier::Gold => "gold",
            PartnerTier::Platinum => "platinum",
        }
    }
}

/// Lifecycle status tracked throughout the onboarding workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerStatus {
    Draft,
    PendingL1,
    PendingL2,
    Approved,
    OnHold,
    Rejected,
    MoreInfoNeeded,
}

impl PartnerStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PartnerStatus::Draft => "draft",
            PartnerStatus::PendingL1 => "pending_l1",
            PartnerStatus::PendingL2 => "pending_l2",
            PartnerStatus::Approved => "approved",
            PartnerStatus::OnHold => "on_hold",
            PartnerStatus::Rejected => "rejected",
            PartnerStatus::MoreInfoNeeded => "more_info_needed",
        }
    }
}

/// Roles recognized by the capability gate. Authentication happens upstream;
/// the engine only consumes the asserted role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    PartnerManager,
    L1Approver,
    L2Approver,
    Rep,
    Partner,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "partner_manager" => Some(Role::PartnerManager),
            "l1_approver" => Some(Role::L1Approver),
            "l2_approver" => Some(Role::L2Approver),
            "rep" => Some(Role::Rep),
            "partner" => Some(Role::Partner),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::PartnerManager => "partner_manager",
            Role::L1Approver => "l1_approver",
            Role::L2Approver => "l2_approver",
            Role::Rep => "rep",
            Role::Partner => "partner",
        }
    }

    /// Internal staff roles, as opposed to external partner accounts.
    pub const fn is_internal(self) -> bool {
        !matches!(self, Role::Partner)
    }
}

/// Identity asserted by the upstream auth layer for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: Role,
}

/// Primary contact captured with every partner application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPerson {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub designation: String,
}

/// Business profile accumulated before review. Frozen once the partner is
/// approved; corrections travel through the resubmission path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerProfile {
    pub company_name: String,
    pub business_type: String,
    pub tax_id: String,
    pub years_in_business: u16,
    pub employee_count: u32,
    pub expected_monthly_volume: u32,
    pub business_address: String,
    pub website: Option<String>,
    pub contact: ContactPerson,
}

/// The two sequential human review stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalLevel {
    L1,
    L2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Approved,
    Rejected,
}

/// One row per review attempt at a level. Immutable once decided; a
/// resubmission appends fresh steps so the audit history is never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    pub level: ApprovalLevel,
    pub status: StepStatus,
    pub approver_id: Option<String>,
    pub approver_name: Option<String>,
    pub comments: Option<String>,
    pub rejection_reason: Option<String>,
    pub opened_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl ApprovalStep {
    pub fn opened(level: ApprovalLevel, opened_at: DateTime<Utc>) -> Self {
        Self {
            level,
            status: StepStatus::Pending,
            approver_id: None,
            approver_name: None,
            comments: None,
            rejection_reason: None,
            opened_at,
            decided_at: None,
        }
    }

    pub const fn is_open(&self) -> bool {
        matches!(self.status, StepStatus::Pending)
    }
}

/// Which gate turned the partner away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectedLevel {
    L1,
    L2,
    Final,
}

impl RejectedLevel {
    pub const fn label(self) -> &'static str {
        match self {
            RejectedLevel::L1 => "l1",
            RejectedLevel::L2 => "l2",
            RejectedLevel::Final => "final",
        }
    }
}

/// Active rejection metadata. Cleared on resubmission; the per-step audit
/// trail keeps the full history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionInfo {
    pub reason: String,
    pub level: RejectedLevel,
    pub rejected_by: String,
    pub rejected_by_name: String,
    pub rejected_at: DateTime<Utc>,
}

/// Hold metadata, including the status to restore when the hold lifts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldInfo {
    pub reason: String,
    pub placed_by: String,
    pub placed_by_name: String,
    pub placed_at: DateTime<Utc>,
    pub resume_status: PartnerStatus,
}

/// Paperwork categories collected during onboarding and KYC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    BusinessLicense,
    TaxDocument,
    BankStatement,
    SignedAgreement,
    IdentityProof,
    KycDocument,
}

/// Document metadata. The blob itself lives in an external vault; the engine
/// only persists the reference returned after the vault confirms durability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub kind: DocumentKind,
    pub name: String,
    pub blob_ref: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub verified: bool,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteVisibility {
    Internal,
    PartnerVisible,
}

/// Free-text annotation. Append-only, never edited or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub note: String,
    pub visibility: NoteVisibility,
    pub created_by: String,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
}

/// Cadence for commission payouts once a partner is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutPeriod {
    Weekly,
    Monthly,
    Quarterly,
}

impl PayoutPeriod {
    pub const fn label(self) -> &'static str {
        match self {
            PayoutPeriod::Weekly => "weekly",
            PayoutPeriod::Monthly => "monthly",
            PayoutPeriod::Quarterly => "quarterly",
        }
    }
}

/// Commission terms for one product. Rates are snapshots taken at assignment
/// time; later catalog changes do not flow back into the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCommission {
    pub product_id: String,
    pub product_name: String,
    pub base_commission_rate: Decimal,
    pub custom_margin: Decimal,
    pub final_rate: Decimal,
}

/// Inbound application payload used by both self-registration and managed
/// creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerRegistration {
    pub profile: PartnerProfile,
    #[serde(default)]
    pub tier: Option<PartnerTier>,
}
