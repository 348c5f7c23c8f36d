//! Partner lifecycle and multi-level approval workflow.
//!
//! A partner record accumulates profile data and paperwork, passes through
//! two independently gated human review stages, and can be diverted into
//! hold, rejection, or correction loops at any gate. Once approved, tiering
//! and commission terms are attached. Storage, notifications, the product
//! catalog, and the document blob store are all consumed through traits so
//! the engine can be exercised in isolation.

pub mod assignment;
pub mod capability;
pub mod catalog;
pub mod domain;
pub mod ledger;
pub(crate) mod progress;
pub mod repository;
pub mod resubmission;
pub mod router;
pub mod service;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use assignment::{CommissionAssignment, ProductAssignment};
pub use capability::{authorize, AccessDenied, Operation};
pub use catalog::{CatalogError, CatalogProduct, ProductCatalog};
pub use domain::{
    Actor, ApprovalLevel, ApprovalStep, ContactPerson, Document, DocumentKind, HoldInfo, Note,
    NoteVisibility, PartnerId, PartnerProfile, PartnerRegistration, PartnerStatus, PartnerTier,
    PayoutPeriod, ProductCommission, RejectedLevel, RejectionInfo, Role, StepStatus,
};
pub use ledger::{DocumentUpload, DocumentVault, VaultError};
pub use repository::{
    NotificationError, NotificationPublisher, PartnerDirectoryView, PartnerNotification,
    PartnerRecord, PartnerRepository, PartnerStatusView, RepositoryError,
};
pub use resubmission::ProfileUpdate;
pub use router::partner_router;
pub use service::{PartnerService, PartnerServiceError};
pub use workflow::{ValidationIssue, WorkflowCommand, WorkflowError};
