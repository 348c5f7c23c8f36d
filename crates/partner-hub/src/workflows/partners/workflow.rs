use chrono::{DateTime, Utc};

use super::capability::Operation;
use super::domain::{
    Actor, ApprovalLevel, ApprovalStep, HoldInfo, Note, NoteVisibility, PartnerStatus,
    RejectedLevel, RejectionInfo, Role, StepStatus,
};
use super::repository::PartnerRecord;

/// State-machine transition requested by an actor. Payloads are structured
/// fields; interactive prompting never reaches this layer.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowCommand {
    SendToL1,
    ApproveL1 { comments: Option<String> },
    RejectL1 { reason: String, comments: Option<String> },
    ApproveL2 { comments: Option<String> },
    RejectL2 { reason: String, comments: Option<String> },
    PutOnHold { reason: String },
    ResumeFromHold,
    SendBackToPartner { message: String },
    RejectPermanently { reason: String },
    Resubmit,
}

impl WorkflowCommand {
    pub const fn operation(&self) -> Operation {
        match self {
            WorkflowCommand::SendToL1 => Operation::SendToL1,
            WorkflowCommand::ApproveL1 { .. } => Operation::ApproveL1,
            WorkflowCommand::RejectL1 { .. } => Operation::RejectL1,
            WorkflowCommand::ApproveL2 { .. } => Operation::ApproveL2,
            WorkflowCommand::RejectL2 { .. } => Operation::RejectL2,
            WorkflowCommand::PutOnHold { .. } => Operation::PutOnHold,
            WorkflowCommand::ResumeFromHold => Operation::ResumeFromHold,
            WorkflowCommand::SendBackToPartner { .. } => Operation::SendBackToPartner,
            WorkflowCommand::RejectPermanently { .. } => Operation::RejectPermanently,
            WorkflowCommand::Resubmit => Operation::Resubmit,
        }
    }
}

/// Request-level validation failures, distinct from wrong-state and
/// wrong-actor errors so callers can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("tier must be assigned before the partner can enter L1 review")]
    TierNotAssigned,
    #[error("a reason is required for this action")]
    ReasonRequired,
    #[error("a feedback message is required")]
    MessageRequired,
    #[error("note text must not be empty")]
    NoteRequired,
    #[error("this action applies only to self-registered partners")]
    SelfRegisteredOnly,
    #[error("no reviewer feedback is on record; nothing to correct and resubmit")]
    NoReviewerFeedback,
    #[error("company name is required")]
    CompanyNameRequired,
    #[error("contact email is required")]
    ContactEmailRequired,
    #[error("document name is required")]
    DocumentNameRequired,
    #[error("document payload is required")]
    DocumentDataRequired,
    #[error("document index {0} does not exist")]
    UnknownDocument(usize),
    #[error("product {0} is not in the catalog")]
    UnknownProduct(String),
    #[error("assignment must include at least one product")]
    NoProductsInAssignment,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("cannot {op} while partner is {state}", op = .operation.label(), state = .from.label())]
    InvalidTransition {
        from: PartnerStatus,
        operation: Operation,
    },
    #[error(transparent)]
    Validation(#[from] ValidationIssue),
}

/// Applies one command to a record, producing the successor record. Pure:
/// the input is never mutated, so a failed transition cannot leave a
/// partially-applied partner behind.
pub fn apply(
    record: &PartnerRecord,
    actor: &Actor,
    command: &WorkflowCommand,
    now: DateTime<Utc>,
) -> Result<PartnerRecord, WorkflowError> {
    let invalid = || WorkflowError::InvalidTransition {
        from: record.status,
        operation: command.operation(),
    };

    let mut next = record.clone();

    match command {
        WorkflowCommand::SendToL1 => {
            if record.status != PartnerStatus::Draft {
                return Err(invalid());
            }
            if record.tier.is_none() {
                return Err(ValidationIssue::TierNotAssigned.into());
            }
            next.approval_workflow
                .push(ApprovalStep::opened(ApprovalLevel::L1, now));
            next.status = PartnerStatus::PendingL1;
            next.submitted_at = Some(now);
        }
        WorkflowCommand::ApproveL1 { comments } => {
            if record.status != PartnerStatus::PendingL1 {
                return Err(invalid());
            }
            decide_step(
                &mut next,
                ApprovalLevel::L1,
                StepStatus::Approved,
                actor,
                comments.clone(),
                None,
                now,
            )
            .ok_or_else(invalid)?;
            next.approval_workflow
                .push(ApprovalStep::opened(ApprovalLevel::L2, now));
            next.status = PartnerStatus::PendingL2;
        }
        WorkflowCommand::RejectL1 { reason, comments } => {
            if record.status != PartnerStatus::PendingL1 {
                return Err(invalid());
            }
            reject_at_level(
                &mut next,
                ApprovalLevel::L1,
                RejectedLevel::L1,
                actor,
                reason,
                comments.clone(),
                now,
            )?;
        }
        WorkflowCommand::ApproveL2 { comments } => {
            if record.status != PartnerStatus::PendingL2 {
                return Err(invalid());
            }
            decide_step(
                &mut next,
                ApprovalLevel::L2,
                StepStatus::Approved,
                actor,
                comments.clone(),
                None,
                now,
            )
            .ok_or_else(invalid)?;
            next.status = PartnerStatus::Approved;
        }
        WorkflowCommand::RejectL2 { reason, comments } => {
            if record.status != PartnerStatus::PendingL2 {
                return Err(invalid());
            }
            reject_at_level(
                &mut next,
                ApprovalLevel::L2,
                RejectedLevel::L2,
                actor,
                reason,
                comments.clone(),
                now,
            )?;
        }
        WorkflowCommand::PutOnHold { reason } => {
            if !matches!(
                record.status,
                PartnerStatus::Draft | PartnerStatus::PendingL1 | PartnerStatus::PendingL2
            ) {
                return Err(invalid());
            }
            if reason.trim().is_empty() {
                return Err(ValidationIssue::ReasonRequired.into());
            }
            next.hold = Some(HoldInfo {
                reason: reason.clone(),
                placed_by: actor.id.clone(),
                placed_by_name: actor.name.clone(),
                placed_at: now,
                resume_status: record.status,
            });
            next.status = PartnerStatus::OnHold;
        }
        WorkflowCommand::ResumeFromHold => {
            if record.status != PartnerStatus::OnHold {
                return Err(invalid());
            }
            // No workflow step was consumed by the hold, so the partner
            // re-enters at exactly the level it left.
            let hold = next.hold.take().ok_or_else(invalid)?;
            next.status = hold.resume_status;
        }
        WorkflowCommand::SendBackToPartner { message } => {
            if !matches!(
                record.status,
                PartnerStatus::PendingL1 | PartnerStatus::PendingL2
            ) {
                return Err(invalid());
            }
            if record.created_by_role != Role::Partner {
                return Err(ValidationIssue::SelfRegisteredOnly.into());
            }
            if message.trim().is_empty() {
                return Err(ValidationIssue::MessageRequired.into());
            }
            next.notes.push(Note {
                note: message.clone(),
                visibility: NoteVisibility::PartnerVisible,
                created_by: actor.id.clone(),
                created_by_name: actor.name.clone(),
                created_at: now,
            });
            next.status = PartnerStatus::MoreInfoNeeded;
        }
        WorkflowCommand::RejectPermanently { reason } => {
            if record.status == PartnerStatus::Approved || record.permanently_rejected {
                return Err(invalid());
            }
            if reason.trim().is_empty() {
                return Err(ValidationIssue::ReasonRequired.into());
            }
            next.rejection = Some(RejectionInfo {
                reason: reason.clone(),
                level: RejectedLevel::Final,
                rejected_by: actor.id.clone(),
                rejected_by_name: actor.name.clone(),
                rejected_at: now,
            });
            next.permanently_rejected = true;
            next.hold = None;
            next.status = PartnerStatus::Rejected;
        }
        WorkflowCommand::Resubmit => {
            let resubmittable = matches!(record.status, PartnerStatus::MoreInfoNeeded)
                || (record.status == PartnerStatus::Rejected && !record.permanently_rejected);
            if !resubmittable {
                return Err(invalid());
            }
            next.approval_workflow
                .push(ApprovalStep::opened(ApprovalLevel::L1, now));
            next.status = PartnerStatus::PendingL1;
            next.rejection = None;
            next.submitted_at = Some(now);
        }
    }

    Ok(next)
}

/// Marks the open step at `level` as decided. Returns `None` when no open
/// step exists, which callers surface as an invalid transition.
fn decide_step(
    record: &mut PartnerRecord,
    level: ApprovalLevel,
    status: StepStatus,
    actor: &Actor,
    comments: Option<String>,
    rejection_reason: Option<String>,
    now: DateTime<Utc>,
) -> Option<()> {
    let step = record.current_step_mut(level).filter(|step| step.is_open())?;
    step.status = status;
    step.approver_id = Some(actor.id.clone());
    step.approver_name = Some(actor.name.clone());
    step.comments = comments;
    step.rejection_reason = rejection_reason;
    step.decided_at = Some(now);
    Some(())
}

fn reject_at_level(
    record: &mut PartnerRecord,
    level: ApprovalLevel,
    rejected_level: RejectedLevel,
    actor: &Actor,
    reason: &str,
    comments: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    if reason.trim().is_empty() {
        return Err(ValidationIssue::ReasonRequired.into());
    }
    decide_step(
        record,
        level,
        StepStatus::Rejected,
        actor,
        comments,
        Some(reason.to_string()),
        now,
    )
    .ok_or(WorkflowError::InvalidTransition {
        from: record.status,
        operation: match level {
            ApprovalLevel::L1 => Operation::RejectL1,
            ApprovalLevel::L2 => Operation::RejectL2,
        },
    })?;
    record.rejection = Some(RejectionInfo {
        reason: reason.to_string(),
        level: rejected_level,
        rejected_by: actor.id.clone(),
        rejected_by_name: actor.name.clone(),
        rejected_at: now,
    });
    record.rejection_count += 1;
    record.status = PartnerStatus::Rejected;
    Ok(())
}
