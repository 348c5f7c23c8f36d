use serde::{Deserialize, Serialize};

use super::domain::{Actor, Role};
use super::repository::PartnerRecord;

/// Every gated operation the engine exposes. The single table below replaces
/// the role checks that were previously scattered across callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreatePartner,
    AssignTier,
    SendToL1,
    ApproveL1,
    RejectL1,
    ApproveL2,
    RejectL2,
    PutOnHold,
    ResumeFromHold,
    SendBackToPartner,
    RejectPermanently,
    Resubmit,
    UploadDocument,
    VerifyDocument,
    AssignProducts,
    AddNote,
    ViewPartner,
    ViewDirectory,
    ViewL1Queue,
    ViewL2Queue,
}

impl Operation {
    pub const fn label(self) -> &'static str {
        match self {
            Operation::CreatePartner => "create_partner",
            Operation::AssignTier => "assign_tier",
            Operation::SendToL1 => "send_to_l1",
            Operation::ApproveL1 => "approve_l1",
            Operation::RejectL1 => "reject_l1",
            Operation::ApproveL2 => "approve_l2",
            Operation::RejectL2 => "reject_l2",
            Operation::PutOnHold => "put_on_hold",
            Operation::ResumeFromHold => "resume_from_hold",
            Operation::SendBackToPartner => "send_back_to_partner",
            Operation::RejectPermanently => "reject_permanently",
            Operation::Resubmit => "resubmit",
            Operation::UploadDocument => "upload_document",
            Operation::VerifyDocument => "verify_document",
            Operation::AssignProducts => "assign_products",
            Operation::AddNote => "add_note",
            Operation::ViewPartner => "view_partner",
            Operation::ViewDirectory => "view_directory",
            Operation::ViewL1Queue => "view_l1_queue",
            Operation::ViewL2Queue => "view_l2_queue",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("role {actor_role} may not perform {op}", actor_role = .role.label(), op = .operation.label())]
pub struct AccessDenied {
    pub role: Role,
    pub operation: Operation,
}

/// Role-only portion of the capability matrix. Ownership-sensitive rules are
/// layered on in [`authorize`].
pub fn allows(role: Role, operation: Operation) -> bool {
    use Operation::*;
    use Role::*;

    match operation {
        CreatePartner | AssignTier | SendToL1 | ResumeFromHold | SendBackToPartner
        | RejectPermanently | AssignProducts => matches!(role, Admin | PartnerManager),
        ApproveL1 | RejectL1 => matches!(role, Admin | L1Approver),
        ApproveL2 | RejectL2 => matches!(role, Admin | L2Approver),
        PutOnHold | VerifyDocument => {
            matches!(role, Admin | PartnerManager | L1Approver | L2Approver)
        }
        Resubmit | UploadDocument => matches!(role, Admin | PartnerManager | Partner),
        AddNote => role.is_internal(),
        ViewPartner | ViewDirectory => true,
        ViewL1Queue => matches!(role, Admin | L1Approver),
        ViewL2Queue => matches!(role, Admin | L2Approver),
    }
}

/// Allow/deny decision for one actor, operation, and (optionally) the record
/// being touched. Partner-role callers only ever act on records they own.
pub fn authorize(
    actor: &Actor,
    operation: Operation,
    record: Option<&PartnerRecord>,
) -> Result<(), AccessDenied> {
    let denied = AccessDenied {
        role: actor.role,
        operation,
    };

    if !allows(actor.role, operation) {
        return Err(denied);
    }

    if actor.role == Role::Partner {
        let owns = record
            .and_then(|record| record.owner_user_id.as_deref())
            .map(|owner| owner == actor.id)
            .unwrap_or(false);
        // Directory listings are scoped to owned records by the caller
        // instead of rejected outright.
        if !owns && !matches!(operation, Operation::ViewDirectory) {
            return Err(denied);
        }
    }

    Ok(())
}
