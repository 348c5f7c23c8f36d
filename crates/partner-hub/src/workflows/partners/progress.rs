use super::domain::PartnerStatus;
use super::repository::PartnerRecord;

const BASIC_INFO_WEIGHT: u8 = 10;
const DOCUMENTS_WEIGHT: u8 = 20;
const TIER_WEIGHT: u8 = 10;
const SUBMITTED_WEIGHT: u8 = 15;
const L1_APPROVED_WEIGHT: u8 = 15;
const L2_APPROVED_WEIGHT: u8 = 15;
const PRODUCTS_WEIGHT: u8 = 15;

/// Documents needed before the checklist credits the paperwork milestone.
const REQUIRED_DOCUMENT_COUNT: usize = 2;

/// Derived onboarding completeness, recomputed after every mutation and
/// never writable on its own.
pub fn onboarding_progress(record: &PartnerRecord) -> u8 {
    let mut progress: u8 = 0;

    if !record.profile.company_name.trim().is_empty()
        && !record.profile.contact.email.trim().is_empty()
    {
        progress += BASIC_INFO_WEIGHT;
    }

    if record.documents.len() >= REQUIRED_DOCUMENT_COUNT {
        progress += DOCUMENTS_WEIGHT;
    }

    if record.tier.is_some() {
        progress += TIER_WEIGHT;
    }

    // Milestones credit the furthest stage reached, looking through a hold
    // at the level the partner would resume to.
    let stage = match record.status {
        PartnerStatus::OnHold => record
            .hold
            .as_ref()
            .map(|hold| hold.resume_status)
            .unwrap_or(record.status),
        other => other,
    };

    if matches!(
        stage,
        PartnerStatus::PendingL1 | PartnerStatus::PendingL2 | PartnerStatus::Approved
    ) {
        progress += SUBMITTED_WEIGHT;
    }
    if matches!(stage, PartnerStatus::PendingL2 | PartnerStatus::Approved) {
        progress += L1_APPROVED_WEIGHT;
    }
    if stage == PartnerStatus::Approved {
        progress += L2_APPROVED_WEIGHT;
    }

    if !record.assigned_products.is_empty() {
        progress += PRODUCTS_WEIGHT;
    }

    progress.min(100)
}
