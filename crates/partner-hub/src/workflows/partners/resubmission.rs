use serde::{Deserialize, Serialize};

use super::domain::{NoteVisibility, PartnerTier};
use super::repository::PartnerRecord;
use super::workflow::ValidationIssue;

/// Corrections a caller may bundle with a resubmission. Every field is
/// optional; absent fields leave the record untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub years_in_business: Option<u16>,
    #[serde(default)]
    pub employee_count: Option<u32>,
    #[serde(default)]
    pub expected_monthly_volume: Option<u32>,
    #[serde(default)]
    pub business_address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub contact_designation: Option<String>,
    #[serde(default)]
    pub tier: Option<PartnerTier>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ProfileUpdate::default()
    }
}

/// Guard in front of the `resubmit` transition: the workflow must have told
/// the partner what to fix. An active rejection reason or any
/// partner-visible note satisfies the check; records that carry neither have
/// nothing on file to correct against.
pub fn ensure_feedback_exists(record: &PartnerRecord) -> Result<(), ValidationIssue> {
    let has_rejection_reason = record
        .rejection
        .as_ref()
        .map(|info| !info.reason.trim().is_empty())
        .unwrap_or(false);
    let has_feedback_note = record
        .notes
        .iter()
        .any(|note| note.visibility == NoteVisibility::PartnerVisible);

    if has_rejection_reason || has_feedback_note {
        Ok(())
    } else {
        Err(ValidationIssue::NoReviewerFeedback)
    }
}

/// Applies bundled corrections in place. Runs on the successor record the
/// state machine produced, so a failed transition never applies edits.
pub fn apply_updates(record: &mut PartnerRecord, updates: &ProfileUpdate) {
    let profile = &mut record.profile;
    if let Some(value) = &updates.company_name {
        profile.company_name = value.clone();
    }
    if let Some(value) = &updates.business_type {
        profile.business_type = value.clone();
    }
    if let Some(value) = &updates.tax_id {
        profile.tax_id = value.clone();
    }
    if let Some(value) = updates.years_in_business {
        profile.years_in_business = value;
    }
    if let Some(value) = updates.employee_count {
        profile.employee_count = value;
    }
    if let Some(value) = updates.expected_monthly_volume {
        profile.expected_monthly_volume = value;
    }
    if let Some(value) = &updates.business_address {
        profile.business_address = value.clone();
    }
    if let Some(value) = &updates.website {
        profile.website = Some(value.clone());
    }
    if let Some(value) = &updates.contact_name {
        profile.contact.name = value.clone();
    }
    if let Some(value) = &updates.contact_email {
        profile.contact.email = value.clone();
    }
    if let Some(value) = &updates.contact_phone {
        profile.contact.phone = value.clone();
    }
    if let Some(value) = &updates.contact_designation {
        profile.contact.designation = value.clone();
    }
    if let Some(value) = updates.tier {
        record.tier = Some(value);
    }
}
