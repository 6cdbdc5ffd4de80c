use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::{AccountId, ApprovalStatus, PartylistId, INDEPENDENT},
    db::partylist::{NewPartylist, Partylist},
};

/// A partylist registration as submitted by a student.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PartylistRegistration {
    pub partylist_name: String,
    pub president_name: String,
    pub president_student_id: String,
    pub contact_email: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub platform: String,
}

impl PartylistRegistration {
    /// Validate the registration, producing a pending partylist.
    pub fn into_partylist(self, registered_by: AccountId) -> Result<NewPartylist> {
        let required = [
            &self.partylist_name,
            &self.president_name,
            &self.president_student_id,
            &self.contact_email,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(Error::BadRequest(
                "Please fill in all required fields".to_string(),
            ));
        }
        // Listings use this name for candidates without a partylist.
        if self.partylist_name.trim().eq_ignore_ascii_case(INDEPENDENT) {
            return Err(Error::BadRequest(format!(
                "A partylist cannot be named {INDEPENDENT}"
            )));
        }

        Ok(NewPartylist {
            name: self.partylist_name.trim().to_string(),
            president_name: self.president_name.trim().to_string(),
            president_student_number: self.president_student_id.trim().to_string(),
            contact_email: self.contact_email.trim().to_string(),
            contact_number: self.contact_number.trim().to_string(),
            platform: self.platform.trim().to_string(),
            registered_by,
            status: ApprovalStatus::Pending,
            registered_at: Utc::now(),
            decided_at: None,
            rejection_reason: None,
        })
    }
}

/// Public listing entry for an approved partylist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartylistSummary {
    pub partylist_id: PartylistId,
    pub partylist_name: String,
    pub president_name: String,
}

impl From<Partylist> for PartylistSummary {
    fn from(partylist: Partylist) -> Self {
        Self {
            partylist_id: partylist.id,
            partylist_name: partylist.partylist.name,
            president_name: partylist.partylist.president_name,
        }
    }
}

/// Full partylist details, for moderation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartylistDesc {
    pub partylist_id: PartylistId,
    pub partylist_name: String,
    pub president_name: String,
    pub president_student_id: String,
    pub contact_email: String,
    pub contact_number: String,
    pub platform: String,
    pub status: ApprovalStatus,
    pub registered_at: DateTime<Utc>,
    pub rejection_reason: Option<String>,
}

impl From<Partylist> for PartylistDesc {
    fn from(partylist: Partylist) -> Self {
        let id = partylist.id;
        let p = partylist.partylist;
        Self {
            partylist_id: id,
            partylist_name: p.name,
            president_name: p.president_name,
            president_student_id: p.president_student_number,
            contact_email: p.contact_email,
            contact_number: p.contact_number,
            platform: p.platform,
            status: p.status,
            registered_at: p.registered_at,
            rejection_reason: p.rejection_reason,
        }
    }
}
