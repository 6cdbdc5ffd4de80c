use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::{serde_helpers::chrono_datetime_as_bson_datetime, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::model::common::{AccountId, ApprovalStatus, Decision, PartylistId};

/// Core partylist data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartylistCore {
    pub name: String,
    pub president_name: String,
    pub president_student_number: String,
    pub contact_email: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub platform: String,
    /// The account that submitted the registration.
    pub registered_by: AccountId,
    pub status: ApprovalStatus,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub registered_at: DateTime<Utc>,
    #[serde(default)]
    pub decided_at: Option<BsonDateTime>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

impl PartylistCore {
    /// Apply an admin decision. The caller checks the record is pending.
    pub fn decide(&mut self, decision: &Decision, at: DateTime<Utc>) {
        self.status = decision.status();
        self.decided_at = Some(BsonDateTime::from_chrono(at));
        self.rejection_reason = decision.reason().map(str::to_string);
    }
}

/// A partylist without an ID.
pub type NewPartylist = PartylistCore;

/// A partylist from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partylist {
    #[serde(rename = "_id")]
    pub id: PartylistId,
    #[serde(flatten)]
    pub partylist: PartylistCore,
}

impl Partylist {
    pub fn new(id: PartylistId, partylist: NewPartylist) -> Self {
        Self { id, partylist }
    }
}

impl Deref for Partylist {
    type Target = PartylistCore;

    fn deref(&self) -> &Self::Target {
        &self.partylist
    }
}

impl DerefMut for Partylist {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.partylist
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl PartylistCore {
        pub fn example(name: &str) -> Self {
            Self {
                name: name.to_string(),
                president_name: "Jose Rizal".to_string(),
                president_student_number: "2020-11111".to_string(),
                contact_email: "slate@example.edu".to_string(),
                contact_number: String::new(),
                platform: "Transparent student governance".to_string(),
                registered_by: 1,
                status: ApprovalStatus::Pending,
                registered_at: Utc::now(),
                decided_at: None,
                rejection_reason: None,
            }
        }
    }
}
