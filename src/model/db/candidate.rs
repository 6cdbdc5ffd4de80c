use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::{serde_helpers::chrono_datetime_as_bson_datetime, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::model::common::{
    AccountId, ApprovalStatus, CandidateId, Decision, PartylistId, PositionId,
};

/// Core candidacy data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub account_id: AccountId,
    pub student_number: String,
    pub candidate_name: String,
    pub email: String,
    pub college: String,
    pub year_level: String,
    pub position_id: PositionId,
    /// `None` for independent candidates.
    #[serde(default)]
    pub partylist_id: Option<PartylistId>,
    pub platform: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub status: ApprovalStatus,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub applied_at: DateTime<Utc>,
    #[serde(default)]
    pub decided_at: Option<BsonDateTime>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

impl CandidateCore {
    pub fn is_independent(&self) -> bool {
        self.partylist_id.is_none()
    }

    /// Apply an admin decision. The caller checks the record is pending.
    pub fn decide(&mut self, decision: &Decision, at: DateTime<Utc>) {
        self.status = decision.status();
        self.decided_at = Some(BsonDateTime::from_chrono(at));
        self.rejection_reason = decision.reason().map(str::to_string);
    }
}

/// A candidacy without an ID.
pub type NewCandidate = CandidateCore;

/// A candidacy from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: CandidateId,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Candidate {
    pub fn new(id: CandidateId, candidate: NewCandidate) -> Self {
        Self { id, candidate }
    }
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}
