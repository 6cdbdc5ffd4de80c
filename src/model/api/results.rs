use serde::{Deserialize, Serialize};

use crate::model::common::{CandidateId, PositionId};

/// Tallied votes for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    pub partylist_name: String,
    pub vote_count: u64,
}

/// Tallied votes for one position, candidates ordered by descending votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionResults {
    pub position_id: PositionId,
    pub position_name: String,
    pub candidates: Vec<CandidateResult>,
}
