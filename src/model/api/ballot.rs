use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::common::{CandidateId, PositionId};

/// A voter's ballot: the chosen candidate for each position voted on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct BallotSubmission {
    #[serde(default)]
    pub votes: BTreeMap<PositionId, CandidateId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct BallotStatus {
    pub has_voted: bool,
}
