use chrono::Utc;
use log::info;

use crate::error::{Error, Result};
use crate::model::{
    api::ballot::BallotSubmission,
    common::{AccountId, ApprovalStatus},
    db::Vote,
};
use crate::store::Store;

/// Cast `voter`'s ballot, storing one vote per position. Returns the number of
/// votes stored.
///
/// Every choice is checked before anything is written, and the store writes
/// the whole ballot or none of it.
pub async fn submit_ballot(
    store: &dyn Store,
    voter: AccountId,
    ballot: BallotSubmission,
) -> Result<usize> {
    if ballot.votes.is_empty() {
        return Err(Error::BadRequest(
            "Please select at least one candidate".to_string(),
        ));
    }
    if store.has_voted(voter).await? {
        return Err(Error::AlreadyVoted);
    }

    let cast_at = Utc::now();
    let mut votes = Vec::with_capacity(ballot.votes.len());
    for (position_id, candidate_id) in ballot.votes {
        let position = store
            .position_by_id(position_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Position {position_id}")))?;
        let valid = store
            .candidate_by_id(candidate_id)
            .await?
            .map_or(false, |c| {
                c.status == ApprovalStatus::Approved && c.position_id == position_id
            });
        if !valid {
            return Err(Error::BadRequest(format!(
                "Candidate {candidate_id} is not running for {}",
                position.name
            )));
        }
        votes.push(Vote {
            voter_id: voter,
            candidate_id,
            position_id,
            cast_at,
        });
    }

    let count = votes.len();
    store.cast_ballot(voter, votes).await?;
    info!("Account {voter} cast a ballot with {count} votes");
    Ok(count)
}

/// Has `voter` already cast a ballot?
pub async fn has_voted(store: &dyn Store, voter: AccountId) -> Result<bool> {
    store.has_voted(voter).await
}
