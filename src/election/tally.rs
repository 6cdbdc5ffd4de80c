use std::collections::HashMap;

use crate::error::Result;
use crate::model::{
    api::results::{CandidateResult, PositionResults},
    common::{ApprovalStatus, CandidateId, PartylistId},
    db::{Candidate, Position},
};
use crate::store::Store;

use super::{affiliation_name, partylist_names};

/// Count the votes of every approved candidate, grouped by position.
///
/// Positions come out in ballot order, all of them, even those nobody ran
/// for. Within a position, candidates are ordered by descending votes, then by
/// name. Candidates that are not approved are ignored.
pub fn tally(
    mut positions: Vec<Position>,
    candidates: Vec<Candidate>,
    partylists: &HashMap<PartylistId, String>,
    counts: &HashMap<CandidateId, u64>,
) -> Vec<PositionResults> {
    positions.sort_by_key(|p| p.order);

    let mut by_position: HashMap<_, Vec<CandidateResult>> = HashMap::new();
    for candidate in candidates {
        if candidate.status != ApprovalStatus::Approved {
            continue;
        }
        by_position
            .entry(candidate.position_id)
            .or_default()
            .push(CandidateResult {
                candidate_id: candidate.id,
                vote_count: counts.get(&candidate.id).copied().unwrap_or(0),
                partylist_name: affiliation_name(partylists, candidate.partylist_id),
                candidate_name: candidate.candidate.candidate_name,
            });
    }

    positions
        .into_iter()
        .map(|position| {
            let mut candidates = by_position.remove(&position.id).unwrap_or_default();
            candidates.sort_by(|a, b| {
                b.vote_count
                    .cmp(&a.vote_count)
                    .then_with(|| a.candidate_name.cmp(&b.candidate_name))
            });
            PositionResults {
                position_id: position.id,
                position_name: position.name,
                candidates,
            }
        })
        .collect()
}

/// Current election results. Read-only.
pub async fn results(store: &dyn Store) -> Result<Vec<PositionResults>> {
    let positions = store.positions().await?;
    let candidates = store.candidates(Some(ApprovalStatus::Approved)).await?;
    let partylists = partylist_names(store).await?;
    let counts = store.vote_counts().await?;
    Ok(tally(positions, candidates, &partylists, &counts))
}
