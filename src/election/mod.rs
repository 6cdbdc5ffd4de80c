//! Election workflow on top of a [`Store`].
//!
//! - [`registry`]: candidacy and partylist applications and their moderation.
//! - [`ballot`]: one ballot per voter.
//! - [`tally`]: vote counts per position.

pub mod ballot;
pub mod registry;
pub mod tally;

use std::collections::HashMap;

use crate::error::Result;
use crate::model::common::{PartylistId, INDEPENDENT};
use crate::store::Store;

/// Names of every partylist, regardless of status.
async fn partylist_names(store: &dyn Store) -> Result<HashMap<PartylistId, String>> {
    Ok(store
        .partylists(None)
        .await?
        .into_iter()
        .map(|p| (p.id, p.partylist.name))
        .collect())
}

/// The name shown for a candidate's affiliation.
fn affiliation_name(names: &HashMap<PartylistId, String>, partylist: Option<PartylistId>) -> String {
    partylist
        .and_then(|id| names.get(&id))
        .map_or_else(|| INDEPENDENT.to_string(), Clone::clone)
}
