use rocket::{serde::json::Json, Route, State};

use crate::{
    election::{registry, tally},
    error::Result,
    model::{
        api::{
            candidacy::{PendingCandidate, Rejection},
            partylist::PartylistDesc,
            results::PositionResults,
            Message,
        },
        auth::{Admin, AuthToken},
        common::{CandidateId, PartylistId},
    },
    store::DynStore,
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![
        pending_partylists,
        approve_partylist,
        reject_partylist,
        pending_candidates,
        approve_candidate,
        reject_candidate,
        get_results,
    ]
}

#[get("/admin/partylists/pending")]
async fn pending_partylists(
    _token: AuthToken<Admin>,
    store: &State<DynStore>,
) -> Result<Json<Vec<PartylistDesc>>> {
    let partylists = registry::pending_partylists(store.inner().as_ref()).await?;
    Ok(Json(partylists))
}

#[post("/admin/partylists/<partylist_id>/approve")]
async fn approve_partylist(
    _token: AuthToken<Admin>,
    partylist_id: PartylistId,
    store: &State<DynStore>,
) -> Result<Json<Message>> {
    let partylist = registry::approve_partylist(store.inner().as_ref(), partylist_id).await?;
    Ok(Json(Message::new(format!(
        "Partylist {} approved",
        partylist.name
    ))))
}

/// The rejection reason is optional, and so is the body carrying it.
#[post("/admin/partylists/<partylist_id>/reject", data = "<rejection>")]
async fn reject_partylist(
    _token: AuthToken<Admin>,
    partylist_id: PartylistId,
    rejection: Option<Json<Rejection>>,
    store: &State<DynStore>,
) -> Result<Json<Message>> {
    let reason = rejection.map(|r| r.0.reason).unwrap_or_default();
    let partylist =
        registry::reject_partylist(store.inner().as_ref(), partylist_id, reason).await?;
    Ok(Json(Message::new(format!(
        "Partylist {} rejected",
        partylist.name
    ))))
}

#[get("/admin/candidates/pending")]
async fn pending_candidates(
    _token: AuthToken<Admin>,
    store: &State<DynStore>,
) -> Result<Json<Vec<PendingCandidate>>> {
    let candidates = registry::pending_candidates(store.inner().as_ref()).await?;
    Ok(Json(candidates))
}

#[post("/admin/candidates/<candidate_id>/approve")]
async fn approve_candidate(
    _token: AuthToken<Admin>,
    candidate_id: CandidateId,
    store: &State<DynStore>,
    config: &State<Config>,
) -> Result<Json<Message>> {
    let candidate = registry::approve_candidate(
        store.inner().as_ref(),
        candidate_id,
        config.max_candidates_per_position(),
    )
    .await?;
    Ok(Json(Message::new(format!(
        "Candidate {} approved",
        candidate.candidate_name
    ))))
}

#[post("/admin/candidates/<candidate_id>/reject", data = "<rejection>")]
async fn reject_candidate(
    _token: AuthToken<Admin>,
    candidate_id: CandidateId,
    rejection: Option<Json<Rejection>>,
    store: &State<DynStore>,
) -> Result<Json<Message>> {
    let reason = rejection.map(|r| r.0.reason).unwrap_or_default();
    let candidate =
        registry::reject_candidate(store.inner().as_ref(), candidate_id, reason).await?;
    Ok(Json(Message::new(format!(
        "Candidate {} rejected",
        candidate.candidate_name
    ))))
}

#[get("/admin/results")]
async fn get_results(
    _token: AuthToken<Admin>,
    store: &State<DynStore>,
) -> Result<Json<Vec<PositionResults>>> {
    let results = tally::results(store.inner().as_ref()).await?;
    Ok(Json(results))
}
