use rocket::{http::Status, response::status::Custom, serde::json::Json, Route, State};

use crate::{
    election::ballot,
    error::Result,
    model::{
        api::{
            ballot::{BallotStatus, BallotSubmission},
            Message,
        },
        auth::{AuthToken, Student},
    },
    store::DynStore,
};

pub fn routes() -> Vec<Route> {
    routes![submit_ballot, ballot_status]
}

#[post("/ballot", data = "<submission>", format = "json")]
async fn submit_ballot(
    token: AuthToken<Student>,
    submission: Json<BallotSubmission>,
    store: &State<DynStore>,
) -> Result<Custom<Json<Message>>> {
    ballot::submit_ballot(store.inner().as_ref(), token.id(), submission.0).await?;
    Ok(Custom(
        Status::Created,
        Json(Message::new("Your vote has been submitted successfully!")),
    ))
}

#[get("/ballot")]
async fn ballot_status(
    token: AuthToken<Student>,
    store: &State<DynStore>,
) -> Result<Json<BallotStatus>> {
    let has_voted = ballot::has_voted(store.inner().as_ref(), token.id()).await?;
    Ok(Json(BallotStatus { has_voted }))
}
