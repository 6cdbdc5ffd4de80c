use rocket::{http::Status, response::status::Custom, serde::json::Json, Route, State};

use crate::{
    election::registry,
    error::Result,
    model::{
        api::{
            candidacy::{CandidacyApplication, PositionCandidates},
            Message, PositionDesc,
        },
        auth::{AuthToken, Student},
    },
    store::DynStore,
    Config,
};

use super::auth::account_for;

pub fn routes() -> Vec<Route> {
    routes![get_positions, get_candidates, apply]
}

#[get("/positions")]
async fn get_positions(store: &State<DynStore>) -> Result<Json<Vec<PositionDesc>>> {
    let positions = store.positions().await?;
    Ok(Json(positions.into_iter().map(Into::into).collect()))
}

#[get("/candidates")]
async fn get_candidates(store: &State<DynStore>) -> Result<Json<Vec<PositionCandidates>>> {
    let candidates = registry::approved_candidates(store.inner().as_ref()).await?;
    Ok(Json(candidates))
}

#[post("/candidacy", data = "<application>", format = "json")]
async fn apply(
    token: AuthToken<Student>,
    application: Json<CandidacyApplication>,
    store: &State<DynStore>,
    config: &State<Config>,
) -> Result<Custom<Json<Message>>> {
    let store = store.inner().as_ref();
    let account = account_for(&token, store).await?;
    registry::apply_for_candidacy(
        store,
        &account,
        application.0,
        config.max_candidates_per_position(),
    )
    .await?;
    Ok(Custom(
        Status::Created,
        Json(Message::new(
            "Application submitted! Please wait for admin approval.",
        )),
    ))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::ContentType,
        local::asynchronous::Client,
        serde::json::{serde_json, serde_json::json},
    };

    use crate::config::EXAMPLE_POSITIONS;
    use crate::error::ErrorBody;
    use crate::model::{
        common::ApprovalStatus,
        db::{NewCandidate, NewPartylist},
    };
    use crate::testing::EXAMPLE_STUDENT;

    use super::*;

    async fn positions(client: &Client) -> Vec<PositionDesc> {
        client
            .get(uri!(get_positions))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap()
    }

    async fn submit(client: &Client, application: &CandidacyApplication) -> (Status, String) {
        let response = client
            .post(uri!(apply))
            .header(ContentType::JSON)
            .body(json!(application).to_string())
            .dispatch()
            .await;
        let status = response.status();
        let body = response.into_string().await.unwrap_or_default();
        (status, body)
    }

    #[backend_test]
    async fn positions_in_ballot_order(client: Client) {
        let names: Vec<_> = positions(&client)
            .await
            .into_iter()
            .map(|p| p.position_name)
            .collect();
        assert_eq!(names, EXAMPLE_POSITIONS);
    }

    #[backend_test(student)]
    async fn application_uses_logged_in_student(client: Client, store: DynStore) {
        let president = positions(&client).await[0].position_id;

        let (status, _) = submit(&client, &CandidacyApplication::example(president)).await;
        assert_eq!(Status::Created, status);

        let pending = store
            .candidates(Some(ApprovalStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].student_number, EXAMPLE_STUDENT);
        assert_eq!(pending[0].position_id, president);

        // Pending candidates are not public.
        let response = client.get(uri!(get_candidates)).dispatch().await;
        let listed: Vec<PositionCandidates> = response.into_json().await.unwrap();
        assert!(listed.is_empty());

        // Applying again for the same position is rejected.
        let (status, body) = submit(&client, &CandidacyApplication::example(president)).await;
        assert_eq!(Status::BadRequest, status);
        let body: ErrorBody = serde_json::from_str(&body).unwrap();
        assert_eq!(body.error, "You have already applied for this position");
    }

    #[backend_test(student)]
    async fn full_position(client: Client, store: DynStore) {
        let president = positions(&client).await[0].position_id;

        // Fill every slot with approved candidates.
        for n in 0..5 {
            let candidate = store
                .insert_candidate(NewCandidate::example(1000 + n, president))
                .await
                .unwrap();
            registry::approve_candidate(store.as_ref(), candidate.id, 5)
                .await
                .unwrap();
        }

        let (status, body) = submit(&client, &CandidacyApplication::example(president)).await;
        assert_eq!(Status::BadRequest, status);
        let body: ErrorBody = serde_json::from_str(&body).unwrap();
        assert_eq!(
            body.error,
            "This position already has the maximum number of candidates (5)"
        );

        let response = client.get(uri!(get_candidates)).dispatch().await;
        let listed: Vec<PositionCandidates> = response.into_json().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].position_id, president);
        assert_eq!(listed[0].candidates.len(), 5);
    }

    #[backend_test(student)]
    async fn unknown_position_or_partylist(client: Client, store: DynStore) {
        let (status, _) = submit(&client, &CandidacyApplication::example(999)).await;
        assert_eq!(Status::NotFound, status);

        let president = positions(&client).await[0].position_id;
        let (status, _) = submit(
            &client,
            &CandidacyApplication::example_for_partylist(president, 999),
        )
        .await;
        assert_eq!(Status::NotFound, status);

        // An existing but unapproved partylist.
        let partylist = store
            .insert_partylist(NewPartylist::example("Alyansa"))
            .await
            .unwrap();
        let (status, _) = submit(
            &client,
            &CandidacyApplication::example_for_partylist(president, partylist.id),
        )
        .await;
        assert_eq!(Status::BadRequest, status);

        assert!(store.candidates(None).await.unwrap().is_empty());
    }
}
