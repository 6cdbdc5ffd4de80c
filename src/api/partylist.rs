use rocket::{http::Status, response::status::Custom, serde::json::Json, Route, State};

use crate::{
    election::registry,
    error::Result,
    model::{
        api::{
            partylist::{PartylistRegistration, PartylistSummary},
            Message,
        },
        auth::{AuthToken, Student},
    },
    store::DynStore,
};

use super::auth::account_for;

pub fn routes() -> Vec<Route> {
    routes![get_partylists, register_partylist]
}

#[get("/partylists")]
async fn get_partylists(store: &State<DynStore>) -> Result<Json<Vec<PartylistSummary>>> {
    let partylists = registry::approved_partylists(store.inner().as_ref()).await?;
    Ok(Json(partylists))
}

#[post("/partylists", data = "<registration>", format = "json")]
async fn register_partylist(
    token: AuthToken<Student>,
    registration: Json<PartylistRegistration>,
    store: &State<DynStore>,
) -> Result<Custom<Json<Message>>> {
    let store = store.inner().as_ref();
    let account = account_for(&token, store).await?;
    registry::register_partylist(store, &account, registration.0).await?;
    Ok(Custom(
        Status::Created,
        Json(Message::new(
            "Partylist registered! It will be visible once approved by an admin.",
        )),
    ))
}

#[cfg(test)]
mod tests {
    use rocket::{http::ContentType, local::asynchronous::Client, serde::json::serde_json::json};

    use crate::error::ErrorBody;
    use crate::model::common::ApprovalStatus;

    use super::*;

    async fn submit(client: &Client, name: &str) -> Status {
        client
            .post(uri!(register_partylist))
            .header(ContentType::JSON)
            .body(json!(PartylistRegistration::example(name)).to_string())
            .dispatch()
            .await
            .status()
    }

    #[backend_test(student)]
    async fn registered_partylists_wait_for_approval(client: Client, store: DynStore) {
        assert_eq!(Status::Created, submit(&client, "Alyansa").await);

        let pending = store
            .partylists(Some(ApprovalStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].name, "Alyansa");

        // Not listed until approved.
        let response = client.get(uri!(get_partylists)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let listed: Vec<PartylistSummary> = response.into_json().await.unwrap();
        assert!(listed.is_empty());

        registry::approve_partylist(store.as_ref(), pending[0].id)
            .await
            .unwrap();
        let response = client.get(uri!(get_partylists)).dispatch().await;
        let listed: Vec<PartylistSummary> = response.into_json().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].partylist_name, "Alyansa");
    }

    #[backend_test(student)]
    async fn duplicate_name(client: Client) {
        assert_eq!(Status::Created, submit(&client, "Alyansa").await);

        let response = client
            .post(uri!(register_partylist))
            .header(ContentType::JSON)
            .body(json!(PartylistRegistration::example("Alyansa")).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        let body: ErrorBody = response.into_json().await.unwrap();
        assert_eq!(body.error, "Partylist name already exists");
    }

    #[backend_test(student)]
    async fn independent_is_reserved(client: Client, store: DynStore) {
        let response = client
            .post(uri!(register_partylist))
            .header(ContentType::JSON)
            .body(json!(PartylistRegistration::example("Independent")).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        let body: ErrorBody = response.into_json().await.unwrap();
        assert_eq!(body.error, "A partylist cannot be named Independent");
        assert!(store.partylists(None).await.unwrap().is_empty());
    }

    #[backend_test(student)]
    async fn missing_fields(client: Client) {
        let response = client
            .post(uri!(register_partylist))
            .header(ContentType::JSON)
            .body(
                json!({
                    "partylist_name": "Alyansa",
                    "president_name": "",
                    "president_student_id": "2020-12345",
                    "contact_email": "contact@example.edu",
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test]
    async fn registration_requires_login(client: Client) {
        assert_eq!(Status::Unauthorized, submit(&client, "Alyansa").await);
    }
}
