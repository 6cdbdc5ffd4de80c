use log::info;
use rocket::{
    http::{Cookie, CookieJar, Status},
    response::status::Custom,
    serde::json::Json,
    Route, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::{AccountDesc, Credentials, Registration},
            Message,
        },
        auth::{Admin, AuthToken, Rights, Student, AUTH_TOKEN_COOKIE},
        db::Account,
    },
    store::{DynStore, Store},
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![register, login, logout, get_account]
}

#[post("/auth/register", data = "<registration>", format = "json")]
pub async fn register(
    registration: Json<Registration>,
    store: &State<DynStore>,
) -> Result<Custom<Json<Message>>> {
    let account = registration.0.into_account(Rights::Student)?;
    let account = store.insert_account(account).await?;
    info!("Registered account {} ({})", account.student_number, account.id);
    Ok(Custom(
        Status::Created,
        Json(Message::new("Registration successful")),
    ))
}

#[post("/auth/login", data = "<credentials>", format = "json")]
pub async fn login(
    cookies: &CookieJar<'_>,
    credentials: Json<Credentials>,
    store: &State<DynStore>,
    config: &State<Config>,
) -> Result<Json<AccountDesc>> {
    let account = store
        .account_by_student_number(credentials.student_number.trim())
        .await?
        .filter(|account| account.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::Unauthorized("Invalid student number or password".to_string())
        })?;

    let cookie = match account.role {
        Rights::Student => AuthToken::<Student>::new(&account).into_cookie(config)?,
        Rights::Admin => AuthToken::<Admin>::new(&account).into_cookie(config)?,
    };
    cookies.add(cookie);

    Ok(Json(account.into()))
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}

#[get("/account")]
async fn get_account(
    token: AuthToken<Student>,
    store: &State<DynStore>,
) -> Result<Json<AccountDesc>> {
    let account = account_for(&token, store.inner().as_ref()).await?;
    Ok(Json(account.into()))
}

/// The account a token was issued to.
pub(crate) async fn account_for<U>(token: &AuthToken<U>, store: &dyn Store) -> Result<Account> {
    store
        .account_by_id(token.id())
        .await?
        .ok_or_else(|| Error::not_found(format!("Account {}", token.id())))
}
