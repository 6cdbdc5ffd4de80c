use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

use log::{error, info, warn};
use rocket::{
    fairing::{Fairing, Info, Kind},
    http::StatusClass,
    request::{FromRequest, Outcome},
    route::Route,
    Data, Orbit, Request, Response, Rocket,
};

/// Identifies one request in the logs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RequestId(pub u64);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl RequestId {
    /// Atomically allocate a fresh ID.
    pub fn next() -> RequestId {
        static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(0);
        RequestId(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The ID of the given request, allocating one on first use.
    pub fn of<'r>(req: &'r Request<'_>) -> &'r RequestId {
        req.local_cache(RequestId::next)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for &'r RequestId {
    type Error = std::convert::Infallible;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(RequestId::of(req))
    }
}

/// How a route shows up in the logs, e.g. `submit_ballot (/ballot)`.
fn describe_route(route: Option<&Route>) -> String {
    match route {
        Some(Route {
            name: Some(name),
            uri,
            ..
        }) => format!("{name} ({uri})"),
        Some(route) => route.uri.to_string(),
        None => "UNKNOWN ROUTE".to_string(),
    }
}

/// Logs every request and response, tagged with its [`RequestId`].
#[derive(Debug, Copy, Clone)]
pub struct LoggerFairing;

#[rocket::async_trait]
impl Fairing for LoggerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Logger",
            kind: Kind::Liftoff | Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let config = rocket.config();
        let protocol = if config.tls_enabled() { "https" } else { "http" };
        info!(
            "Election server launched on {protocol}://{}:{}",
            config.address, config.port
        );
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let id = RequestId::of(req);
        info!("->req{id} {} {}", req.method(), req.uri());
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let id = RequestId::of(req);
        let status = res.status();
        let route = describe_route(req.route());
        match status.class() {
            StatusClass::ServerError => error!("<-rsp{id} {status} {route}"),
            StatusClass::ClientError => warn!("<-rsp{id} {status} {route}"),
            _ => info!("<-rsp{id} {status} {route}"),
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        warn!("Shutdown requested, closing the polls gracefully...");
    }
}

#[cfg(test)]
mod tests {
    use rocket::http::Method;

    use super::*;

    #[test]
    fn ids_are_distinct() {
        let first = RequestId::next();
        let second = RequestId::next();
        assert!(second > first);
    }

    #[test]
    fn routes_are_named() {
        fn handler<'r>(req: &'r Request, _: Data<'r>) -> rocket::route::BoxFuture<'r> {
            rocket::route::Outcome::from(req, ()).pin()
        }

        let mut route = Route::new(Method::Get, "/ballot", handler);
        assert_eq!(describe_route(Some(&route)), "/ballot");
        route.name = Some("ballot_status".into());
        assert_eq!(describe_route(Some(&route)), "ballot_status (/ballot)");
        assert_eq!(describe_route(None), "UNKNOWN ROUTE");
    }
}
