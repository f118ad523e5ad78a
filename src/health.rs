use serde::Serialize;
use time::OffsetDateTime;
use warp::{Filter, Rejection, Reply};

/// Body of the liveness probe. Built fresh for every request.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl HealthStatus {
    pub fn now() -> Self {
        Self {
            status: "ok",
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// `GET /health`
pub fn health_route() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::json(&HealthStatus::now()))
}
