use std::{convert::Infallible, sync::Arc};

use serde::Serialize;
use tokio::sync::Mutex;
use warp::{http::StatusCode, Filter, Rejection, Reply};

use crate::{
    config::AppConfig,
    devices::{DeviceTokenStore, UpdateFcmTokenRequest},
    error::ApiError,
    filters::uuid_param,
    health::health_route,
    types::ResourceId,
};

/// Largest JSON body accepted by the device routes.
pub const MAX_BODY_BYTES: u64 = 16 * 1024;

pub type SharedStore = Arc<Mutex<dyn DeviceTokenStore>>;

/// Shared state behind the routes. The config is loaded once by the caller
/// and handed in here; nothing below re-reads the environment.
#[derive(Clone)]
pub struct Api {
    pub(crate) config: Arc<AppConfig>,
    pub(crate) store: SharedStore,
}

impl Api {
    pub fn new(config: AppConfig, store: SharedStore) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

pub fn build_api_route_filter(
    api: &Api,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let update_fcm_token = warp::patch()
        .and(warp::path("users"))
        .and(uuid_param())
        .and(warp::path("fcm-token"))
        .and(warp::path::end())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_store(api.store.clone()))
        .and_then(update_fcm_token);

    health_route().or(update_fcm_token)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    error: &'static str,
    message: String,
}

fn error_reply(
    status: StatusCode,
    message: String,
) -> warp::reply::WithStatus<warp::reply::Json> {
    let body = ErrorBody {
        status_code: status.as_u16(),
        error: status.canonical_reason().unwrap_or("Error"),
        message,
    };

    warp::reply::with_status(warp::reply::json(&body), status)
}

/// Turn crate rejections into JSON error responses. Anything else is handed
/// back to warp untouched.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(api_error) = err.find::<ApiError>() {
        let (status, message) = match api_error {
            ApiError::Validation(validation_error) => {
                tracing::debug!(value = validation_error.value(), "rejected malformed parameter");
                (StatusCode::BAD_REQUEST, validation_error.to_string())
            }
            ApiError::StoreError { source } => {
                tracing::error!(error = %source, "device token store failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an unknown error has occurred".to_owned(),
                )
            }
        };
        return Ok(error_reply(status, message));
    }

    if let Some(body_error) = err.find::<warp::body::BodyDeserializeError>() {
        tracing::debug!(error = %body_error, "rejected malformed request body");
        return Ok(error_reply(StatusCode::BAD_REQUEST, body_error.to_string()));
    }

    Err(err)
}

async fn update_fcm_token(
    user_id: ResourceId,
    input: UpdateFcmTokenRequest,
    store: SharedStore,
) -> Result<impl Reply, Rejection> {
    store
        .lock()
        .await
        .update_fcm_token(&user_id, &input.fcm_token)
        .await
        .map_err(ApiError::from)?;

    tracing::info!(%user_id, "updated push registration token");

    Ok(StatusCode::NO_CONTENT)
}

// functor that adds a reference to the device store into the filter chain
fn with_store(
    store: SharedStore,
) -> impl Filter<Extract = (SharedStore,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, error::Error};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::test_support::RecordedLevels;

    #[derive(Default)]
    struct MemoryStore {
        tokens: HashMap<ResourceId, String>,
    }

    #[async_trait]
    impl DeviceTokenStore for MemoryStore {
        async fn update_fcm_token(
            &mut self,
            user_id: &ResourceId,
            fcm_token: &str,
        ) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.tokens.insert(user_id.clone(), fcm_token.to_owned());
            Ok(())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl DeviceTokenStore for BrokenStore {
        async fn update_fcm_token(
            &mut self,
            _user_id: &ResourceId,
            _fcm_token: &str,
        ) -> Result<(), Box<dyn Error + Send + Sync>> {
            Err("connection reset".into())
        }
    }

    const USER: &str = "550e8400-e29b-41d4-a716-446655440000";

    fn routes(
        store: SharedStore,
    ) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let api = Api::new(AppConfig::from_lookup(|_| None).unwrap(), store);
        build_api_route_filter(&api).recover(handle_rejection)
    }

    #[tokio::test]
    async fn stores_token_for_valid_user() {
        let store = Arc::new(Mutex::new(MemoryStore::default()));

        let response = warp::test::request()
            .method("PATCH")
            .path(&format!("/users/{USER}/fcm-token"))
            .json(&json!({ "fcmToken": "device-token-1" }))
            .reply(&routes(store.clone()))
            .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            store.lock().await.tokens[&ResourceId(USER.into())],
            "device-token-1"
        );
    }

    #[tokio::test]
    async fn malformed_user_id_never_reaches_the_store() {
        let store = Arc::new(Mutex::new(MemoryStore::default()));

        let response = warp::test::request()
            .method("PATCH")
            .path("/users/not-a-uuid/fcm-token")
            .json(&json!({ "fcmToken": "device-token-1" }))
            .reply(&routes(store.clone()))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["message"], "Invalid UUID format: not-a-uuid");
        assert!(store.lock().await.tokens.is_empty());
    }

    #[tokio::test]
    async fn body_must_carry_a_string_token() {
        let store = Arc::new(Mutex::new(MemoryStore::default()));
        let routes = routes(store.clone());

        for body in [json!({}), json!({ "fcmToken": 7 }), json!({ "fcmToken": null })] {
            let response = warp::test::request()
                .method("PATCH")
                .path(&format!("/users/{USER}/fcm-token"))
                .json(&body)
                .reply(&routes)
                .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");
        }
        assert!(store.lock().await.tokens.is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_a_server_error() {
        let response = warp::test::request()
            .method("PATCH")
            .path(&format!("/users/{USER}/fcm-token"))
            .json(&json!({ "fcmToken": "device-token-1" }))
            .reply(&routes(Arc::new(Mutex::new(BrokenStore))))
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["message"], "an unknown error has occurred");
    }

    #[tokio::test]
    async fn health_is_served_alongside() {
        let store = Arc::new(Mutex::new(MemoryStore::default()));

        let response = warp::test::request()
            .path("/health")
            .reply(&routes(store))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_id_is_logged_as_a_client_fault() {
        let store = Arc::new(Mutex::new(MemoryStore::default()));
        let routes = routes(store);
        let (levels, _guard) = RecordedLevels::install();

        let response = warp::test::request()
            .method("PATCH")
            .path("/users/not-a-uuid/fcm-token")
            .json(&json!({ "fcmToken": "device-token-1" }))
            .reply(&routes)
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(levels.contains(tracing::Level::DEBUG));
        assert!(!levels.contains(tracing::Level::ERROR));
    }

    #[tokio::test]
    async fn store_failure_is_logged_as_an_error() {
        let routes = routes(Arc::new(Mutex::new(BrokenStore)));
        let (levels, _guard) = RecordedLevels::install();

        warp::test::request()
            .method("PATCH")
            .path(&format!("/users/{USER}/fcm-token"))
            .json(&json!({ "fcmToken": "device-token-1" }))
            .reply(&routes)
            .await;

        assert!(levels.contains(tracing::Level::ERROR));
    }

    #[tokio::test]
    async fn empty_user_id_is_not_routed() {
        let store = Arc::new(Mutex::new(MemoryStore::default()));

        let response = warp::test::request()
            .method("PATCH")
            .path("/users//fcm-token")
            .json(&json!({ "fcmToken": "device-token-1" }))
            .reply(&routes(store.clone()))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(store.lock().await.tokens.is_empty());
    }

    #[test]
    fn api_holds_the_config_it_was_given() {
        let config = AppConfig::from_lookup(|key| (key == "PORT").then(|| "8081".to_owned()))
            .unwrap();
        let api = Api::new(config.clone(), Arc::new(Mutex::new(MemoryStore::default())));

        assert_eq!(api.config(), &config);
        assert_eq!(api.config().server.bind.port(), 8081);
    }
}
