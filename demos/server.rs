use std::{collections::HashMap, error::Error, sync::Arc};

use async_trait::async_trait;
use homeservices_gate::{
    build_api_route_filter, handle_rejection, Api, AppConfig, DeviceTokenStore, ResourceId,
};
use tokio::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(true))
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        bind = %config.server.bind,
        issuer = config.jwt.issuer(),
        access_expiration = config.jwt.access_expiration(),
        "starting server"
    );

    let store = Arc::new(Mutex::new(InMemoryDeviceTokens::default()));
    let api = Api::new(config, store);

    let routes = build_api_route_filter(&api)
        .recover(handle_rejection)
        .with(warp::trace::request());

    warp::serve(routes).run(api.config().server.bind).await;

    Ok(())
}

#[derive(Default)]
struct InMemoryDeviceTokens {
    tokens: HashMap<ResourceId, String>,
}

#[async_trait]
impl DeviceTokenStore for InMemoryDeviceTokens {
    async fn update_fcm_token(
        &mut self,
        user_id: &ResourceId,
        fcm_token: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.tokens.insert(user_id.clone(), fcm_token.to_owned());
        Ok(())
    }
}
