use std::error::Error;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::ResourceId;

#[async_trait]
pub trait DeviceTokenStore: Send + Sync + 'static {
    /// Replace the push-messaging registration token held for the given user.
    /// The token is opaque and stored as received.
    async fn update_fcm_token(
        &mut self,
        user_id: &ResourceId,
        fcm_token: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFcmTokenRequest {
    pub fcm_token: String,
}
