//! HTTP implementation of the gateway

use super::{Gateway, PutUserParams, VoteParams};
use crate::config::ApiConfig;
use crate::error::GatewayError;
use crate::types::{EntityId, User, UserProfile};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use wappu_core::command::BoxFuture;

/// Wappu API client over HTTP and JSON
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    api_url: String,
}

impl HttpGateway {
    /// Create a gateway for the configured API.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RequestFailed`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            api_url: format!("{}/api", config.base_url.trim_end_matches('/')),
        })
    }

    /// Base URL every route hangs off
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn send(request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(GatewayError::Status {
                status: status.as_u16(),
                message: body,
            })
        }
    }

    async fn json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, GatewayError> {
        Self::send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

impl Gateway for HttpGateway {
    fn fetch_models(&self, resource: &'static str) -> BoxFuture<'_, Result<Vec<Value>, GatewayError>> {
        Box::pin(async move {
            tracing::debug!(resource, "GET collection");
            Self::json(self.client.get(format!("{}/{resource}", self.api_url))).await
        })
    }

    fn put_user(&self, params: PutUserParams) -> BoxFuture<'_, Result<Value, GatewayError>> {
        Box::pin(async move {
            tracing::debug!(uuid = %params.uuid, "PUT user");
            let request = self
                .client
                .put(format!("{}/users/{}", self.api_url, params.uuid))
                .json(&params);
            let response = Self::send(request).await?;
            let body = response
                .text()
                .await
                .map_err(|e| GatewayError::Decode(e.to_string()))?;
            if body.trim().is_empty() {
                Ok(Value::Null)
            } else {
                Ok(serde_json::from_str(&body)?)
            }
        })
    }

    fn get_user(&self, uuid: String) -> BoxFuture<'_, Result<User, GatewayError>> {
        Box::pin(async move {
            tracing::debug!(%uuid, "GET user");
            Self::json(self.client.get(format!("{}/users/{uuid}", self.api_url))).await
        })
    }

    fn get_user_profile(&self, user_id: EntityId) -> BoxFuture<'_, Result<UserProfile, GatewayError>> {
        Box::pin(async move {
            tracing::debug!(%user_id, "GET user profile");
            Self::json(self.client.get(format!("{}/users/{user_id}/images", self.api_url))).await
        })
    }

    fn put_vote(&self, params: VoteParams) -> BoxFuture<'_, Result<(), GatewayError>> {
        Box::pin(async move {
            tracing::debug!(feed_item_id = %params.feed_item_id, value = params.value, "PUT vote");
            Self::send(self.client.put(format!("{}/votes", self.api_url)).json(&params))
                .await
                .map(|_| ())
        })
    }
}
