//! HTTP client for the projection backend.
//!
//! Thin typed wrapper over `reqwest`: one method per endpoint, JSON in and
//! out, and every failure classified into a [`ClientError`] kind. There
//! are no retries; the request timeout from configuration is the only
//! deadline.

use carbonscape_core::config::BackendConfig;
use carbonscape_types::{
    AuthResponse, ErrorBody, ItemCounts, ItemsPatch, ItemsPatchResponse, ItemsResponse,
    LoginRequest, ProjectionEnvelope, RawProjection, SignupRequest, SuggestionsResponse,
    TakeActionRequest, TakeActionResponse, UserId,
};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::ClientError;

/// Client for the projection backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Build a client for `config.base_url` with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NetworkUnavailable`] if the TLS backend cannot
    /// be initialized.
    pub fn new(config: &BackendConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /projections/{id}`: the stored projection, raw convention.
    pub async fn fetch_projection(&self, user: &UserId) -> Result<RawProjection, ClientError> {
        let envelope: ProjectionEnvelope =
            call(self.request(Method::GET, &format!("/projections/{user}"))).await?;
        Ok(envelope.projection)
    }

    /// `GET /projection/{id}`: recompute the projection from current items.
    pub async fn compute_projection(&self, user: &UserId) -> Result<RawProjection, ClientError> {
        let envelope: ProjectionEnvelope =
            call(self.request(Method::GET, &format!("/projection/{user}"))).await?;
        Ok(envelope.projection)
    }

    /// `POST /login`.
    pub async fn login(&self, email: &str) -> Result<AuthResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_owned(),
        };
        self.authenticate("/login", &body).await
    }

    /// `POST /signup`.
    pub async fn signup(&self, name: &str, email: &str) -> Result<AuthResponse, ClientError> {
        let body = SignupRequest {
            name: name.to_owned(),
            email: email.to_owned(),
        };
        self.authenticate("/signup", &body).await
    }

    /// `GET /items/{id}`.
    pub async fn items(&self, user: &UserId) -> Result<ItemCounts, ClientError> {
        let response: ItemsResponse =
            call(self.request(Method::GET, &format!("/items/{user}"))).await?;
        Ok(response.items)
    }

    /// `PATCH /items/{id}`: merge `items` deltas into the stored counts.
    pub async fn add_items(
        &self,
        user: &UserId,
        items: ItemCounts,
    ) -> Result<ItemsPatchResponse, ClientError> {
        let body = ItemsPatch { items };
        call(
            self.request(Method::PATCH, &format!("/items/{user}"))
                .json(&body),
        )
        .await
    }

    /// `GET /ai_suggestions/{id}?year=Y`.
    pub async fn suggestions(
        &self,
        user: &UserId,
        year: i64,
    ) -> Result<SuggestionsResponse, ClientError> {
        call(self.request(Method::GET, &format!("/ai_suggestions/{user}?year={year}")))
            .await
    }

    /// `POST /take_action/{id}`.
    pub async fn take_action(
        &self,
        user: &UserId,
        action: &TakeActionRequest,
    ) -> Result<TakeActionResponse, ClientError> {
        call(
            self.request(Method::POST, &format!("/take_action/{user}"))
                .json(action),
        )
        .await
    }

    /// Login and signup share the same response and failure handling: any
    /// refusal, including an unknown account, is an authentication failure.
    async fn authenticate<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AuthResponse, ClientError> {
        let response: AuthResponse = call(self.request(Method::POST, path).json(body))
            .await
            .map_err(|err| match err {
                ClientError::NoDataAvailable { detail } => {
                    ClientError::AuthenticationRejected { detail }
                }
                other => other,
            })?;
        if response.is_ok() {
            Ok(response)
        } else {
            Err(ClientError::AuthenticationRejected {
                detail: Some(format!("backend reported status {}", response.status)),
            })
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, url = %url, "backend request");
        self.client.request(method, url)
    }
}

async fn call<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = request.send().await.map_err(|err| {
        warn!(error = %err, "backend request failed");
        ClientError::from(err)
    })?;
    decode(response).await
}

/// Turn a response into `T`, classifying non-success statuses.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail);
        warn!(%status, detail = detail.as_deref().unwrap_or(""), "backend returned error status");
        return Err(ClientError::from_status(status, detail));
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| ClientError::MalformedResponse {
        reason: err.to_string(),
    })
}
