//! HTTP client for a running gateway, used by the CLI subcommands.

mod error;

use std::time::Duration;

use reqwest::Response;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

pub use error::ClientError;

use crate::adapters::wire::{
    AdminLoginRequest, AdminLoginResponse, ErrorResponse, IssueTokenResponse, MetricsResponse,
    StatusResponse,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| ClientError::ConnectionFailed {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn status(&self) -> Result<StatusResponse, ClientError> {
        let response = self.send(self.http.get(self.url("/api/status"))).await?;
        decode(response).await
    }

    /// Returns the admin session token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let request = AdminLoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self
            .send(self.http.post(self.url("/api/admin/login")).json(&request))
            .await?;
        let body: AdminLoginResponse = decode(response).await?;
        Ok(body.token)
    }

    pub async fn logout(&self, admin_token: &str) -> Result<(), ClientError> {
        let response = self
            .send(
                self.http
                    .post(self.url("/api/admin/logout"))
                    .bearer_auth(admin_token),
            )
            .await?;
        expect_success(response).await
    }

    pub async fn issue_token(&self, admin_token: &str) -> Result<IssueTokenResponse, ClientError> {
        let response = self
            .send(
                self.http
                    .post(self.url("/api/admin/token"))
                    .bearer_auth(admin_token),
            )
            .await?;
        decode(response).await
    }

    /// Returns `false` when the token was unknown or already redeemed.
    pub async fn revoke_token(&self, admin_token: &str, token: &str) -> Result<bool, ClientError> {
        let response = self
            .send(
                self.http
                    .delete(self.url(&format!("/api/admin/token/{token}")))
                    .bearer_auth(admin_token),
            )
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        expect_success(response).await.map(|()| true)
    }

    pub async fn metrics(&self, admin_token: &str) -> Result<MetricsResponse, ClientError> {
        let response = self
            .send(
                self.http
                    .get(self.url("/api/admin/metrics"))
                    .bearer_auth(admin_token),
            )
            .await?;
        decode(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|source| ClientError::ConnectionFailed {
                url: self.base_url.clone(),
                source,
            })?;
        debug!(status = response.status().as_u16(), url = %response.url(), "Gateway responded");
        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(rejection(response).await);
    }
    response
        .json::<T>()
        .await
        .map_err(|err| ClientError::InvalidResponse(err.to_string()))
}

async fn expect_success(response: Response) -> Result<(), ClientError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(rejection(response).await)
    }
}

async fn rejection(response: Response) -> ClientError {
    let status = response.status().as_u16();
    match response.json::<ErrorResponse>().await {
        Ok(body) => ClientError::Rejected {
            status,
            message: body.error,
            code: body.code,
            retryable: body.retryable,
        },
        Err(_) => ClientError::Rejected {
            status,
            message: format!("HTTP {status}"),
            code: None,
            retryable: false,
        },
    }
}
