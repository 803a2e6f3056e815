use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::error::{ApiError, ApiResult, classify_reqwest_error};
use super::types::{
    Campaign, CampaignDraft, CampaignMetrics, CampaignQuery, CampaignUpdate, LoginOutcome,
    PlatformSummary, Registration, TokenResponse, UserProfile,
};
use crate::config::Config;
use crate::dashboard::normalize_campaigns;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("trafego/", env!("CARGO_PKG_VERSION"));

/// Client for the campaign backend.
///
/// Cloning is cheap; the underlying connection pool is shared. The token is
/// attached as a bearer credential when present and omitted otherwise.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates an unauthenticated client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            http,
        })
    }

    /// Creates a client from the resolved configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.effective_base_url()?, config.request_timeout())
    }

    /// Returns a copy of this client carrying `token` (or none).
    #[must_use]
    pub fn with_token(&self, token: Option<&str>) -> Self {
        Self {
            base_url: self.base_url.clone(),
            token: token.map(str::to_string),
            http: self.http.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request_url(method, format!("{}{}", self.base_url, path))
    }

    /// Request to the base URL extended by `segments`, each percent-encoded
    /// as a single path segment.
    fn request_at(&self, method: Method, segments: &[&str]) -> ApiResult<RequestBuilder> {
        Ok(self.request_url(method, self.endpoint(segments)?))
    }

    fn endpoint(&self, segments: &[&str]) -> ApiResult<String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::transport(format!("Invalid base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::transport(format!("Base URL {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    fn request_url(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header("accept", "application/json")
            .header("user-agent", USER_AGENT);

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and returns the status and body of a 2xx response.
    async fn execute(&self, builder: RequestBuilder) -> ApiResult<(StatusCode, String)> {
        let request = builder.build().map_err(|e| classify_reqwest_error(&e))?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(%method, %path, authorized = self.token.is_some(), "api request");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        debug!(%method, %path, status = status.as_u16(), "api response");

        if status.is_success() {
            Ok((status, body))
        } else {
            Err(ApiError::from_response(
                status.as_u16(),
                &body,
                status.canonical_reason(),
            ))
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let (status, body) = self.execute(builder).await?;
        serde_json::from_str(&body).map_err(|e| invalid_body(status, &e))
    }

    /// Like `send_json` but an empty body decodes as `null`.
    async fn send_value(&self, builder: RequestBuilder) -> ApiResult<Value> {
        let (status, body) = self.execute(builder).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| invalid_body(status, &e))
    }

    async fn send_empty(&self, builder: RequestBuilder) -> ApiResult<()> {
        self.execute(builder).await.map(|_| ())
    }

    // ---- auth ----

    /// Exchanges credentials for an access token (`POST /auth/login`).
    pub async fn authenticate(&self, username: &str, password: &str) -> ApiResult<String> {
        let builder = self
            .request(Method::POST, "/auth/login")
            .form(&[("username", username), ("password", password)]);
        let response: TokenResponse = self.send_json(builder).await?;
        Ok(response.access_token)
    }

    /// `GET /auth/me` with the current token.
    pub async fn fetch_profile(&self) -> ApiResult<UserProfile> {
        self.send_json(self.request(Method::GET, "/auth/me")).await
    }

    /// Authenticates, then fetches the profile with the new token.
    ///
    /// Both calls must succeed; a failing profile fetch fails the login and
    /// the token is dropped.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginOutcome> {
        let token = self.authenticate(username, password).await?;
        debug!(token = %mask_token(&token), "token issued, fetching profile");

        let profile = self.with_token(Some(&token)).fetch_profile().await?;
        info!(user = %profile.name, "login succeeded");

        Ok(LoginOutcome { token, profile })
    }

    /// `POST /auth/register`.
    pub async fn register(&self, registration: &Registration) -> ApiResult<UserProfile> {
        let builder = self.request(Method::POST, "/auth/register").json(registration);
        self.send_json(builder).await
    }

    /// `POST /auth/change-password` (credentials travel as query parameters).
    pub async fn change_password(&self, current: &str, new: &str) -> ApiResult<Value> {
        let builder = self
            .request(Method::POST, "/auth/change-password")
            .query(&[("current_password", current), ("new_password", new)]);
        self.send_value(builder).await
    }

    // ---- campaigns ----

    /// Raw `GET /campaigns/` body, without shape checks.
    pub async fn fetch_campaigns(&self, query: &CampaignQuery) -> ApiResult<Value> {
        let builder = self
            .request(Method::GET, "/campaigns/")
            .query(&query.to_pairs());
        self.send_value(builder).await
    }

    /// `GET /campaigns/` normalized into a list.
    pub async fn list_campaigns(&self, query: &CampaignQuery) -> ApiResult<Vec<Campaign>> {
        let body = self.fetch_campaigns(query).await?;
        Ok(normalize_campaigns(&body))
    }

    pub async fn get_campaign(&self, id: &str) -> ApiResult<Campaign> {
        self.send_json(self.request_at(Method::GET, &["campaigns", id])?)
            .await
    }

    pub async fn create_campaign(&self, draft: &CampaignDraft) -> ApiResult<Campaign> {
        let builder = self.request(Method::POST, "/campaigns/").json(draft);
        self.send_json(builder).await
    }

    pub async fn update_campaign(&self, id: &str, update: &CampaignUpdate) -> ApiResult<Campaign> {
        let builder = self.request_at(Method::PUT, &["campaigns", id])?.json(update);
        self.send_json(builder).await
    }

    /// `DELETE /campaigns/{id}`; the backend answers 204 with no body.
    pub async fn delete_campaign(&self, id: &str) -> ApiResult<()> {
        self.send_empty(self.request_at(Method::DELETE, &["campaigns", id])?)
            .await
    }

    pub async fn campaign_metrics(&self, id: &str) -> ApiResult<CampaignMetrics> {
        self.send_json(self.request_at(Method::GET, &["campaigns", id, "metrics"])?)
            .await
    }

    pub async fn pause_campaign(&self, id: &str) -> ApiResult<Campaign> {
        self.send_json(self.request_at(Method::POST, &["campaigns", id, "pause"])?)
            .await
    }

    pub async fn activate_campaign(&self, id: &str) -> ApiResult<Campaign> {
        self.send_json(self.request_at(Method::POST, &["campaigns", id, "activate"])?)
            .await
    }

    pub async fn platform_summary(&self, platform: &str) -> ApiResult<PlatformSummary> {
        let builder =
            self.request_at(Method::GET, &["campaigns", "platform", platform, "summary"])?;
        self.send_json(builder).await
    }

    /// `POST /campaigns/populate-sample`; replaces all campaigns with sample data.
    pub async fn populate_sample(&self) -> ApiResult<Vec<Campaign>> {
        let body = self
            .send_value(self.request(Method::POST, "/campaigns/populate-sample"))
            .await?;
        Ok(normalize_campaigns(&body))
    }
}

fn invalid_body(status: StatusCode, err: &serde_json::Error) -> ApiError {
    ApiError::status(status.as_u16(), format!("invalid response body: {err}"))
}

/// Masks a token for display (e.g., "eyJh...Xk9w").
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    match (token.get(..4), token.get(token.len() - 4..)) {
        (Some(head), Some(tail)) => format!("{head}...{tail}"),
        _ => "***".to_string(),
    }
}
