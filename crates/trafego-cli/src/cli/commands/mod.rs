//! CLI command handlers.

pub mod auth;
pub mod campaigns;
pub mod config;
pub mod dashboard;

use std::future::Future;
use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result, anyhow};
use trafego_core::api::{ApiClient, ApiError, ApiErrorKind, ApiResult};
use trafego_core::config::Config;
use trafego_core::gate::{Route, SessionGate};
use trafego_core::session::{FileStorage, SessionStore};

pub const NOT_LOGGED_IN: &str = "Not logged in. Run `trafego login` first.";
pub const SESSION_EXPIRED: &str = "Session expired or access denied; please log in again.";

/// Everything a command needs: config, an unauthenticated base client and
/// the session gate.
pub struct AppContext {
    pub config: Config,
    pub base: ApiClient,
    pub gate: SessionGate<FileStorage>,
}

impl AppContext {
    pub fn load(config: Config, api_url: Option<&str>) -> Result<Self> {
        let base = match api_url {
            Some(url) => {
                url::Url::parse(url).with_context(|| format!("Invalid API base URL: {url}"))?;
                ApiClient::new(url, config.request_timeout())?
            }
            None => ApiClient::from_config(&config)?,
        };
        let gate = SessionGate::new(SessionStore::open_default());
        Ok(Self { config, base, gate })
    }

    /// Client carrying the session token, or the not-logged-in error.
    pub fn authorized(&self) -> Result<ApiClient> {
        match self.gate.route() {
            Route::Dashboard => Ok(self.gate.client(&self.base)),
            Route::Login => Err(anyhow!(NOT_LOGGED_IN)),
        }
    }

    /// Runs a gated API call, converting failures into user-facing errors.
    pub async fn call<T, F, Fut>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let client = self.authorized()?;
        match op(client).await {
            Ok(value) => Ok(value),
            Err(error) => Err(self.fail(error)),
        }
    }

    /// Applies an API failure to the session and describes it.
    pub fn fail(&mut self, error: ApiError) -> anyhow::Error {
        match error.kind {
            ApiErrorKind::Authentication => {
                if let Err(e) = self.gate.observe(&error) {
                    tracing::warn!("Failed to clear session: {e:#}");
                }
                anyhow::Error::new(error).context(SESSION_EXPIRED)
            }
            ApiErrorKind::Transport => anyhow::Error::new(error)
                .context(format!("Server unreachable at {}", self.base.base_url())),
            ApiErrorKind::Status => anyhow::Error::new(error),
        }
    }
}

/// Reads one line of input, prompting on a terminal.
pub fn prompt_line(label: &str) -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("{label}: ");
        io::stderr().flush()?;
    }

    let mut line = String::new();
    stdin.lock().read_line(&mut line).context("read from stdin")?;
    let value = line.trim_end_matches(['\r', '\n']).to_string();
    if value.is_empty() {
        anyhow::bail!("{label} is required");
    }
    Ok(value)
}
