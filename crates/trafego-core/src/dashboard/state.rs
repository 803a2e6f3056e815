//! Dashboard state machine.
//!
//! `DashboardModel::update` is a pure reducer: it takes an event, mutates the
//! state and returns the effects the driver must run. No I/O happens here.
//!
//! ```text
//! Idle ──Activate──▶ Loading ──ok──▶ Ready ──Refresh──▶ Loading
//!                       │                                  │
//!                       └──err──▶ Failed ──Refresh─────────┘
//! ```

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::normalize::normalize_campaigns;
use super::request::{LatestOnly, RequestId};
use super::stats::DashboardStats;
use crate::api::{ApiError, ApiErrorKind, Campaign};

/// Coarse phase exposed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// One successful fetch: the campaigns and their aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub campaigns: Vec<Campaign>,
    pub stats: DashboardStats,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(campaigns: Vec<Campaign>, fetched_at: DateTime<Utc>) -> Self {
        let stats = DashboardStats::from_campaigns(&campaigns);
        Self {
            campaigns,
            stats,
            fetched_at,
        }
    }
}

/// User-facing description of a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl Failure {
    /// `action` names what failed, e.g. "load campaigns".
    pub fn from_error(error: &ApiError, action: &str) -> Self {
        let message = match error.kind {
            ApiErrorKind::Authentication => "Session expired. Please log in again.".to_string(),
            ApiErrorKind::Transport => {
                "Server unreachable. Check that the API is running and try again.".to_string()
            }
            ApiErrorKind::Status => {
                format!("Could not {action}: {}. Try again.", error.message)
            }
        };
        Self {
            kind: error.kind,
            message,
        }
    }

    /// Whether the user should be offered a retry rather than a login.
    pub fn is_retryable(&self) -> bool {
        self.kind != ApiErrorKind::Authentication
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
enum DashboardState {
    #[default]
    Idle,
    Loading {
        previous: Option<Snapshot>,
    },
    Ready(Snapshot),
    Failed {
        failure: Failure,
        stale: Option<Snapshot>,
    },
}

impl DashboardState {
    fn last_snapshot(&self) -> Option<&Snapshot> {
        match self {
            DashboardState::Idle => None,
            DashboardState::Loading { previous } => previous.as_ref(),
            DashboardState::Ready(snapshot) => Some(snapshot),
            DashboardState::Failed { stale, .. } => stale.as_ref(),
        }
    }
}

/// Inputs to the reducer.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    /// The dashboard became the visible view.
    Activate,
    /// User asked for fresh data.
    Refresh,
    /// A fetch finished; `request` must match the in-flight one.
    FetchFinished {
        request: RequestId,
        result: Result<Value, ApiError>,
        at: DateTime<Utc>,
    },
    /// A dashboard action other than the fetch failed.
    ActionFailed {
        action: &'static str,
        error: ApiError,
    },
    /// The dashboard is no longer visible; late results are dropped.
    Deactivate,
}

/// Work the driver must perform after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEffect {
    FetchCampaigns { request: RequestId },
    /// The server rejected the token; the session must be cleared.
    SessionExpired(ApiError),
}

/// Render-ready projection of the dashboard state.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub phase: Phase,
    pub campaigns: Vec<Campaign>,
    pub stats: DashboardStats,
    pub error: Option<String>,
    /// True when `campaigns` come from an earlier fetch than the one that failed.
    pub stale: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Dashboard state plus request bookkeeping.
#[derive(Debug, Default)]
pub struct DashboardModel {
    state: DashboardState,
    requests: LatestOnly,
    active: bool,
}

impl DashboardModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            DashboardState::Idle => Phase::Idle,
            DashboardState::Loading { .. } => Phase::Loading,
            DashboardState::Ready(_) => Phase::Ready,
            DashboardState::Failed { .. } => Phase::Failed,
        }
    }

    pub fn update(&mut self, event: DashboardEvent) -> Vec<DashboardEffect> {
        match event {
            DashboardEvent::Activate => {
                self.active = true;
                self.begin_fetch()
            }
            DashboardEvent::Refresh => {
                if self.active {
                    self.begin_fetch()
                } else {
                    Vec::new()
                }
            }
            DashboardEvent::FetchFinished {
                request,
                result,
                at,
            } => {
                if !self.requests.finish_if_active(request) || !self.active {
                    tracing::debug!(?request, "discarding stale campaign fetch result");
                    return Vec::new();
                }
                match result {
                    Ok(body) => {
                        self.state = DashboardState::Ready(Snapshot::new(
                            normalize_campaigns(&body),
                            at,
                        ));
                        Vec::new()
                    }
                    Err(error) => self.fail(error, "load campaigns"),
                }
            }
            DashboardEvent::ActionFailed { action, error } => {
                if self.active && !self.requests.has_active() {
                    self.fail(error, action)
                } else {
                    Vec::new()
                }
            }
            DashboardEvent::Deactivate => {
                self.active = false;
                self.requests.cancel();
                self.state = DashboardState::Idle;
                Vec::new()
            }
        }
    }

    pub fn view(&self) -> DashboardView {
        let snapshot = self.state.last_snapshot();
        let (error, stale) = match &self.state {
            DashboardState::Failed { failure, stale } => {
                (Some(failure.message.clone()), stale.is_some())
            }
            _ => (None, false),
        };

        DashboardView {
            phase: self.phase(),
            campaigns: snapshot.map(|s| s.campaigns.clone()).unwrap_or_default(),
            stats: snapshot.map(|s| s.stats).unwrap_or_default(),
            error,
            stale,
            last_updated: snapshot.map(|s| s.fetched_at),
        }
    }

    /// The failure currently shown, if any.
    pub fn failure(&self) -> Option<&Failure> {
        match &self.state {
            DashboardState::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }

    fn begin_fetch(&mut self) -> Vec<DashboardEffect> {
        if self.requests.has_active() {
            return Vec::new();
        }

        let previous = self.state.last_snapshot().cloned();
        self.state = DashboardState::Loading { previous };
        let request = self.requests.begin();
        vec![DashboardEffect::FetchCampaigns { request }]
    }

    fn fail(&mut self, error: ApiError, action: &str) -> Vec<DashboardEffect> {
        let failure = Failure::from_error(&error, action);

        if error.is_authentication() {
            self.state = DashboardState::Failed {
                failure,
                stale: None,
            };
            return vec![DashboardEffect::SessionExpired(error)];
        }

        let stale = self.state.last_snapshot().cloned();
        self.state = DashboardState::Failed { failure, stale };
        Vec::new()
    }
}
