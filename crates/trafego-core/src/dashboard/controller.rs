use std::cell::RefCell;
use std::future::Future;

use chrono::Utc;
use serde_json::Value;

use super::state::{
    DashboardEffect, DashboardEvent, DashboardModel, DashboardView, Failure, Phase,
};
use crate::api::{ApiClient, ApiResult, CampaignQuery};

/// Where the dashboard gets its campaigns from.
///
/// Futures are not required to be `Send`; the controller is driven on a
/// single task.
pub trait CampaignSource {
    /// Raw campaign list body, shape unchecked.
    fn fetch_all(&self) -> impl Future<Output = ApiResult<Value>>;

    /// Replaces the backend data with the sample set.
    fn populate(&self) -> impl Future<Output = ApiResult<()>>;
}

impl CampaignSource for ApiClient {
    async fn fetch_all(&self) -> ApiResult<Value> {
        self.fetch_campaigns(&CampaignQuery::default()).await
    }

    async fn populate(&self) -> ApiResult<()> {
        self.populate_sample().await.map(|_| ())
    }
}

/// Async driver around [`DashboardModel`].
///
/// The model sits in a `RefCell` and is only borrowed between awaits, so
/// overlapping calls on the same task see each other's state changes (a
/// refresh issued while a fetch is pending is a no-op).
///
/// Each method returns the effects the caller still has to act on, which is
/// at most a `SessionExpired`.
pub struct DashboardController<C> {
    source: C,
    model: RefCell<DashboardModel>,
}

impl<C: CampaignSource> DashboardController<C> {
    pub fn new(source: C) -> Self {
        Self {
            source,
            model: RefCell::new(DashboardModel::new()),
        }
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    /// The dashboard became visible: fetch unless a fetch is already running.
    pub async fn activate(&self) -> Vec<DashboardEffect> {
        self.dispatch(DashboardEvent::Activate).await
    }

    pub async fn refresh(&self) -> Vec<DashboardEffect> {
        self.dispatch(DashboardEvent::Refresh).await
    }

    /// Seeds sample data, then refreshes.
    pub async fn populate_sample(&self) -> Vec<DashboardEffect> {
        let idle = {
            let model = self.model.borrow();
            model.is_active() && model.phase() != Phase::Loading
        };
        if !idle {
            return Vec::new();
        }

        match self.source.populate().await {
            Ok(()) => self.refresh().await,
            Err(error) => {
                self.dispatch(DashboardEvent::ActionFailed {
                    action: "populate sample data",
                    error,
                })
                .await
            }
        }
    }

    /// The dashboard is no longer visible; in-flight results will be dropped.
    pub fn deactivate(&self) {
        self.model.borrow_mut().update(DashboardEvent::Deactivate);
    }

    pub fn view(&self) -> DashboardView {
        self.model.borrow().view()
    }

    pub fn phase(&self) -> Phase {
        self.model.borrow().phase()
    }

    pub fn failure(&self) -> Option<Failure> {
        self.model.borrow().failure().cloned()
    }

    async fn dispatch(&self, event: DashboardEvent) -> Vec<DashboardEffect> {
        let mut pending = self.model.borrow_mut().update(event);
        let mut remaining = Vec::new();

        while !pending.is_empty() {
            let effect = pending.remove(0);
            match effect {
                DashboardEffect::FetchCampaigns { request } => {
                    let result = self.source.fetch_all().await;
                    let next = self.model.borrow_mut().update(DashboardEvent::FetchFinished {
                        request,
                        result,
                        at: Utc::now(),
                    });
                    pending.extend(next);
                }
                other @ DashboardEffect::SessionExpired(_) => remaining.push(other),
            }
        }

        remaining
    }
}
