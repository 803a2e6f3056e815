//! Dashboard controller: fetch campaigns, aggregate, expose a view model.

mod controller;
mod normalize;
mod request;
mod state;
mod stats;

pub use controller::{CampaignSource, DashboardController};
pub use normalize::normalize_campaigns;
pub use request::RequestId;
pub use state::{
    DashboardEffect, DashboardEvent, DashboardModel, DashboardView, Failure, Phase, Snapshot,
};
pub use stats::DashboardStats;
