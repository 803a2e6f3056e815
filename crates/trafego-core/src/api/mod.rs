//! HTTP client for the campaign backend.

mod client;
mod error;
pub mod types;

pub use client::{ApiClient, USER_AGENT, mask_token};
pub use error::{ApiError, ApiErrorKind, ApiResult, extract_server_message};
pub use types::{
    Campaign, CampaignDraft, CampaignMetrics, CampaignQuery, CampaignStatus, CampaignUpdate,
    LoginOutcome, PlatformSummary, Registration, UserProfile,
};
