use serde::Serialize;

use crate::api::{Campaign, CampaignStatus};

/// Aggregates shown on the dashboard cards.
///
/// Always recomputed from the full collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub active: usize,
    pub paused: usize,
    pub draft: usize,
    pub total_spent: f64,
    pub total_budget: f64,
}

impl DashboardStats {
    pub fn from_campaigns(campaigns: &[Campaign]) -> Self {
        campaigns.iter().fold(
            Self {
                total: campaigns.len(),
                ..Self::default()
            },
            |mut stats, campaign| {
                match campaign.status {
                    CampaignStatus::Active => stats.active += 1,
                    CampaignStatus::Paused => stats.paused += 1,
                    CampaignStatus::Draft => stats.draft += 1,
                    CampaignStatus::Other(_) => {}
                }
                stats.total_spent += campaign.total_spent;
                stats.total_budget += campaign.budget_amount;
                stats
            },
        )
    }
}
