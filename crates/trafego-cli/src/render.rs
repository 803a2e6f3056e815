//! Plain-text rendering of view models. No decisions are made here.

use std::fmt::Write as _;

use chrono::Local;
use comfy_table::{ContentArrangement, Table};
use trafego_core::api::{Campaign, CampaignMetrics, PlatformSummary, UserProfile};
use trafego_core::dashboard::{DashboardStats, DashboardView, Phase};

pub fn money(value: f64) -> String {
    format!("R$ {value:.2}")
}

fn platform_label(platform: &str) -> String {
    if platform.is_empty() {
        "N/A".to_string()
    } else {
        platform.replacen('_', " ", 1)
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Six stat cards as a single-row table.
pub fn stat_cards(stats: &DashboardStats) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Total",
        "Active",
        "Paused",
        "Draft",
        "Total Spent",
        "Total Budget",
    ]);
    table.add_row(vec![
        stats.total.to_string(),
        stats.active.to_string(),
        stats.paused.to_string(),
        stats.draft.to_string(),
        money(stats.total_spent),
        money(stats.total_budget),
    ]);
    table.to_string()
}

pub fn campaign_table(campaigns: &[Campaign]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "ID", "Name", "Platform", "Status", "Budget", "Spent", "Start",
    ]);
    for campaign in campaigns {
        table.add_row(vec![
            campaign.id.clone(),
            campaign.name.clone(),
            platform_label(&campaign.platform),
            campaign.status.to_string(),
            money(campaign.budget_amount),
            money(campaign.total_spent),
            campaign
                .start_date
                .map_or_else(|| "N/A".to_string(), |d| d.format("%Y-%m-%d").to_string()),
        ]);
    }
    table.to_string()
}

pub fn dashboard(view: &DashboardView, rows: usize, user: Option<&UserProfile>) -> String {
    let mut out = String::new();

    if let Some(user) = user {
        let _ = writeln!(out, "Campaign dashboard · {} ({})", user.name, user.role);
    } else {
        let _ = writeln!(out, "Campaign dashboard");
    }
    out.push('\n');

    if view.phase == Phase::Loading {
        out.push_str("Loading campaigns...\n");
        return out;
    }

    if let Some(error) = &view.error {
        let _ = writeln!(out, "Error: {error}");
        if view.stale {
            out.push_str("Showing data from the last successful refresh.\n");
        }
        out.push('\n');
    }

    out.push_str(&stat_cards(&view.stats));
    out.push_str("\n\n");

    let _ = writeln!(out, "Campaigns ({})", view.campaigns.len());
    if view.campaigns.is_empty() {
        if view.error.is_none() {
            out.push_str(
                "No campaigns found. Run `trafego campaigns populate-sample` to load sample data.\n",
            );
        }
    } else {
        let shown = &view.campaigns[..view.campaigns.len().min(rows)];
        out.push_str(&campaign_table(shown));
        out.push('\n');
        if shown.len() < view.campaigns.len() {
            let _ = writeln!(
                out,
                "... {} more (see `trafego campaigns list`)",
                view.campaigns.len() - shown.len()
            );
        }
    }

    if let Some(at) = view.last_updated {
        let _ = writeln!(
            out,
            "\nLast updated: {}",
            at.with_timezone(&Local).format("%H:%M:%S")
        );
    }

    out
}

pub fn campaign_detail(campaign: &Campaign) -> String {
    let mut table = new_table();
    let date = |d: Option<chrono::NaiveDate>| {
        d.map_or_else(|| "N/A".to_string(), |d| d.format("%Y-%m-%d").to_string())
    };
    let rows: Vec<(&str, String)> = vec![
        ("ID", campaign.id.clone()),
        ("Name", campaign.name.clone()),
        ("Platform", platform_label(&campaign.platform)),
        ("Status", campaign.status.to_string()),
        ("Budget type", campaign.budget_type.clone()),
        ("Budget", money(campaign.budget_amount)),
        ("Spent", money(campaign.total_spent)),
        ("Start", date(campaign.start_date)),
        ("End", date(campaign.end_date)),
        ("Impressions", campaign.impressions.to_string()),
        ("Clicks", campaign.clicks.to_string()),
        ("Conversions", campaign.conversions.to_string()),
    ];
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value]);
    }
    table.to_string()
}

pub fn metrics(metrics: &CampaignMetrics) -> String {
    let m = &metrics.metrics;
    let mut table = new_table();
    table.set_header(vec!["Metric", "Value"]);
    let rows: Vec<(&str, String)> = vec![
        ("Total spent", money(m.total_spent)),
        ("Impressions", m.impressions.to_string()),
        ("Clicks", m.clicks.to_string()),
        ("Conversions", m.conversions.to_string()),
        ("CTR", format!("{:.2}%", m.ctr)),
        ("CPC", money(m.cpc)),
        ("Conversion rate", format!("{:.2}%", m.conversion_rate)),
        ("Budget remaining", money(m.budget_remaining)),
        ("Budget utilization", format!("{:.2}%", m.budget_utilization)),
    ];
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value]);
    }

    format!(
        "{} (#{}) · {} · {}\n{}",
        metrics.campaign_name,
        metrics.campaign_id,
        platform_label(&metrics.platform),
        metrics.status,
        table
    )
}

pub fn platform_summary(summary: &PlatformSummary) -> String {
    if summary.total_campaigns == 0 {
        let message = summary
            .message
            .as_deref()
            .unwrap_or("No campaigns found for this platform");
        return format!("{}: {message}", platform_label(&summary.platform));
    }

    let mut table = new_table();
    table.set_header(vec!["Metric", "Value"]);
    let rows: Vec<(&str, String)> = vec![
        ("Campaigns", summary.total_campaigns.to_string()),
        ("Active", summary.active_campaigns.to_string()),
        ("Total spent", money(summary.total_spent)),
        ("Total budget", money(summary.total_budget)),
        ("Budget utilization", format!("{:.2}%", summary.budget_utilization)),
        ("Average CTR", format!("{:.2}%", summary.average_ctr)),
    ];
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value]);
    }
    format!("{}\n{}", platform_label(&summary.platform), table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trafego_core::api::CampaignStatus;

    fn campaign(id: usize) -> Campaign {
        Campaign {
            id: id.to_string(),
            name: format!("Campaign {id}"),
            platform: "google_ads".to_string(),
            status: CampaignStatus::Active,
            budget_type: "daily".to_string(),
            budget_amount: 100.0,
            total_spent: 12.5,
            start_date: None,
            end_date: None,
            impressions: 0,
            clicks: 0,
            conversions: 0,
        }
    }

    fn ready_view(campaigns: Vec<Campaign>) -> DashboardView {
        DashboardView {
            phase: Phase::Ready,
            stats: DashboardStats::from_campaigns(&campaigns),
            campaigns,
            error: None,
            stale: false,
            last_updated: None,
        }
    }

    #[test]
    fn test_money_has_two_decimals() {
        assert_eq!(money(1500.5), "R$ 1500.50");
        assert_eq!(money(0.0), "R$ 0.00");
    }

    #[test]
    fn test_dashboard_limits_rows() {
        let view = ready_view((1..=12).map(campaign).collect());
        let out = dashboard(&view, 10, None);

        assert!(out.contains("Campaigns (12)"));
        assert!(out.contains("Campaign 10"));
        assert!(!out.contains("Campaign 11"));
        assert!(out.contains("... 2 more"));
        assert!(out.contains("R$ 1200.00"));
    }

    #[test]
    fn test_dashboard_empty_suggests_sample_data() {
        let out = dashboard(&ready_view(Vec::new()), 10, None);
        assert!(out.contains("No campaigns found"));
    }

    #[test]
    fn test_dashboard_shows_error_with_stale_data() {
        let mut view = ready_view(vec![campaign(1)]);
        view.phase = Phase::Failed;
        view.error = Some("Server unreachable.".to_string());
        view.stale = true;

        let out = dashboard(&view, 10, None);
        assert!(out.contains("Error: Server unreachable."));
        assert!(out.contains("last successful refresh"));
        assert!(out.contains("Campaign 1"));
    }

    #[test]
    fn test_platform_label() {
        assert_eq!(platform_label("google_ads"), "google ads");
        assert_eq!(platform_label(""), "N/A");
    }
}
