//! Campaign command handlers.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use trafego_core::api::{CampaignDraft, CampaignQuery, CampaignUpdate};
use trafego_core::dashboard::DashboardController;

use super::AppContext;
use super::dashboard::{settle, show as show_dashboard};
use crate::render;

/// Parses `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD ({e})"))
}

/// Parses `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]` or `YYYY-MM-DD HH:MM[:SS]`.
pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt);
        }
    }
    parse_date(raw).map(|d| d.and_time(chrono::NaiveTime::MIN))
}

pub async fn list(ctx: &mut AppContext, query: CampaignQuery, json: bool) -> Result<()> {
    let campaigns = ctx
        .call(|client| async move { client.list_campaigns(&query).await })
        .await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&campaigns).context("serialize campaigns")?
        );
    } else if campaigns.is_empty() {
        println!("No campaigns found.");
    } else {
        println!("{}", render::campaign_table(&campaigns));
    }
    Ok(())
}

pub async fn show(ctx: &mut AppContext, id: &str) -> Result<()> {
    let campaign = ctx
        .call(|client| async move { client.get_campaign(id).await })
        .await?;
    println!("{}", render::campaign_detail(&campaign));
    Ok(())
}

pub async fn create(ctx: &mut AppContext, draft: CampaignDraft) -> Result<()> {
    if draft.budget_amount <= 0.0 {
        anyhow::bail!("Budget must be greater than zero");
    }
    if let Some(end) = draft.end_date
        && end < draft.start_date
    {
        anyhow::bail!("End date must be after start date");
    }

    let campaign = ctx
        .call(|client| async move { client.create_campaign(&draft).await })
        .await?;
    println!("Created campaign {} ({})", campaign.id, campaign.name);
    Ok(())
}

pub async fn update(ctx: &mut AppContext, id: &str, update: CampaignUpdate) -> Result<()> {
    if update.is_empty() {
        anyhow::bail!("Nothing to update; pass at least one field");
    }

    let campaign = ctx
        .call(|client| async move { client.update_campaign(id, &update).await })
        .await?;
    println!("Updated campaign {} ({})", campaign.id, campaign.name);
    Ok(())
}

pub async fn delete(ctx: &mut AppContext, id: &str) -> Result<()> {
    ctx.call(|client| async move { client.delete_campaign(id).await })
        .await?;
    println!("Deleted campaign {id}");
    Ok(())
}

pub async fn pause(ctx: &mut AppContext, id: &str) -> Result<()> {
    let campaign = ctx
        .call(|client| async move { client.pause_campaign(id).await })
        .await?;
    println!("Campaign {} is now {}", campaign.id, campaign.status);
    Ok(())
}

pub async fn activate(ctx: &mut AppContext, id: &str) -> Result<()> {
    let campaign = ctx
        .call(|client| async move { client.activate_campaign(id).await })
        .await?;
    println!("Campaign {} is now {}", campaign.id, campaign.status);
    Ok(())
}

pub async fn metrics(ctx: &mut AppContext, id: &str) -> Result<()> {
    let metrics = ctx
        .call(|client| async move { client.campaign_metrics(id).await })
        .await?;
    println!("{}", render::metrics(&metrics));
    Ok(())
}

pub async fn summary(ctx: &mut AppContext, platform: &str) -> Result<()> {
    let summary = ctx
        .call(|client| async move { client.platform_summary(platform).await })
        .await?;
    println!("{}", render::platform_summary(&summary));
    Ok(())
}

/// Seeds sample data through the dashboard and shows the refreshed result.
pub async fn populate_sample(ctx: &mut AppContext) -> Result<()> {
    let controller = DashboardController::new(ctx.authorized()?);

    let effects = controller.activate().await;
    settle(ctx, &controller, effects)?;
    let effects = controller.populate_sample().await;
    settle(ctx, &controller, effects)?;

    show_dashboard(ctx, &controller, ctx.config.dashboard.rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_accepts_plain_date() {
        let dt = parse_datetime("2025-02-01").unwrap();
        assert_eq!(dt.to_string(), "2025-02-01 00:00:00");
    }

    #[test]
    fn test_parse_datetime_accepts_time() {
        let dt = parse_datetime("2025-02-01T08:30").unwrap();
        assert_eq!(dt.to_string(), "2025-02-01 08:30:00");
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("01/02/2025").is_err());
    }
}
