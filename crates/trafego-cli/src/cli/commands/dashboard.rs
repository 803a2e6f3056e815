//! Dashboard command handler.

use anyhow::{Result, anyhow};
use trafego_core::api::ApiErrorKind;
use trafego_core::dashboard::{CampaignSource, DashboardController, DashboardEffect};

use super::AppContext;
use crate::render;

/// Applies the effects left over from a controller call.
///
/// A `SessionExpired` clears the session, deactivates the dashboard and
/// becomes the command's error.
pub fn settle<C: CampaignSource>(
    ctx: &mut AppContext,
    controller: &DashboardController<C>,
    effects: Vec<DashboardEffect>,
) -> Result<()> {
    for effect in effects {
        if let DashboardEffect::SessionExpired(error) = effect {
            controller.deactivate();
            return Err(ctx.fail(error));
        }
    }
    Ok(())
}

/// Prints the dashboard, then fails the command if the last refresh failed.
pub fn show<C: CampaignSource>(
    ctx: &AppContext,
    controller: &DashboardController<C>,
    rows: usize,
) -> Result<()> {
    println!(
        "{}",
        render::dashboard(&controller.view(), rows, ctx.gate.session().user())
    );

    match controller.failure() {
        None => Ok(()),
        Some(failure) if failure.kind == ApiErrorKind::Transport => Err(anyhow!(
            "Server unreachable at {}. Check that the API is running and try again.",
            ctx.base.base_url()
        )),
        Some(failure) => Err(anyhow!(failure.message)),
    }
}

pub async fn run(ctx: &mut AppContext, rows: Option<usize>) -> Result<()> {
    let controller = DashboardController::new(ctx.authorized()?);

    let effects = controller.activate().await;
    settle(ctx, &controller, effects)?;

    let rows = rows.unwrap_or(ctx.config.dashboard.rows);
    show(ctx, &controller, rows)
}
