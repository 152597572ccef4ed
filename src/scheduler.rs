use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::pipeline::run_scrape;
use crate::state::AppState;

/// Start the periodic refresh when `auto_scrape_hours` is configured. The
/// first run happens right away, then once per interval, always with the
/// default query.
pub fn spawn_auto_scrape(state: AppState) -> Option<JoinHandle<()>> {
    let hours = state.config.auto_scrape_hours?;
    let period = Duration::from_secs(hours.saturating_mul(3600));
    tracing::info!("Automatic hackathon search every {hours}h");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            tracing::info!("Starting automatic hackathon search");
            match run_scrape(&state, None).await {
                Ok(outcome) => tracing::info!(
                    "Automatic search stored {} hackathons ({} new)",
                    outcome.stored(),
                    outcome.created
                ),
                Err(e) => tracing::warn!("Automatic search failed: {e}"),
            }
        }
    }))
}
