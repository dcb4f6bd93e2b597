//! Background refresh loop.

use std::sync::Arc;
use std::time::Duration;

use alert_cache::AlertCache;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// Refresh the configured areas every `period`, starting immediately.
///
/// Failures are logged and the loop keeps going; the cache keeps serving
/// its last good snapshot in the meantime.
pub fn spawn(cache: Arc<AlertCache>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period = ?period, "Starting background refresher");

        loop {
            ticker.tick().await;

            match cache.refresh_configured().await {
                Ok(report) => info!(
                    alerts = report.alerts_count,
                    failed = report.areas_failed.len(),
                    "Scheduled refresh finished"
                ),
                Err(e) => warn!(error = %e, "Scheduled refresh failed"),
            }
        }
    })
}
