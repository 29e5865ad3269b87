//! Recurring cycle trigger.

use std::future::Future;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::config::ScheduleConfig;
use crate::error::{HarvestError, Result};
use crate::pipeline::CycleSummary;

/// Run cycles on a fixed interval until `shutdown` resolves.
///
/// Cycles run one at a time; ticks that fall due while a cycle is still
/// running are skipped, never run concurrently. A failed cycle is logged and
/// the schedule continues.
pub async fn run_schedule<F, Fut, S>(settings: &ScheduleConfig, mut run_cycle: F, shutdown: S)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<CycleSummary>>,
    S: Future<Output = ()>,
{
    let period = Duration::from_secs(settings.interval_minutes.max(1) * 60);
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    if !settings.run_on_startup {
        // The first tick completes immediately
        tick.tick().await;
    }

    info!(
        "Scheduler started: every {} minute(s){}",
        settings.interval_minutes.max(1),
        if settings.run_on_startup { ", running now" } else { "" }
    );

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping scheduler");
                break;
            }
            _ = tick.tick() => {
                match run_cycle().await {
                    Ok(summary) => info!(
                        "Cycle complete: {} record(s), next run in {} minute(s)",
                        summary.records.len(),
                        settings.interval_minutes.max(1)
                    ),
                    Err(HarvestError::CycleInProgress) => {
                        warn!("Previous cycle still running, skipping this trigger")
                    }
                    Err(e) => error!("Cycle failed: {}", e),
                }
            }
        }
    }
}
