//! Weekly demand forecast schedule.
//!
//! The job fires every Sunday at 00:00 UTC. A missed run (process down at
//! the time) is not made up; the next Sunday covers it.

use std::time::Duration;

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc};
use tokio::sync::mpsc;
use tracing::{error, info};

use dealernet_db::Database;

use crate::error::{ApiError, ApiResult};
use crate::services::forecast_service::run_forecast;

/// The first Sunday 00:00 UTC strictly after `now`.
pub fn next_weekly_run(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_ahead = u64::from((7 - now.weekday().num_days_from_sunday()) % 7);
    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();

    let candidate = midnight + Days::new(days_ahead);
    if candidate > now {
        candidate
    } else {
        candidate + Days::new(7)
    }
}

/// Handle for stopping a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SchedulerHandle {
    pub async fn shutdown(&self) -> ApiResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| ApiError::Internal("Forecast scheduler stopped".to_string()))
    }
}

/// Runs [`run_forecast`] on the weekly schedule.
pub struct ForecastScheduler {
    db: Database,
}

impl ForecastScheduler {
    pub fn new(db: Database) -> Self {
        ForecastScheduler { db }
    }

    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(async move {
            self.run(shutdown_rx).await;
        });

        SchedulerHandle { shutdown_tx }
    }

    async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        loop {
            let now = Utc::now();
            let next = next_weekly_run(now);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!(next_run = %next, "Demand forecast scheduled");

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Forecast scheduler shutting down");
                    break;
                }
                _ = tokio::time::sleep(wait) => {
                    if let Err(e) = run_forecast(&self.db, Utc::now()).await {
                        error!(error = %e, "Demand forecast failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_next_sunday_midnight() {
        // Wednesday
        assert_eq!(next_weekly_run(utc(2024, 6, 12, 15, 30)), utc(2024, 6, 16, 0, 0));
        // Saturday, one minute before
        assert_eq!(next_weekly_run(utc(2024, 6, 15, 23, 59)), utc(2024, 6, 16, 0, 0));
    }

    #[test]
    fn test_sunday_runs_next_week() {
        // Exactly at the run time
        assert_eq!(next_weekly_run(utc(2024, 6, 16, 0, 0)), utc(2024, 6, 23, 0, 0));
        // Later on Sunday
        assert_eq!(next_weekly_run(utc(2024, 6, 16, 9, 0)), utc(2024, 6, 23, 0, 0));
    }

    #[test]
    fn test_crosses_month_and_year() {
        // Tuesday 31 Dec 2024
        assert_eq!(next_weekly_run(utc(2024, 12, 31, 8, 0)), utc(2025, 1, 5, 0, 0));
    }

    #[tokio::test]
    async fn test_shutdown_stops_scheduler() {
        let state = crate::test_support::state().await;
        let handle = ForecastScheduler::new(state.db.clone()).start();
        handle.shutdown().await.unwrap();
    }
}
