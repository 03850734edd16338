//! # Metrics Recompute Subscription
//!
//! Keeps `metrics/dashboard` current by recomputing the full snapshot after
//! any write to a watched collection.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Metrics Recomputer                                │
//! │                                                                         │
//! │  createSale ──┐                                                         │
//! │  addVehicle ──┤ CollectionChange                                        │
//! │  setGoal ─────┼──────────────────▶ ┌──────────────────┐                 │
//! │  ...        ──┘   (change feed)    │  watched?        │── no ──▶ drop   │
//! │                                    └────────┬─────────┘                 │
//! │                                             │ yes                       │
//! │                                             ▼                           │
//! │                                    ┌──────────────────┐                 │
//! │                                    │ deadline = first │                 │
//! │                                    │ change + window  │                 │
//! │                                    └────────┬─────────┘                 │
//! │                                             │ window elapsed            │
//! │                                             ▼                           │
//! │                         full read ─► MetricsSnapshot ─► metrics/dashboard│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A burst of writes inside one window costs one recompute. Every recompute
//! reads all source collections, so the stored result is the same as
//! recomputing once per write. The snapshot document itself lives in an
//! unwatched collection and never re-triggers.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use dealernet_db::{CollectionChange, Database};

use crate::error::{ApiError, ApiResult};
use crate::services::metrics_service::refresh_dashboard;

// =============================================================================
// Handle
// =============================================================================

/// Commands for the recomputer.
#[derive(Debug)]
enum RecomputeCommand {
    /// Recompute now if anything is pending, then reply.
    Flush(oneshot::Sender<()>),
    /// Recompute what is pending and stop.
    Shutdown,
}

/// Handle for controlling a running recomputer.
#[derive(Clone)]
pub struct RecomputeHandle {
    cmd_tx: mpsc::Sender<RecomputeCommand>,
}

fn channel_closed() -> ApiError {
    ApiError::Internal("Recompute task stopped".to_string())
}

impl RecomputeHandle {
    /// Waits until every change published before this call is reflected in
    /// the stored snapshot.
    pub async fn flush(&self) -> ApiResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(RecomputeCommand::Flush(reply_tx))
            .await
            .map_err(|_| channel_closed())?;
        reply_rx.await.map_err(|_| channel_closed())
    }

    pub async fn shutdown(&self) -> ApiResult<()> {
        self.cmd_tx
            .send(RecomputeCommand::Shutdown)
            .await
            .map_err(|_| channel_closed())
    }
}

// =============================================================================
// Recomputer
// =============================================================================

/// Subscribes to the change feed and refreshes the stored snapshot.
pub struct MetricsRecomputer {
    db: Database,
    coalesce: Duration,
    changes: broadcast::Receiver<CollectionChange>,
}

impl MetricsRecomputer {
    /// Subscribes immediately, so writes made before [`start`](Self::start)
    /// are not missed.
    pub fn new(db: Database, coalesce: Duration) -> Self {
        let changes = db.subscribe_changes();
        MetricsRecomputer {
            db,
            coalesce,
            changes,
        }
    }

    /// Starts the recomputer and returns a handle.
    pub fn start(self) -> RecomputeHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);

        tokio::spawn(async move {
            self.run(cmd_rx).await;
        });

        RecomputeHandle { cmd_tx }
    }

    async fn run(mut self, mut cmd_rx: mpsc::Receiver<RecomputeCommand>) {
        info!(coalesce_ms = self.coalesce.as_millis() as u64, "Metrics recomputer started");

        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(RecomputeCommand::Flush(reply)) => {
                        if self.drain_pending() || deadline.is_some() {
                            deadline = None;
                            self.recompute().await;
                        }
                        let _ = reply.send(());
                    }
                    Some(RecomputeCommand::Shutdown) | None => {
                        if self.drain_pending() || deadline.is_some() {
                            self.recompute().await;
                        }
                        info!("Metrics recomputer shutting down");
                        break;
                    }
                },
                change = self.changes.recv() => match change {
                    Ok(change) => {
                        if change.collection.triggers_recompute() {
                            debug!(collection = %change.collection, id = %change.document_id, "Watched write");
                            deadline.get_or_insert_with(|| Instant::now() + self.coalesce);
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Change feed lagged, scheduling recompute");
                        deadline.get_or_insert_with(|| Instant::now() + self.coalesce);
                    }
                    Err(RecvError::Closed) => {
                        info!("Change feed closed, metrics recomputer stopping");
                        break;
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    self.recompute().await;
                }
            }
        }
    }

    /// Consumes changes already buffered. Returns whether any of them needs
    /// a recompute.
    fn drain_pending(&mut self) -> bool {
        let mut dirty = false;
        loop {
            match self.changes.try_recv() {
                Ok(change) => dirty |= change.collection.triggers_recompute(),
                Err(TryRecvError::Lagged(_)) => dirty = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return dirty,
            }
        }
    }

    /// Failures are logged; the next watched write retries.
    async fn recompute(&self) {
        if let Err(e) = refresh_dashboard(&self.db, Utc::now()).await {
            error!(error = %e, "Dashboard recompute failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::registry_service::{DeleteUserRequest, RegistryService};
    use crate::test_support::{at, caller, state};
    use dealernet_core::sale::NewSale;
    use dealernet_core::{CustomerDetails, Goal, GoalType};
    use dealernet_db::Collection;

    fn goal(target: i64) -> Goal {
        Goal {
            id: Goal::document_id("2024-06", "d-1", GoalType::SalesCount),
            entity_id: "d-1".to_string(),
            goal_type: GoalType::SalesCount,
            target,
            month: "2024-06".to_string(),
        }
    }

    #[tokio::test]
    async fn test_flush_reflects_watched_write() {
        let state = state().await;
        let handle = MetricsRecomputer::new(state.db.clone(), Duration::from_secs(60)).start();

        state.db.goals().set(&goal(12)).await.unwrap();
        handle.flush().await.unwrap();

        let snapshot = state.db.metrics().dashboard().await.unwrap().unwrap();
        assert!(snapshot.enriched_sales.is_empty());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unwatched_write_does_not_recompute() {
        let state = state().await;
        let handle = MetricsRecomputer::new(state.db.clone(), Duration::from_millis(10)).start();

        let requester = state.db.users().require("admin-2").await.unwrap();
        state.db.transfers().create(&requester, "VIN0001", at(6, 1)).await.unwrap();
        handle.flush().await.unwrap();

        assert!(state.db.metrics().dashboard().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_burst_is_recomputed_after_window() {
        let state = state().await;
        let mut feed = state.db.subscribe_changes();
        let _handle = MetricsRecomputer::new(state.db.clone(), Duration::from_millis(20)).start();

        for target in 1..=5 {
            state.db.goals().set(&goal(target)).await.unwrap();
        }

        let stored = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Ok(change) = feed.recv().await {
                    if change.collection == Collection::Metrics {
                        return change;
                    }
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(stored.document_id, "dashboard");
        assert!(state.db.metrics().dashboard().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_recompute_keeps_previous_snapshot() {
        let state = state().await;
        let handle = MetricsRecomputer::new(state.db.clone(), Duration::from_secs(60)).start();

        state.db.goals().set(&goal(12)).await.unwrap();
        handle.flush().await.unwrap();
        let before = state.db.metrics().dashboard().await.unwrap().unwrap();

        // A sale body that no longer decodes makes the full read fail
        state
            .db
            .documents()
            .set(Collection::Sales, "bad", &serde_json::json!({"x": 1}))
            .await
            .unwrap();
        handle.flush().await.unwrap();

        let after = state.db.metrics().dashboard().await.unwrap().unwrap();
        assert_eq!(after, before);

        // The recomputer is still running
        state.db.documents().delete(Collection::Sales, "bad").await.unwrap();
        handle.flush().await.unwrap();
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_deleted_salesperson_drops_out_of_snapshot() {
        let state = state().await;
        let handle = MetricsRecomputer::new(state.db.clone(), Duration::from_secs(60)).start();

        let sale = NewSale {
            vehicle_id: "VIN0001".to_string(),
            customer: CustomerDetails {
                first_name: "Lee".to_string(),
                last_name: "Park".to_string(),
                ..Default::default()
            },
            sale_price_cents: 3_000_000,
            financing_income_cents: 100_000,
            insurance_income_cents: 50_000,
        };
        state.db.sales().record("sp-1", &sale, at(6, 3)).await.unwrap();
        handle.flush().await.unwrap();

        let snapshot = state.db.metrics().dashboard().await.unwrap().unwrap();
        assert_eq!(snapshot.enriched_sales.len(), 1);
        assert_eq!(snapshot.financial_kpis.total_revenue_cents, 3_150_000);

        RegistryService::new(state.clone())
            .delete_user(
                &caller("factory"),
                &DeleteUserRequest {
                    user_id: "sp-1".to_string(),
                },
            )
            .await
            .unwrap();
        handle.flush().await.unwrap();

        let snapshot = state.db.metrics().dashboard().await.unwrap().unwrap();
        assert!(snapshot.enriched_sales.is_empty());
        assert_eq!(snapshot.financial_kpis.total_revenue_cents, 0);
        assert_eq!(snapshot.financial_kpis.total_profit_cents, 0);
        assert!(snapshot.all_users.iter().all(|u| u.id != "sp-1"));
        // The sale document itself is kept
        assert_eq!(state.db.sales().list().await.unwrap().len(), 1);

        handle.shutdown().await.unwrap();
    }
}
