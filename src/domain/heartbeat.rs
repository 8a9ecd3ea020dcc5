//! Per-connection keep-alive timer.
//!
//! Every open connection gets its own tokio task, so a slow client only
//! delays its own heartbeats. The task writes a comment frame each period;
//! a failed write disconnects the connection, which also aborts the task.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::hub::DisconnectReason;
use super::{Connection, StreamHub, WriteOutcome};

/// Default interval between heartbeats.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Starts the heartbeat task for `connection`.
///
/// The first heartbeat is written one full `period` after this call.
#[must_use = "the handle must be attached to the connection so cleanup can cancel it"]
pub fn spawn(hub: Arc<StreamHub>, connection: Arc<Connection>, period: Duration) -> AbortHandle {
    let first = Instant::now() + period;
    tokio::spawn(run(hub, connection, first, period)).abort_handle()
}

async fn run(hub: Arc<StreamHub>, connection: Arc<Connection>, first: Instant, period: Duration) {
    let mut ticker = tokio::time::interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match connection.heartbeat() {
            Ok(WriteOutcome::Written) => {
                tracing::trace!(connection_id = %connection.id(), "heartbeat sent");
            }
            Ok(WriteOutcome::Skipped) => {
                if connection.is_closed() {
                    break;
                }
            }
            Err(err) => {
                tracing::debug!(
                    connection_id = %connection.id(),
                    topic = %connection.topic(),
                    error = %err,
                    "heartbeat write failed"
                );
                hub.disconnect(&connection, DisconnectReason::HeartbeatFailed);
                break;
            }
        }
    }
}
