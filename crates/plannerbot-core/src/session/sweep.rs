//! Background sweep task.
//!
//! Runs `SessionLifecycle::sweep` on a fixed tick until cancelled. The
//! tick interval doubles as the retry backoff: a failed pass is logged and
//! the next tick simply tries again, forever. Cancellation is cooperative
//! and checked between iterations -- in-flight work for the current tick
//! is allowed to finish.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::notify::TimeoutNotifier;
use crate::repository::session::SessionRepository;
use crate::repository::user::UserRepository;
use crate::session::lifecycle::SessionLifecycle;

/// Fixed-interval driver for the expired-session sweep.
pub struct SweepTask<S, U, N, C> {
    lifecycle: Arc<SessionLifecycle<S, U, N, C>>,
    interval: Duration,
    token: CancellationToken,
}

impl<S, U, N, C> SweepTask<S, U, N, C>
where
    S: SessionRepository + 'static,
    U: UserRepository + 'static,
    N: TimeoutNotifier + 'static,
    C: Clock + 'static,
{
    /// The interval is injectable so tests can tick without real minutes
    /// passing; production wires the configured sweep interval.
    pub fn new(
        lifecycle: Arc<SessionLifecycle<S, U, N, C>>,
        interval: Duration,
        token: CancellationToken,
    ) -> Self {
        Self {
            lifecycle,
            interval,
            token,
        }
    }

    /// Spawn the sweep loop onto the runtime. The handle completes once
    /// the token is cancelled and the current tick (if any) has drained.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "session sweep started");

        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = ticker.tick() => {
                    match self.lifecycle.sweep().await {
                        Ok(stats) if stats.expired > 0 => {
                            info!(
                                expired = stats.expired,
                                ended = stats.ended,
                                notify_failures = stats.notify_failures,
                                "sweep pass complete"
                            );
                        }
                        Ok(_) => {}
                        Err(err) => {
                            warn!(%err, "sweep pass failed, retrying on next tick");
                        }
                    }
                }
            }
        }

        info!("session sweep stopped");
    }
}
