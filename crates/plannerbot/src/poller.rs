//! Telegram long-poll loop.
//!
//! Fetches updates with getUpdates, confirming handled ones by advancing
//! the offset. Transport failures are logged and retried after a short
//! fixed backoff; nothing here is fatal.

use std::time::Duration;

use tracing::{info, warn};

use crate::handlers;
use crate::state::AppState;

/// How long getUpdates holds the connection server-side.
const LONG_POLL_SECS: u64 = 50;

/// Pause after a transport failure before polling again.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub async fn run(state: &AppState) {
    let mut offset: Option<i64> = None;
    info!("update polling started");

    loop {
        match state.api.get_updates(offset, LONG_POLL_SECS).await {
            Ok(updates) => {
                for update in updates {
                    // Advance past this update even if handling fails --
                    // a poisoned update must not wedge the loop.
                    offset = Some(update.update_id + 1);
                    handlers::dispatch(state, update).await;
                }
            }
            Err(err) => {
                warn!(%err, "getUpdates failed, backing off");
                tokio::time::sleep(ERROR_BACKOFF).await;
            }
        }
    }
}
