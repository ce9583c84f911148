//! Session lifecycle manager.
//!
//! Orchestrates the session store, timeout policy, user directory, and
//! notifier. Per user, a session moves through {no session, active,
//! expired-pending-sweep, ended}; ended is terminal and a new session is
//! created instead of reactivating.
//!
//! The per-request path (`ensure_session`, `check_timeout`) is deliberately
//! decoupled from the background sweep: a user who returns at the timeout
//! boundary gets an immediate expiry-and-renew answer, while the sweep
//! exists to proactively notify users who never send another message.

use chrono::{DateTime, Utc};
use plannerbot_types::error::RepositoryError;
use plannerbot_types::session::Session;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::notify::{TimeoutNotice, TimeoutNotifier};
use crate::repository::session::SessionRepository;
use crate::repository::user::UserRepository;
use crate::session::policy::TimeoutPolicy;

/// What `ensure_session` did for the caller.
///
/// `Renewed` carries both snapshots so the caller can report "previous
/// session expired, new one started" with both identifiers.
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    /// No active session existed; a fresh one was created.
    Started(Session),
    /// The existing session was still live; its activity was bumped.
    Continued(Session),
    /// The existing session had expired; it was closed and replaced.
    Renewed {
        expired: Session,
        replacement: Session,
    },
}

impl SessionOutcome {
    /// The session the conversation continues on.
    pub fn session(&self) -> &Session {
        match self {
            SessionOutcome::Started(session) | SessionOutcome::Continued(session) => session,
            SessionOutcome::Renewed { replacement, .. } => replacement,
        }
    }
}

/// Counters from one sweep pass, for the log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepStats {
    /// Active sessions the store reported as past the cutoff.
    pub expired: usize,
    /// How many of those were actually closed this pass.
    pub ended: usize,
    /// Closed sessions whose owner could not be notified.
    pub notify_failures: usize,
}

/// Orchestrates session creation, extension, expiry, and notification.
///
/// Generic over its collaborators so tests can substitute in-memory stores
/// and a manual clock; constructed once at process start and shared.
pub struct SessionLifecycle<S, U, N, C> {
    sessions: S,
    users: U,
    notifier: N,
    policy: TimeoutPolicy,
    clock: C,
}

impl<S, U, N, C> SessionLifecycle<S, U, N, C>
where
    S: SessionRepository,
    U: UserRepository,
    N: TimeoutNotifier,
    C: Clock,
{
    pub fn new(sessions: S, users: U, notifier: N, policy: TimeoutPolicy, clock: C) -> Self {
        Self {
            sessions,
            users,
            notifier,
            policy,
            clock,
        }
    }

    /// The timeout policy in force (for notification and reply text).
    pub fn policy(&self) -> &TimeoutPolicy {
        &self.policy
    }

    /// Resolve the session a user interaction should run on.
    ///
    /// - no active session -> create one (`Started`)
    /// - live active session -> bump `last_activity` (`Continued`)
    /// - expired active session -> close it and open a replacement
    ///   (`Renewed`); no timeout notification is sent on this path, the
    ///   caller is already answering the user.
    pub async fn ensure_session(
        &self,
        user_id: Uuid,
        context: Option<&str>,
    ) -> Result<SessionOutcome, RepositoryError> {
        let now = self.clock.now();

        let Some(current) = self.sessions.get_active_for_user(&user_id).await? else {
            let session = self
                .sessions
                .create_session(&Session::open(user_id, context.map(String::from), now))
                .await?;
            info!(session_id = %session.id, user_id = %user_id, "session started");
            return Ok(SessionOutcome::Started(session));
        };

        if self.policy.is_expired(current.last_activity, now) {
            let ended_at = self.sessions.end_session(&current.id, now).await?;
            let replacement = self
                .sessions
                .create_session(&Session::open(user_id, context.map(String::from), now))
                .await?;
            info!(
                expired_id = %current.id,
                session_id = %replacement.id,
                user_id = %user_id,
                "expired session closed and renewed"
            );
            let expired = Session {
                active: false,
                ended_at,
                ..current
            };
            return Ok(SessionOutcome::Renewed {
                expired,
                replacement,
            });
        }

        if !self.sessions.bump_activity(&current.id, now).await? {
            warn!(session_id = %current.id, "active session vanished during activity bump");
        }
        Ok(SessionOutcome::Continued(Session {
            last_activity: now,
            ..current
        }))
    }

    /// On-demand expiry check for one user: the synchronous counterpart of
    /// the sweep. Returns whether the user's session expired just now.
    ///
    /// No active session, or a still-live one, is a pure read -- no store
    /// mutation. An expired one is closed and its owner notified exactly as
    /// the sweep would.
    pub async fn check_timeout(&self, user_id: Uuid) -> Result<bool, RepositoryError> {
        let now = self.clock.now();

        let Some(session) = self.sessions.get_active_for_user(&user_id).await? else {
            return Ok(false);
        };
        if !self.policy.is_expired(session.last_activity, now) {
            return Ok(false);
        }

        let Some(ended_at) = self.sessions.end_session(&session.id, now).await? else {
            // Raced with the sweep; the session is gone either way.
            return Ok(true);
        };
        info!(session_id = %session.id, user_id = %user_id, "session expired on demand");

        match self.users.get_user(&user_id).await? {
            Some(user) => self.notify(&session, user.telegram_id, ended_at).await,
            None => warn!(session_id = %session.id, "session owner missing, skipping notification"),
        }

        Ok(true)
    }

    /// One background sweep pass: close every expired active session and
    /// notify its owner.
    ///
    /// Sessions are processed independently -- a store or notify failure on
    /// one is logged and the rest of the pass continues. Notification is
    /// at-most-once: a failed send is never retried and never un-ends the
    /// session.
    pub async fn sweep(&self) -> Result<SweepStats, RepositoryError> {
        let now = self.clock.now();
        let expired = self
            .sessions
            .list_expired_active(self.policy.cutoff(now))
            .await?;

        let mut stats = SweepStats {
            expired: expired.len(),
            ..SweepStats::default()
        };
        if expired.is_empty() {
            return Ok(stats);
        }
        info!(count = expired.len(), "found expired sessions");

        for session in &expired {
            let user = match self.users.get_user(&session.user_id).await {
                Ok(Some(user)) => user,
                Ok(None) => {
                    warn!(session_id = %session.id, "session owner missing, leaving session untouched");
                    continue;
                }
                Err(err) => {
                    warn!(session_id = %session.id, %err, "failed to load session owner");
                    continue;
                }
            };

            let ended_at = match self.sessions.end_session(&session.id, now).await {
                Ok(Some(ended_at)) => ended_at,
                Ok(None) => continue,
                Err(err) => {
                    warn!(session_id = %session.id, %err, "failed to end expired session");
                    continue;
                }
            };
            stats.ended += 1;

            if let Err(err) = self
                .notifier
                .notify_timeout(&TimeoutNotice {
                    telegram_id: user.telegram_id,
                    session_id: session.id,
                    started_at: session.started_at,
                    ended_at,
                    timeout_minutes: self.policy.timeout_minutes(),
                })
                .await
            {
                stats.notify_failures += 1;
                warn!(
                    session_id = %session.id,
                    telegram_id = user.telegram_id,
                    %err,
                    "timeout notification failed"
                );
            } else {
                info!(
                    session_id = %session.id,
                    telegram_id = user.telegram_id,
                    "session ended and user notified"
                );
            }
        }

        Ok(stats)
    }

    async fn notify(&self, session: &Session, telegram_id: i64, ended_at: DateTime<Utc>) {
        let notice = TimeoutNotice {
            telegram_id,
            session_id: session.id,
            started_at: session.started_at,
            ended_at,
            timeout_minutes: self.policy.timeout_minutes(),
        };
        if let Err(err) = self.notifier.notify_timeout(&notice).await {
            warn!(session_id = %session.id, telegram_id, %err, "timeout notification failed");
        }
    }
}
