//! Per-session request serialization.
//!
//! tower-sessions loads a session when a request starts and saves it when the
//! response is produced. Two requests on the same session that overlap would
//! each save their own copy and the later save drops the earlier change, so a
//! double-clicked "add to cart" could lose an item. This middleware sits
//! outside the session layer and holds a per-session mutex for the whole
//! load-handle-save cycle.
//!
//! Requests without a session cookie are not serialized; they get a fresh
//! session each anyway.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use moka::future::Cache;
use tokio::sync::Mutex;
use tower_sessions::cookie::Cookie;
use tracing::trace;

use super::session::SESSION_COOKIE_NAME;

/// Upper bound on tracked sessions.
const MAX_TRACKED_SESSIONS: u64 = 100_000;

/// Locks for sessions idle this long are forgotten.
const LOCK_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Mutexes keyed by session cookie value.
#[derive(Clone)]
pub struct SessionLocks {
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Cache::builder()
                .max_capacity(MAX_TRACKED_SESSIONS)
                .time_to_idle(LOCK_IDLE_TIMEOUT)
                .build(),
        }
    }

    async fn lock_for(&self, session: String) -> Arc<Mutex<()>> {
        self.locks
            .get_with(session, async { Arc::new(Mutex::new(())) })
            .await
    }
}

impl Default for SessionLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// The session cookie value sent with a request, if any.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

/// Middleware that runs requests sharing a session cookie one at a time.
pub async fn serialize_per_session(
    State(locks): State<SessionLocks>,
    request: Request,
    next: Next,
) -> Response {
    let Some(session) = session_cookie(request.headers()) else {
        return next.run(request).await;
    };

    let guard = locks.lock_for(session).await.lock_owned().await;
    trace!("session lock acquired");
    let response = next.run(request).await;
    drop(guard);
    response
}
