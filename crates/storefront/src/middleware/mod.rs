//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Request ID (recorded on the span and echoed back)
//! 4. Per-session lock (one request at a time per session cookie)
//! 5. Session layer (tower-sessions, in-memory store)
//! 6. Rate limiting on the login route (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;
pub mod session_lock;

pub use auth::{OptionalAuth, RequireAdmin, RequireAuth, clear_current_user, set_current_user};
pub use rate_limit::auth_rate_limiter;
pub use request_id::{RequestId, request_id_middleware};
pub use session::create_session_layer;
pub use session_lock::{SessionLocks, serialize_per_session};
