//! Authentication middleware and extractors.
//!
//! Protected routes take one of the extractors below. Rejections depend on
//! the path: `/api/*` requests get a bare status (401 or 403), anything else
//! is redirected to the login page (or home, for non-admins on admin pages).

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a logged-in user with the admin role.
pub struct RequireAdmin(pub CurrentUser);

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this never rejects the request.
pub struct OptionalAuth(pub Option<CurrentUser>);

/// Rejection for the auth extractors.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthRejection {
    /// Redirect to the login page, remembering where the user was going.
    RedirectToLogin { return_url: String },
    /// Redirect non-admins away from admin pages.
    RedirectHome,
    /// 401 for API requests.
    Unauthorized,
    /// 403 for API requests.
    Forbidden,
}

impl AuthRejection {
    fn unauthenticated(parts: &Parts) -> Self {
        if is_api(parts) {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin {
                return_url: request_path(parts).to_string(),
            }
        }
    }

    fn not_admin(parts: &Parts) -> Self {
        if is_api(parts) {
            Self::Forbidden
        } else {
            Self::RedirectHome
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { return_url } => {
                let encoded: String =
                    url::form_urlencoded::byte_serialize(return_url.as_bytes()).collect();
                Redirect::to(&format!("/login?returnUrl={encoded}")).into_response()
            }
            Self::RedirectHome => Redirect::to("/").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

/// Path as the client sent it. Nested routers only see the stripped suffix.
fn request_path(parts: &Parts) -> &str {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or(parts.uri.path(), |original| original.0.path())
}

fn is_api(parts: &Parts) -> bool {
    request_path(parts).starts_with("/api/")
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts)
            .await
            .map(Self)
            .ok_or_else(|| AuthRejection::unauthenticated(parts))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await
            .ok_or_else(|| AuthRejection::unauthenticated(parts))?;

        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %request_path(parts), "non-admin denied");
            return Err(AuthRejection::not_admin(parts));
        }

        Ok(Self(user))
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// Store the logged-in user and their upstream token in the session.
///
/// The session id is cycled first to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
    access_token: Option<&str>,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    match access_token {
        Some(token) => session.insert(session_keys::ACCESS_TOKEN, token).await?,
        None => {
            session.remove::<String>(session_keys::ACCESS_TOKEN).await?;
        }
    }
    Ok(())
}

/// Clear the logged-in user from the session (logout). The cart is kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.remove::<String>(session_keys::ACCESS_TOKEN).await?;
    Ok(())
}
