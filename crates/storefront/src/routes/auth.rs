//! Authentication route handlers.
//!
//! Login accepts the configured admin account, or any account the upstream
//! catalog accepts. The resolved user and upstream token are kept in the
//! session.

use axum::{Json, extract::State};
use hello_shop_core::{Role, UserId};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::catalog::CatalogError;
use crate::config::AdminAccount;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// User id reserved for the built-in admin account.
const ADMIN_USER_ID: i64 = 999;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

fn admin_user(admin: &AdminAccount) -> CurrentUser {
    CurrentUser {
        id: UserId::new(ADMIN_USER_ID),
        email: admin.email.clone(),
        name: "Administrator".to_string(),
        role: Role::Admin,
        avatar: String::new(),
    }
}

/// Log in.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<Value>> {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let admin = &state.config().admin;
    let (user, token) = if admin.matches(&form.email, &form.password) {
        (admin_user(admin), None)
    } else {
        let token = state
            .catalog()
            .login(form.email.trim(), &form.password)
            .await
            .map_err(|e| match e {
                CatalogError::Unauthorized | CatalogError::NotFound(_) => {
                    AppError::Unauthorized("Invalid email or password".to_string())
                }
                other => AppError::Catalog(other),
            })?;
        let profile = state.catalog().profile(&token).await?;
        (CurrentUser::from(profile), Some(token.access_token))
    };

    set_current_user(&session, &user, token.as_deref()).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    info!(user_id = %user.id, role = user.role.as_str(), "user logged in");

    Ok(Json(json!({ "user": user })))
}

/// Log out. The cart stays in the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<Value>> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Json(json!({ "success": true })))
}

/// Current authentication status.
pub async fn me(OptionalAuth(user): OptionalAuth) -> Json<Value> {
    Json(json!({
        "is_authenticated": user.is_some(),
        "user": user,
    }))
}
