//! Session-related types.
//!
//! Types stored in the session for authentication state.

use hello_shop_core::{Email, Role, UserId};
use serde::{Deserialize, Serialize};

use crate::catalog::Profile;

/// Session-stored user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: Role,
    /// Avatar URL. Empty when the user has none.
    #[serde(default)]
    pub avatar: String,
}

impl CurrentUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<Profile> for CurrentUser {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            name: profile.name,
            role: profile.role,
            avatar: profile.avatar,
        }
    }
}

/// Session keys for authentication data.
///
/// The cart lives under [`hello_shop_core::CART_SLOT_KEY`].
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the upstream catalog access token.
    pub const ACCESS_TOKEN: &str = "access_token";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_session_json() {
        let user = CurrentUser {
            id: UserId::new(999),
            email: "admin@mail.com".parse().unwrap(),
            name: "Administrator".to_string(),
            role: Role::Admin,
            avatar: String::new(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "admin");
        assert_eq!(json["email"], "admin@mail.com");

        let back: CurrentUser = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
        assert!(back.is_admin());
    }
}
