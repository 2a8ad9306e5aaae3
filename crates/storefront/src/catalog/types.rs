//! Request and response bodies for the catalog API.

use hello_shop_core::{CategoryId, Email, PLACEHOLDER_IMAGE, Price, Role, UserId};
use serde::{Deserialize, Serialize};

/// Body for creating a product upstream.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub title: String,
    pub price: Price,
    pub description: String,
    pub category_id: CategoryId,
    pub images: Vec<String>,
}

impl NewProduct {
    /// Build a product body, defaulting the category to 1 and the images to
    /// the placeholder.
    #[must_use]
    pub fn new(
        title: String,
        price: Price,
        description: String,
        category_id: Option<CategoryId>,
        images: Option<Vec<String>>,
    ) -> Self {
        Self {
            title,
            price,
            description,
            category_id: category_id.unwrap_or_else(|| CategoryId::new(1)),
            images: images
                .filter(|images| !images.is_empty())
                .unwrap_or_else(|| vec![PLACEHOLDER_IMAGE.to_string()]),
        }
    }
}

/// Partial update for a product. Absent fields are left untouched upstream.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProductUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.price.is_none() && self.description.is_none()
    }
}

/// Token pair returned by `auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Customer profile returned by `auth/profile`.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub avatar: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_defaults() {
        let product = NewProduct::new(
            "Lamp".to_string(),
            Price::from_cents(1999),
            "A lamp".to_string(),
            None,
            Some(Vec::new()),
        );
        assert_eq!(product.category_id, CategoryId::new(1));
        assert_eq!(product.images, vec![PLACEHOLDER_IMAGE.to_string()]);

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["categoryId"], 1);
        assert_eq!(json["price"], 19.99);
    }

    #[test]
    fn test_update_skips_absent_fields() {
        let update = ProductUpdate {
            title: Some("New".to_string()),
            ..ProductUpdate::default()
        };
        assert!(!update.is_empty());
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"title":"New"}"#
        );
        assert!(ProductUpdate::default().is_empty());
    }

    #[test]
    fn test_profile_from_upstream() {
        let json = r#"{
            "id": 1,
            "email": "john@mail.com",
            "password": "changeme",
            "name": "Jhon",
            "role": "customer",
            "avatar": "https://i.imgur.com/LDOO4Qs.jpg"
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id, UserId::new(1));
        assert_eq!(profile.email.as_str(), "john@mail.com");
        assert_eq!(profile.role, Role::Customer);
    }
}
