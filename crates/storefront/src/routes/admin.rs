//! Admin product CRUD.
//!
//! Writes go to the upstream catalog; the shared listing is updated in place
//! so the change shows without waiting for the next refresh.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use hello_shop_core::{CategoryId, Price, Product, ProductId};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument};

use super::products::for_display;
use crate::catalog::{NewProduct, ProductUpdate};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Body for creating a product.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub title: String,
    pub price: Option<Price>,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "categoryId")]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

impl CreateProductRequest {
    fn validate(self) -> std::result::Result<NewProduct, String> {
        let title = self.title.trim();
        let description = self.description.trim();
        let Some(price) = self.price else {
            return Err("Title, price and description are required".to_string());
        };
        if title.is_empty() || description.is_empty() {
            return Err("Title, price and description are required".to_string());
        }
        if !price.is_positive() {
            return Err("Price must be a positive number".to_string());
        }

        Ok(NewProduct::new(
            title.to_string(),
            price,
            description.to_string(),
            self.category_id,
            self.images,
        ))
    }
}

/// Body for updating a product. Absent fields are unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub price: Option<Price>,
    pub description: Option<String>,
}

impl UpdateProductRequest {
    fn validate(self) -> std::result::Result<ProductUpdate, String> {
        let non_blank = |field: &str, value: Option<String>| match value {
            Some(v) if v.trim().is_empty() => Err(format!("{field} cannot be empty")),
            other => Ok(other.map(|v| v.trim().to_string())),
        };

        let update = ProductUpdate {
            title: non_blank("title", self.title)?,
            price: self.price,
            description: non_blank("description", self.description)?,
        };

        if update.price.is_some_and(|price| !price.is_positive()) {
            return Err("Price must be a positive number".to_string());
        }
        if update.is_empty() {
            return Err("Nothing to update".to_string());
        }
        Ok(update)
    }
}

/// Create a product.
#[instrument(skip(state, admin, request), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let new_product = request.validate().map_err(AppError::BadRequest)?;
    let created = state.catalog().create_product(&new_product).await?;

    info!(product_id = %created.id, "product created");
    state.listing().record_created(created.clone());

    Ok((StatusCode::CREATED, Json(for_display(created))))
}

/// Update a product.
#[instrument(skip(state, admin, request), fields(admin_id = %admin.id, product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    let update = request.validate().map_err(AppError::BadRequest)?;
    let updated = state.catalog().update_product(id, &update).await?;

    info!("product updated");
    state.listing().record_updated(&updated);

    Ok(Json(for_display(updated)))
}

/// Delete a product.
#[instrument(skip(state, admin), fields(admin_id = %admin.id, product_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>> {
    state.catalog().delete_product(id).await?;

    info!("product deleted");
    state.listing().record_deleted(id);

    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hello_shop_core::PLACEHOLDER_IMAGE;

    use super::*;

    fn create_request(json: &str) -> CreateProductRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_create_defaults() {
        let product = create_request(r#"{"title":"Lamp","price":"19.99","description":"Bright"}"#)
            .validate()
            .unwrap();
        assert_eq!(product.category_id, CategoryId::new(1));
        assert_eq!(product.images, vec![PLACEHOLDER_IMAGE.to_string()]);
        assert_eq!(product.price, Price::from_cents(1999));
    }

    #[test]
    fn test_create_requires_fields() {
        assert!(create_request(r#"{"price":10,"description":"x"}"#).validate().is_err());
        assert!(create_request(r#"{"title":"x","description":"x"}"#).validate().is_err());
        assert!(create_request(r#"{"title":"x","price":10,"description":"  "}"#)
            .validate()
            .is_err());
    }

    #[test]
    fn test_create_rejects_non_positive_price() {
        let err = create_request(r#"{"title":"x","price":0,"description":"x"}"#)
            .validate()
            .unwrap_err();
        assert_eq!(err, "Price must be a positive number");
        assert!(create_request(r#"{"title":"x","price":-5,"description":"x"}"#)
            .validate()
            .is_err());
    }

    #[test]
    fn test_create_keeps_category_alias() {
        let product = create_request(r#"{"title":"x","price":1,"description":"x","categoryId":4}"#)
            .validate()
            .unwrap();
        assert_eq!(product.category_id, CategoryId::new(4));
    }

    #[test]
    fn test_update_validation() {
        let parse = |json: &str| serde_json::from_str::<UpdateProductRequest>(json).unwrap();

        let update = parse(r#"{"title":"  New  "}"#).validate().unwrap();
        assert_eq!(update.title.as_deref(), Some("New"));

        assert_eq!(parse("{}").validate().unwrap_err(), "Nothing to update");
        assert!(parse(r#"{"title":""}"#).validate().is_err());
        assert!(parse(r#"{"price":0}"#).validate().is_err());
    }
}
