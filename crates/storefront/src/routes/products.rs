//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use hello_shop_core::{Product, ProductId};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::state::AppState;

/// Query parameters for the listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive substring of the product title.
    pub search: Option<String>,
}

/// Replace raw image references with displayable URLs.
pub(crate) fn for_display(mut product: Product) -> Product {
    product.images = product.display_images();
    product
}

/// List products, optionally filtered by title.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Product>> {
    let term = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty());

    let products = state
        .listing()
        .mount()
        .into_iter()
        .filter(|product| term.is_none_or(|term| product.title_matches(term)))
        .map(for_display)
        .collect();

    Json(products)
}

/// Show a single product.
#[instrument(skip(state), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = state.catalog().get_product(id).await?;
    Ok(Json(for_display(product)))
}

#[cfg(test)]
mod tests {
    use hello_shop_core::{Category, CategoryId, PLACEHOLDER_IMAGE, Price};

    use super::*;

    #[test]
    fn test_for_display_normalizes_images() {
        let product = Product {
            id: ProductId::new(1),
            title: "Classic Tee".to_string(),
            price: Price::from_cents(1500),
            description: String::new(),
            category: Category {
                id: CategoryId::new(1),
                name: "Clothes".to_string(),
                image: String::new(),
            },
            images: vec!["\"broken".to_string()],
        };
        assert_eq!(
            for_display(product).images,
            vec![PLACEHOLDER_IMAGE.to_string()]
        );
    }
}
