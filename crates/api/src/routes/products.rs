//! Catalog routes. Public, no session required.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use attire_core::ProductId;

use crate::db::RepositoryError;
use crate::db::products::{CatalogFilter, ProductRepository};
use crate::error::AppError;
use crate::models::product::{Product, ProductImage, ProductVariant};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_catalog))
        .route("/{productId}", get(product_detail))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogQuery {
    category: Option<String>,
    style: Option<String>,
    /// Comma-separated brand names.
    brand: Option<String>,
    /// Comma-separated sizes.
    size: Option<String>,
    /// Comma-separated colors.
    color: Option<String>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

impl From<CatalogQuery> for CatalogFilter {
    fn from(query: CatalogQuery) -> Self {
        Self {
            category: query.category,
            style: query.style,
            brands: split_list(query.brand.as_deref()),
            sizes: split_list(query.size.as_deref()),
            colors: split_list(query.color.as_deref()),
            min_price: query.min_price,
            max_price: query.max_price,
            sort_by: query.sort_by,
            sort_descending: query
                .sort_order
                .as_deref()
                .is_some_and(|order| order.eq_ignore_ascii_case("desc")),
        }
    }
}

async fn list_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let filter = CatalogFilter::from(query);
    let products = ProductRepository::new(&state.pool).list(&filter).await?;
    Ok(Json(products))
}

#[derive(Debug, Serialize)]
struct ProductDetail {
    #[serde(flatten)]
    product: Product,
    variants: Vec<ProductVariant>,
    images: Vec<ProductImage>,
}

async fn product_detail(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<ProductDetail>, AppError> {
    let products = ProductRepository::new(&state.pool);

    let product = products
        .get_by_id(product_id)
        .await?
        .ok_or(AppError::Repository(RepositoryError::NotFound))?;
    let variants = products.list_variants(product_id).await?;
    let images = products.list_images(product_id).await?;

    Ok(Json(ProductDetail {
        product,
        variants,
        images,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_drops_empties() {
        assert_eq!(
            split_list(Some("Nike, Adidas,,  Puma ")),
            vec!["Nike", "Adidas", "Puma"]
        );
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn test_sort_order_desc_case_insensitive() {
        let query = CatalogQuery {
            category: None,
            style: None,
            brand: None,
            size: None,
            color: None,
            min_price: None,
            max_price: None,
            sort_by: Some("price".to_owned()),
            sort_order: Some("DESC".to_owned()),
        };

        let filter = CatalogFilter::from(query);
        assert!(filter.sort_descending);
    }
}
