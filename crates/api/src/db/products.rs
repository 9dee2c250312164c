//! Catalog repository: products, variants, and images.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use attire_core::ProductId;

use super::RepositoryError;
use crate::models::product::{Product, ProductImage, ProductVariant, SizeStock};

/// Columns selected for every `Product` load, in `FromRow` order.
const PRODUCT_COLUMNS: &str = "id, name, brand, category, style, description, price, sizes, \
     colors, image_url, is_new_arrival, is_active, created_at, updated_at";

/// Sortable catalog columns; anything else is ignored.
const SORTABLE_COLUMNS: &[&str] = &["price", "name", "created_at"];

/// Catalog listing filters, all optional and combined with AND.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// Category name, or the special value `new-arrival`.
    pub category: Option<String>,
    pub style: Option<String>,
    pub brands: Vec<String>,
    /// Match products offering any of these sizes.
    pub sizes: Vec<String>,
    /// Match products offering any of these colors.
    pub colors: Vec<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort_by: Option<String>,
    pub sort_descending: bool,
}

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products matching the filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &CatalogFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active"));

        if let Some(category) = &filter.category {
            if category.eq_ignore_ascii_case("new-arrival") {
                builder.push(" AND is_new_arrival");
            } else {
                builder.push(" AND category = ").push_bind(category.clone());
            }
        }

        if let Some(style) = &filter.style {
            builder.push(" AND style = ").push_bind(style.clone());
        }

        if !filter.brands.is_empty() {
            builder
                .push(" AND brand = ANY(")
                .push_bind(filter.brands.clone())
                .push(")");
        }

        if !filter.sizes.is_empty() {
            builder
                .push(" AND sizes && ")
                .push_bind(filter.sizes.clone());
        }

        if !filter.colors.is_empty() {
            builder
                .push(" AND colors && ")
                .push_bind(filter.colors.clone());
        }

        if let Some(min_price) = filter.min_price {
            builder.push(" AND price >= ").push_bind(min_price);
        }

        if let Some(max_price) = filter.max_price {
            builder.push(" AND price <= ").push_bind(max_price);
        }

        // Sort column comes from the client, so it is matched against a
        // whitelist instead of being interpolated directly.
        if let Some(sort_by) = filter
            .sort_by
            .as_deref()
            .filter(|col| SORTABLE_COLUMNS.contains(col))
        {
            builder.push(format!(
                " ORDER BY {sort_by} {}",
                if filter.sort_descending { "DESC" } else { "ASC" }
            ));
        }

        let products = builder
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await?;

        Ok(products)
    }

    /// Get a product by id, regardless of active flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// All variants of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_variants(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductVariant>, RepositoryError> {
        let variants = sqlx::query_as::<_, ProductVariant>(
            "SELECT id, product_id, color, size, stock FROM product_variants \
             WHERE product_id = $1 ORDER BY color, size",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(variants)
    }

    /// All images of a product, in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_images(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductImage>, RepositoryError> {
        let images = sqlx::query_as::<_, ProductImage>(
            "SELECT id, product_id, color, image_url, is_thumbnail, sequence \
             FROM product_images WHERE product_id = $1 ORDER BY sequence",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(images)
    }

    /// Per-size stock for one color of a product (size-change UI).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_size_stock(
        &self,
        product_id: ProductId,
        color: &str,
    ) -> Result<Vec<SizeStock>, RepositoryError> {
        let sizes = sqlx::query_as::<_, SizeStock>(
            "SELECT size, stock FROM product_variants \
             WHERE product_id = $1 AND color = $2 ORDER BY size",
        )
        .bind(product_id)
        .bind(color)
        .fetch_all(self.pool)
        .await?;

        Ok(sizes)
    }
}
