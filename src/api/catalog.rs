//! Product and expert directory endpoints

use axum::{
    Json, Router,
    extract::Query,
    routing::get,
};
use serde::Deserialize;

use crate::AppState;
use crate::data::catalog::{self, Expert, Product};

#[derive(Debug, Deserialize)]
struct ProductListParams {
    category: Option<String>,
}

/// GET /api/products
async fn list_products(Query(params): Query<ProductListParams>) -> Json<Vec<Product>> {
    let category = params.category.as_deref().filter(|c| !c.is_empty());
    Json(catalog::products(category))
}

/// GET /api/experts
async fn list_experts() -> Json<Vec<Expert>> {
    Json(catalog::experts())
}

/// Create catalog router
pub fn catalog_router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/experts", get(list_experts))
}
