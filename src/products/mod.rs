mod cursor;
mod dto;
pub mod handlers;
mod import;
pub mod openfoodfacts;
mod repo;
mod validate;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/products/:id",
            get(handlers::get_product)
                .patch(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/products/upload-url", post(handlers::generate_upload_url))
        .route(
            "/products/openfoodfacts/search",
            get(handlers::search_openfoodfacts),
        )
        .route("/products/import", post(handlers::import_product))
}
