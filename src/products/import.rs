use tracing::debug;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

use super::dto::ImportProductRequest;
use super::repo::{self, SOURCE_OPENFOODFACTS};
use super::validate::{validate_macronutrients, validate_name};

/// Imports a product from the external food database through the same
/// validated-insert path as manual creation. Validation runs before the
/// image download so a rejected import cannot leak an orphan blob.
pub async fn import_product(
    state: &AppState,
    req: ImportProductRequest,
) -> Result<Uuid, ApiError> {
    let name = validate_name(&req.name)?;
    let macros = validate_macronutrients(&req.macronutrients)?;

    let image_key = match req.image_url.as_deref() {
        Some(url) => fetch_and_store_image(state, url).await,
        None => None,
    };

    let id = repo::insert(
        &state.db,
        &name,
        &macros,
        image_key.as_deref(),
        req.barcode.as_deref(),
        SOURCE_OPENFOODFACTS,
    )
    .await?;
    Ok(id)
}

/// Best effort: any failure here means the product is created without an
/// image, never a failed import.
async fn fetch_and_store_image(state: &AppState, url: &str) -> Option<String> {
    let (body, content_type) = match state.foods.fetch_image(url).await {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, url, "image download failed, importing without image");
            return None;
        }
    };

    let key = format!("products/{}", Uuid::new_v4());
    match state.storage.put_object(&key, body, &content_type).await {
        Ok(()) => Some(key),
        Err(e) => {
            debug!(error = %e, key, "image store failed, importing without image");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::error::ApiError;
    use crate::products::openfoodfacts::{FoodFactsClient, SearchResponse};
    use crate::state::AppState;

    use super::fetch_and_store_image;

    struct WorkingFoods;

    #[async_trait]
    impl FoodFactsClient for WorkingFoods {
        async fn search(
            &self,
            _query: &str,
            _page: u32,
            _page_size: u32,
        ) -> Result<SearchResponse, ApiError> {
            unimplemented!("not used in this test")
        }

        async fn fetch_image(&self, _url: &str) -> anyhow::Result<(Bytes, String)> {
            Ok((Bytes::from_static(b"jpeg bytes"), "image/jpeg".into()))
        }
    }

    #[tokio::test]
    async fn test_failed_download_yields_no_key() {
        // The fake state's food client rejects every image fetch.
        let state = AppState::fake();
        let key = fetch_and_store_image(&state, "https://images.example/x.jpg").await;
        assert!(key.is_none());
    }

    #[tokio::test]
    async fn test_successful_download_stores_under_products_prefix() {
        let mut state = AppState::fake();
        state.foods = Arc::new(WorkingFoods);

        let key = fetch_and_store_image(&state, "https://images.example/x.jpg")
            .await
            .unwrap();
        assert!(key.starts_with("products/"));
    }
}
