use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{auth::AuthUser, error::ApiError, state::AppState};

use super::cursor::PageCursor;
use super::dto::{
    CreateProductRequest, ImportProductRequest, ListProductsQuery, ProductPage, ProductResponse,
    SearchQueryParams, UpdateProductRequest, UploadUrlResponse,
};
use super::openfoodfacts::SearchResponse;
use super::repo::{self, Product, SOURCE_MANUAL};
use super::validate::{validate_macronutrients, validate_name};
use super::import;

const IMAGE_URL_TTL_SECS: u64 = 30 * 60;
const UPLOAD_URL_TTL_SECS: u64 = 10 * 60;
const MAX_PAGE_ITEMS: i64 = 100;
const DEFAULT_SEARCH_PAGE_SIZE: u32 = 24;
const MAX_SEARCH_PAGE_SIZE: u32 = 100;

fn product_not_found() -> ApiError {
    ApiError::NotFound("Product not found".into())
}

async fn to_response(state: &AppState, product: Product) -> Result<ProductResponse, ApiError> {
    let image_url = match &product.image_key {
        Some(key) => Some(state.storage.presign_get(key, IMAGE_URL_TTL_SECS).await?),
        None => None,
    };
    let macronutrients = product.macronutrients();
    Ok(ProductResponse {
        id: product.id,
        name: product.name,
        macronutrients,
        image_url,
        barcode: product.barcode,
        source: product.source,
        created_at: product.created_at,
    })
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(q): Query<ListProductsQuery>,
) -> Result<Json<ProductPage>, ApiError> {
    let limit = q.num_items.clamp(1, MAX_PAGE_ITEMS);
    let filter = q
        .name_filter
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty());
    let cursor = q
        .pagination_cursor
        .as_deref()
        .map(PageCursor::decode)
        .transpose()?;

    // Fetch one extra row to learn whether the source is exhausted.
    let (mut rows, continue_cursor) = match filter {
        Some(filter) => {
            let offset = match cursor {
                Some(PageCursor::Search { offset }) => offset,
                Some(PageCursor::Browse { .. }) => {
                    return Err(ApiError::Validation("Invalid pagination cursor".into()))
                }
                None => 0,
            };
            let mut rows = repo::search_page(&state.db, filter, offset, limit + 1).await?;
            let is_done = rows.len() as i64 <= limit;
            rows.truncate(limit as usize);
            let next = (!is_done).then(|| {
                PageCursor::Search {
                    offset: offset + rows.len() as i64,
                }
                .encode()
            });
            (rows, next)
        }
        None => {
            let last_seq = match cursor {
                Some(PageCursor::Browse { last_seq }) => Some(last_seq),
                Some(PageCursor::Search { .. }) => {
                    return Err(ApiError::Validation("Invalid pagination cursor".into()))
                }
                None => None,
            };
            let mut rows = repo::browse_page(&state.db, last_seq, limit + 1).await?;
            let is_done = rows.len() as i64 <= limit;
            rows.truncate(limit as usize);
            let next = if is_done {
                None
            } else {
                rows.last()
                    .map(|last| PageCursor::Browse { last_seq: last.seq }.encode())
            };
            (rows, next)
        }
    };

    let is_done = continue_cursor.is_none();
    let mut page = Vec::with_capacity(rows.len());
    for product in rows.drain(..) {
        page.push(to_response(&state, product).await?);
    }

    Ok(Json(ProductPage {
        page,
        is_done,
        continue_cursor,
    }))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = repo::find(&state.db, product_id)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(Json(to_response(&state, product).await?))
}

#[instrument(skip(state, body))]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Uuid>), ApiError> {
    let name = validate_name(&body.name)?;
    let macros = validate_macronutrients(&body.macronutrients)?;

    let id = repo::insert(
        &state.db,
        &name,
        &macros,
        body.image_blob_ref.as_deref(),
        None,
        SOURCE_MANUAL,
    )
    .await?;

    info!(%user_id, product_id = %id, "product created");
    Ok((StatusCode::CREATED, Json(id)))
}

/// Resolves the image portion of a partial update. A newly supplied image
/// always wins over removeImage; the displaced blob (if any) is returned for
/// deletion before the reference changes hands.
fn resolve_image_patch(
    current: Option<&str>,
    new_ref: Option<String>,
    remove: bool,
) -> (Option<String>, Option<String>) {
    if let Some(new_key) = new_ref {
        (Some(new_key), current.map(str::to_string))
    } else if remove {
        (None, current.map(str::to_string))
    } else {
        (current.map(str::to_string), None)
    }
}

#[instrument(skip(state, body))]
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(product_id): Path<Uuid>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<StatusCode, ApiError> {
    let product = repo::find(&state.db, product_id)
        .await?
        .ok_or_else(product_not_found)?;

    let name = match &body.name {
        Some(name) => validate_name(name)?,
        None => product.name.clone(),
    };
    let macros = match &body.macronutrients {
        Some(input) => validate_macronutrients(input)?,
        None => product.macronutrients(),
    };

    let (image_key, displaced) = resolve_image_patch(
        product.image_key.as_deref(),
        body.image_blob_ref,
        body.remove_image,
    );
    if let Some(old_key) = displaced {
        state.storage.delete_object(&old_key).await?;
    }

    repo::update_fields(&state.db, product_id, &name, &macros, image_key.as_deref()).await?;
    info!(%user_id, %product_id, "product updated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let product = repo::find(&state.db, product_id)
        .await?
        .ok_or_else(product_not_found)?;

    if let Some(key) = &product.image_key {
        state.storage.delete_object(key).await?;
    }
    repo::delete(&state.db, product_id).await?;

    info!(%user_id, %product_id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Step 1 of the upload flow: the client PUTs the image bytes straight to
/// storage at the returned URL, then passes the blob reference back through
/// create or update.
#[instrument(skip(state))]
pub async fn generate_upload_url(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<UploadUrlResponse>, ApiError> {
    let key = format!("products/{}", Uuid::new_v4());
    let upload_url = state.storage.presign_put(&key, UPLOAD_URL_TTL_SECS).await?;
    Ok(Json(UploadUrlResponse {
        upload_url,
        image_blob_ref: key,
    }))
}

/// Defaults the upstream page to 1 and the page size to 24, clamping the
/// latter to 100.
fn resolve_search_page(page: Option<u32>, page_size: Option<u32>) -> (u32, u32) {
    (
        page.unwrap_or(1),
        page_size
            .unwrap_or(DEFAULT_SEARCH_PAGE_SIZE)
            .min(MAX_SEARCH_PAGE_SIZE),
    )
}

#[instrument(skip(state))]
pub async fn search_openfoodfacts(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(params): Query<SearchQueryParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    if params.query.chars().count() < 2 {
        return Err(ApiError::Validation(
            "Search query must be at least 2 characters".into(),
        ));
    }

    let (page, page_size) = resolve_search_page(params.page, params.page_size);
    let result = state.foods.search(&params.query, page, page_size).await?;
    Ok(Json(result))
}

#[instrument(skip(state, body))]
pub async fn import_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<ImportProductRequest>,
) -> Result<(StatusCode, Json<Uuid>), ApiError> {
    let id = import::import_product(&state, body).await?;
    info!(%user_id, product_id = %id, "product imported");
    Ok((StatusCode::CREATED, Json(id)))
}
