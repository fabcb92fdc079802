use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Per-100g macronutrient record, always non-negative integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macronutrients {
    pub calories: i32,
    pub protein: i32,
    pub carbs: i32,
    pub fat: i32,
}

/// Unvalidated macronutrient input. Fields are deserialized as floats so a
/// non-integer value reaches validation and gets the field-specific message
/// instead of a generic body rejection.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MacronutrientsInput {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub macronutrients: Macronutrients,
    pub image_url: Option<String>,
    pub barcode: Option<String>,
    pub source: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub page: Vec<ProductResponse>,
    pub is_done: bool,
    pub continue_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
    pub name_filter: Option<String>,
    pub pagination_cursor: Option<String>,
    #[serde(default = "default_num_items")]
    pub num_items: i64,
}

fn default_num_items() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub macronutrients: MacronutrientsInput,
    pub image_blob_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub macronutrients: Option<MacronutrientsInput>,
    pub image_blob_ref: Option<String>,
    #[serde(default)]
    pub remove_image: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub image_blob_ref: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQueryParams {
    pub query: String,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportProductRequest {
    pub name: String,
    pub macronutrients: MacronutrientsInput,
    pub image_url: Option<String>,
    pub barcode: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_field_names() {
        let page = ProductPage {
            page: vec![],
            is_done: true,
            continue_cursor: None,
        };
        let json = serde_json::to_string(&page).unwrap();
        assert!(json.contains("\"isDone\":true"));
        assert!(json.contains("\"continueCursor\":null"));
    }

    #[test]
    fn test_product_response_has_image_url() {
        let resp = ProductResponse {
            id: Uuid::new_v4(),
            name: "Banana".into(),
            macronutrients: Macronutrients {
                calories: 89,
                protein: 1,
                carbs: 23,
                fat: 0,
            },
            image_url: None,
            barcode: None,
            source: "manual".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"imageUrl\":null"));
        assert!(json.contains("\"source\":\"manual\""));
        assert!(json.contains("\"calories\":89"));
    }

    #[test]
    fn test_update_request_accepts_partial_body() {
        let req: UpdateProductRequest = serde_json::from_str("{\"removeImage\":true}").unwrap();
        assert!(req.remove_image);
        assert!(req.name.is_none());
        assert!(req.macronutrients.is_none());
        assert!(req.image_blob_ref.is_none());
    }

    #[test]
    fn test_macronutrient_input_accepts_fractions() {
        // Validation, not deserialization, must reject non-integers.
        let input: MacronutrientsInput = serde_json::from_str(
            "{\"calories\":10.5,\"protein\":0,\"carbs\":0,\"fat\":0}",
        )
        .unwrap();
        assert_eq!(input.calories, 10.5);
    }
}
