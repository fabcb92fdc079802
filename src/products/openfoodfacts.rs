use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

pub const UPSTREAM_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
const USER_AGENT: &str = "NutriCodex/1.0 (nutricodex@example.com)";
const SEARCH_FIELDS: &str = "product_name,nutriments,image_url,code,brands";

/// Outbound boundary to the external food database. Search failures are
/// typed (timeout vs upstream); image fetching reports plain errors because
/// the import path swallows them anyway.
#[async_trait]
pub trait FoodFactsClient: Send + Sync {
    async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<SearchResponse, ApiError>;

    /// Downloads an image, returning its bytes and content type.
    async fn fetch_image(&self, url: &str) -> anyhow::Result<(Bytes, String)>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodFactsProduct {
    pub name: String,
    pub calories: i64,
    pub protein: i64,
    pub carbs: i64,
    pub fat: i64,
    pub image_url: Option<String>,
    pub barcode: Option<String>,
    pub brand: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub products: Vec<FoodFactsProduct>,
    pub total_count: i64,
    pub page_count: i64,
    pub page: i64,
}

// --- upstream wire format ---

#[derive(Debug, Default, Deserialize)]
pub struct RawSearchResponse {
    #[serde(default)]
    hits: Vec<RawHit>,
    count: Option<i64>,
    page_count: Option<i64>,
    page: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    product_name: Option<String>,
    nutriments: Option<RawNutriments>,
    image_url: Option<String>,
    code: Option<String>,
    brands: Option<Brands>,
}

#[derive(Debug, Default, Deserialize)]
struct RawNutriments {
    #[serde(rename = "energy-kcal_100g")]
    energy_kcal_100g: Option<Value>,
    proteins_100g: Option<Value>,
    carbohydrates_100g: Option<Value>,
    fat_100g: Option<Value>,
}

/// Brands arrive as a scalar or a list upstream; only the first one counts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Brands {
    One(String),
    Many(Vec<String>),
}

impl Brands {
    fn first(self) -> Option<String> {
        match self {
            Brands::One(s) => Some(s),
            Brands::Many(v) => v.into_iter().next(),
        }
    }
}

/// Upstream nutriment values show up as numbers or numeric strings; anything
/// unparseable counts as 0.
fn round_macro(value: Option<&Value>) -> i64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() => f.round() as i64,
        _ => 0,
    }
}

/// Normalizes an upstream response: records without a non-empty product
/// name are dropped entirely.
pub fn normalize(raw: RawSearchResponse, fallback_page: u32) -> SearchResponse {
    let products = raw
        .hits
        .into_iter()
        .filter_map(|hit| {
            let name = hit.product_name?.trim().to_string();
            if name.is_empty() {
                return None;
            }
            let nutriments = hit.nutriments.unwrap_or_default();
            Some(FoodFactsProduct {
                name,
                calories: round_macro(nutriments.energy_kcal_100g.as_ref()),
                protein: round_macro(nutriments.proteins_100g.as_ref()),
                carbs: round_macro(nutriments.carbohydrates_100g.as_ref()),
                fat: round_macro(nutriments.fat_100g.as_ref()),
                image_url: hit.image_url,
                barcode: hit.code,
                brand: hit.brands.and_then(Brands::first),
            })
        })
        .collect();

    SearchResponse {
        products,
        total_count: raw.count.unwrap_or(0),
        page_count: raw.page_count.unwrap_or(0),
        page: raw.page.unwrap_or(i64::from(fallback_page)),
    }
}

// --- HTTP implementation ---

pub struct HttpFoodFactsClient {
    http: reqwest::Client,
    search_url: String,
}

impl HttpFoodFactsClient {
    pub fn new(search_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(UPSTREAM_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            search_url: search_url.to_string(),
        })
    }
}

fn search_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout("OpenFoodFacts search timed out after 10 seconds".into())
    } else {
        ApiError::Upstream(format!("Failed to search OpenFoodFacts: {e}"))
    }
}

#[async_trait]
impl FoodFactsClient for HttpFoodFactsClient {
    async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<SearchResponse, ApiError> {
        let response = self
            .http
            .get(&self.search_url)
            .query(&[
                ("q", query),
                ("page", &page.to_string()),
                ("page_size", &page_size.to_string()),
                ("fields", SEARCH_FIELDS),
            ])
            .send()
            .await
            .map_err(search_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Upstream(format!(
                "OpenFoodFacts API returned status {}",
                status.as_u16()
            )));
        }

        let raw: RawSearchResponse = response.json().await.map_err(search_error)?;
        Ok(normalize(raw, page))
    }

    async fn fetch_image(&self, url: &str) -> anyhow::Result<(Bytes, String)> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        anyhow::ensure!(status.is_success(), "image host returned status {status}");

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let body = response.bytes().await?;
        Ok((body, content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> RawSearchResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_zero_hit_response() {
        let resp = normalize(parse("{}"), 1);
        assert!(resp.products.is_empty());
        assert_eq!(resp.total_count, 0);
        assert_eq!(resp.page_count, 0);
        assert_eq!(resp.page, 1);
    }

    #[test]
    fn test_nameless_hits_are_dropped() {
        let resp = normalize(
            parse(
                r#"{
                    "hits": [
                        {"product_name": "Banana"},
                        {"product_name": "   "},
                        {"product_name": null},
                        {}
                    ],
                    "count": 4, "page_count": 1, "page": 1
                }"#,
            ),
            1,
        );
        assert_eq!(resp.products.len(), 1);
        assert_eq!(resp.products[0].name, "Banana");
        // counts are upstream totals, not post-filter sizes
        assert_eq!(resp.total_count, 4);
    }

    #[test]
    fn test_macros_round_and_default() {
        let resp = normalize(
            parse(
                r#"{
                    "hits": [{
                        "product_name": " Oat Drink ",
                        "nutriments": {
                            "energy-kcal_100g": 46.7,
                            "proteins_100g": "1.1",
                            "carbohydrates_100g": "not a number"
                        }
                    }]
                }"#,
            ),
            3,
        );
        let p = &resp.products[0];
        assert_eq!(p.name, "Oat Drink");
        assert_eq!(p.calories, 47);
        assert_eq!(p.protein, 1);
        assert_eq!(p.carbs, 0);
        assert_eq!(p.fat, 0);
        assert_eq!(resp.page, 3);
    }

    #[test]
    fn test_brand_scalar_and_list() {
        let resp = normalize(
            parse(
                r#"{
                    "hits": [
                        {"product_name": "A", "brands": "Acme"},
                        {"product_name": "B", "brands": ["First", "Second"]},
                        {"product_name": "C", "brands": []},
                        {"product_name": "D"}
                    ]
                }"#,
            ),
            1,
        );
        let brands: Vec<Option<String>> =
            resp.products.into_iter().map(|p| p.brand).collect();
        assert_eq!(
            brands,
            vec![Some("Acme".into()), Some("First".into()), None, None]
        );
    }

    #[test]
    fn test_barcode_and_image_pass_through() {
        let resp = normalize(
            parse(
                r#"{
                    "hits": [{
                        "product_name": "A",
                        "code": "4000417025005",
                        "image_url": "https://images.example/a.jpg"
                    }]
                }"#,
            ),
            1,
        );
        let p = &resp.products[0];
        assert_eq!(p.barcode.as_deref(), Some("4000417025005"));
        assert_eq!(p.image_url.as_deref(), Some("https://images.example/a.jpg"));
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let p = FoodFactsProduct {
            name: "A".into(),
            calories: 1,
            protein: 2,
            carbs: 3,
            fat: 4,
            image_url: None,
            barcode: None,
            brand: None,
        };
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"imageUrl\":null"));
        assert!(json.contains("\"barcode\":null"));
    }
}
