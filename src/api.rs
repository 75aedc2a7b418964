// HTTP client for the price-comparison backend (JSON request/response)

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("bad response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One general-chat exchange replayed to the backend as context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self { role: "model".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
struct GeneralRequest<'a> {
    message: &'a str,
    api_key: Option<&'a str>,
    history: &'a [HistoryEntry],
}

#[derive(Debug, Clone, Serialize)]
struct PriceRequest<'a> {
    query: &'a str,
    api_key: Option<&'a str>,
    country_code: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct NearbyRequest<'a> {
    query: &'a str,
    latitude: f64,
    longitude: f64,
    min_distance: f64,
    max_distance: f64,
    api_key: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralResponse {
    pub response: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceResponse {
    pub response: String,
    #[serde(default)]
    pub data: Vec<Product>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NearbyResponse {
    pub response: String,
    #[serde(default)]
    pub data: Vec<Store>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Product {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub approx_price: Option<String>,
    #[serde(default)]
    pub shipping: Option<String>,
    #[serde(default)]
    pub is_estimate: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Store {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub total_ratings: u64,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub stock_level: Option<String>,
    #[serde(default)]
    pub open_now: Option<bool>,
    #[serde(default, deserialize_with = "na_as_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "na_as_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default = "default_true")]
    pub is_real_data: bool,
}

impl Store {
    /// Google Maps search URL built from the store coordinates.
    pub fn map_url(&self) -> String {
        format!(
            "https://www.google.com/maps/search/?api=1&query={},{}",
            self.latitude, self.longitude
        )
    }
}

fn default_true() -> bool {
    true
}

/// The backend uses the string "N/A" as a missing-value sentinel for phone
/// and website. Decode it to None at the wire boundary.
fn na_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty() && v != "N/A"))
}

pub struct ApiClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { base_url: base_url.into(), http })
    }

    fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "sending request");
        let response = self.http.post(&url).json(body).send()?;
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    pub fn general(
        &self,
        message: &str,
        api_key: Option<&str>,
        history: &[HistoryEntry],
    ) -> Result<GeneralResponse, ApiError> {
        self.post("/chat/general", &GeneralRequest { message, api_key, history })
    }

    pub fn price(
        &self,
        query: &str,
        api_key: Option<&str>,
        country_code: &str,
    ) -> Result<PriceResponse, ApiError> {
        self.post("/chat/price", &PriceRequest { query, api_key, country_code })
    }

    pub fn nearby_stores(
        &self,
        query: &str,
        latitude: f64,
        longitude: f64,
        min_distance: f64,
        max_distance: f64,
        api_key: Option<&str>,
    ) -> Result<NearbyResponse, ApiError> {
        self.post(
            "/chat/nearby-stores",
            &NearbyRequest { query, latitude, longitude, min_distance, max_distance, api_key },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserialize_full() {
        let json = r#"{
            "source": "Amazon",
            "title": "Sony WH-1000XM5",
            "price": "$348.00",
            "link": "https://example.com/item",
            "approx_price": "₹29,000",
            "shipping": "Free shipping",
            "is_estimate": true
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();

        assert_eq!(product.source, "Amazon");
        assert_eq!(product.title, "Sony WH-1000XM5");
        assert_eq!(product.price, "$348.00");
        assert_eq!(product.approx_price.as_deref(), Some("₹29,000"));
        assert_eq!(product.shipping.as_deref(), Some("Free shipping"));
        assert!(product.is_estimate);
    }

    #[test]
    fn test_product_deserialize_defaults() {
        let json = r#"{"source": "eBay", "title": "Headphones", "price": "$99", "link": "x"}"#;

        let product: Product = serde_json::from_str(json).unwrap();

        assert!(!product.is_estimate);
        assert!(product.approx_price.is_none());
        assert!(product.shipping.is_none());
    }

    #[test]
    fn test_store_deserialize_na_sentinels() {
        let json = r#"{
            "name": "Tech Mart",
            "address": "12 Main St",
            "distance": 3.2,
            "rating": 4.5,
            "total_ratings": 120,
            "price": "$349",
            "stock_level": "In Stock",
            "open_now": true,
            "phone": "N/A",
            "website": "N/A",
            "latitude": 12.97,
            "longitude": 77.59,
            "is_real_data": false
        }"#;

        let store: Store = serde_json::from_str(json).unwrap();

        assert!(store.phone.is_none());
        assert!(store.website.is_none());
        assert!(!store.is_real_data);
        assert_eq!(store.open_now, Some(true));
    }

    #[test]
    fn test_store_deserialize_valid_contacts() {
        let json = r#"{
            "name": "Tech Mart",
            "address": "12 Main St",
            "distance": 3.2,
            "phone": "+1 555 0100",
            "website": "https://techmart.example",
            "latitude": 12.97,
            "longitude": 77.59
        }"#;

        let store: Store = serde_json::from_str(json).unwrap();

        assert_eq!(store.phone.as_deref(), Some("+1 555 0100"));
        assert_eq!(store.website.as_deref(), Some("https://techmart.example"));
        // Missing flag means real data
        assert!(store.is_real_data);
        assert!(store.open_now.is_none());
    }

    #[test]
    fn test_store_map_url() {
        let json = r#"{"name": "A", "address": "B", "latitude": 1.5, "longitude": -2.25}"#;
        let store: Store = serde_json::from_str(json).unwrap();

        assert_eq!(
            store.map_url(),
            "https://www.google.com/maps/search/?api=1&query=1.5,-2.25"
        );
    }

    #[test]
    fn test_price_response_without_data() {
        let json = r#"{"response": "Nothing found"}"#;
        let response: PriceResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.response, "Nothing found");
        assert!(response.data.is_empty());
    }

    #[test]
    fn test_general_request_serializes_null_key() {
        let history = vec![HistoryEntry::user("hi"), HistoryEntry::model("hello")];
        let request = GeneralRequest { message: "how are you", api_key: None, history: &history };

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["message"], "how are you");
        assert!(value["api_key"].is_null());
        assert_eq!(value["history"][0]["role"], "user");
        assert_eq!(value["history"][1]["role"], "model");
    }

    #[test]
    fn test_nearby_request_fields() {
        let request = NearbyRequest {
            query: "laptop",
            latitude: 12.0,
            longitude: 77.0,
            min_distance: 0.0,
            max_distance: 25.0,
            api_key: Some("k"),
        };

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["query"], "laptop");
        assert_eq!(value["min_distance"], 0.0);
        assert_eq!(value["max_distance"], 25.0);
        assert_eq!(value["api_key"], "k");
    }
}
