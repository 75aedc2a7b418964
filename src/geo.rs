// Location detection and geocoding.
//
// Auto-detect resolves the machine's position with an IP geolocation lookup;
// manual entry goes through the Nominatim search API. Either path produces a
// `Location`, after which the distance-range controls become relevant.

use std::time::Duration;

use serde::Deserialize;

const IP_LOOKUP_URL: &str = "http://ip-api.com/json/";
const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const LOOKUP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("location access denied")]
    Denied,
    #[error("location information unavailable")]
    Unavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("location not found")]
    NotFound,
    #[error("location lookup failed: {0}")]
    Other(String),
}

impl GeoError {
    /// The canned user-facing message for each failure class.
    pub fn user_message(&self) -> String {
        match self {
            GeoError::Denied => {
                "❌ Location access denied. Check your network permissions and try again."
                    .to_string()
            }
            GeoError::Unavailable => {
                "❌ Location information is unavailable. Please check your connection.".to_string()
            }
            GeoError::Timeout => "❌ Location request timed out. Please try again.".to_string(),
            GeoError::NotFound => {
                "❌ Location not found. Please try a different query.".to_string()
            }
            GeoError::Other(_) => {
                "❌ An unknown error occurred while getting your location.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub display_name: Option<String>,
}

impl Location {
    /// Short human-readable label: the first three comma-separated components
    /// of the display name, or raw coordinates while none is known.
    pub fn short_label(&self) -> String {
        match &self.display_name {
            Some(name) => name.split(',').take(3).collect::<Vec<_>>().join(",").trim().to_string(),
            None => format!("{:.4}, {:.4}", self.latitude, self.longitude),
        }
    }
}

/// Search distance range in kilometers. The minimum slider runs 0-20, the
/// maximum 5-50, and the minimum must stay strictly below the maximum: any
/// adjustment that violates that bumps the maximum to min + 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceRange {
    min: u32,
    max: u32,
}

pub const MIN_DISTANCE_LIMIT: u32 = 20;
pub const MAX_DISTANCE_LIMIT: u32 = 50;
pub const MAX_DISTANCE_FLOOR: u32 = 5;

impl Default for DistanceRange {
    fn default() -> Self {
        Self { min: 0, max: 25 }
    }
}

impl DistanceRange {
    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn set_min(&mut self, value: u32) {
        self.min = value.min(MIN_DISTANCE_LIMIT);
        self.enforce();
    }

    pub fn set_max(&mut self, value: u32) {
        self.max = value.clamp(MAX_DISTANCE_FLOOR, MAX_DISTANCE_LIMIT);
        self.enforce();
    }

    fn enforce(&mut self) {
        if self.min >= self.max {
            self.max = self.min + 1;
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResult {
    display_name: String,
}

pub struct Geocoder {
    http: reqwest::blocking::Client,
}

impl Geocoder {
    pub fn new() -> Result<Self, GeoError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECS))
            .user_agent(concat!("pricechat-tui/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeoError::Other(e.to_string()))?;
        Ok(Self { http })
    }

    /// Auto-detect the current position from the machine's public IP.
    pub fn auto_detect(&self) -> Result<Location, GeoError> {
        let response = self.http.get(IP_LOOKUP_URL).send().map_err(classify_transport)?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeoError::Denied);
        }

        let body: IpLookupResponse = response.json().map_err(classify_transport)?;
        if body.status != "success" {
            return Err(GeoError::Unavailable);
        }

        tracing::info!(lat = body.lat, lon = body.lon, "auto-detected location");
        Ok(Location {
            latitude: body.lat,
            longitude: body.lon,
            // IP geolocation is city-level at best
            accuracy: 5000.0,
            display_name: None,
        })
    }

    /// Forward geocoding: free-text query to coordinates, first match wins.
    pub fn search(&self, query: &str) -> Result<Location, GeoError> {
        let url = format!(
            "{}?format=json&q={}",
            NOMINATIM_SEARCH_URL,
            urlencoding::encode(query)
        );
        let results: Vec<SearchResult> = self
            .http
            .get(&url)
            .send()
            .map_err(classify_transport)?
            .json()
            .map_err(classify_transport)?;

        let first = results.into_iter().next().ok_or(GeoError::NotFound)?;
        let latitude = first.lat.parse::<f64>().map_err(|e| GeoError::Other(e.to_string()))?;
        let longitude = first.lon.parse::<f64>().map_err(|e| GeoError::Other(e.to_string()))?;

        tracing::info!(latitude, longitude, "resolved manual location");
        Ok(Location {
            latitude,
            longitude,
            accuracy: 0.0,
            display_name: Some(first.display_name),
        })
    }

    /// Reverse geocoding: fill in a human-readable address for coordinates.
    pub fn reverse(&self, latitude: f64, longitude: f64) -> Result<String, GeoError> {
        let url = format!(
            "{}?format=json&lat={}&lon={}",
            NOMINATIM_REVERSE_URL, latitude, longitude
        );
        let result: ReverseResult = self
            .http
            .get(&url)
            .send()
            .map_err(classify_transport)?
            .json()
            .map_err(classify_transport)?;
        Ok(result.display_name)
    }
}

fn classify_transport(error: reqwest::Error) -> GeoError {
    if error.is_timeout() {
        GeoError::Timeout
    } else if error.is_connect() {
        GeoError::Unavailable
    } else {
        GeoError::Other(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_defaults() {
        let range = DistanceRange::default();
        assert_eq!(range.min(), 0);
        assert_eq!(range.max(), 25);
    }

    #[test]
    fn test_range_min_bump_forces_max() {
        let mut range = DistanceRange::default();
        range.set_max(20);
        range.set_min(20);

        // min == max is a violation; max gets bumped
        assert_eq!(range.min(), 20);
        assert_eq!(range.max(), 21);
    }

    #[test]
    fn test_range_max_below_min_bumped() {
        let mut range = DistanceRange::default();
        range.set_min(10);
        range.set_max(8);

        assert_eq!(range.min(), 10);
        assert_eq!(range.max(), 11);
    }

    #[test]
    fn test_range_clamped_to_slider_bounds() {
        let mut range = DistanceRange::default();
        range.set_min(99);
        assert_eq!(range.min(), MIN_DISTANCE_LIMIT);

        range.set_max(99);
        assert_eq!(range.max(), MAX_DISTANCE_LIMIT);

        range.set_max(1);
        // Clamped to the slider floor first, then kept above min (20)
        assert_eq!(range.max(), 21);
    }

    #[test]
    fn test_range_invariant_always_holds() {
        let mut range = DistanceRange::default();
        for min in 0..=25 {
            for max in 0..=55 {
                range.set_min(min);
                range.set_max(max);
                assert!(range.min() < range.max(), "violated at min={} max={}", min, max);
            }
        }
    }

    #[test]
    fn test_location_short_label_truncates_display_name() {
        let location = Location {
            latitude: 12.9716,
            longitude: 77.5946,
            accuracy: 0.0,
            display_name: Some("MG Road, Bengaluru, Karnataka, 560001, India".to_string()),
        };

        assert_eq!(location.short_label(), "MG Road, Bengaluru, Karnataka");
    }

    #[test]
    fn test_location_short_label_falls_back_to_coords() {
        let location = Location {
            latitude: 12.9716,
            longitude: 77.5946,
            accuracy: 5000.0,
            display_name: None,
        };

        assert_eq!(location.short_label(), "12.9716, 77.5946");
    }

    #[test]
    fn test_ip_lookup_response_deserialize() {
        let json = r#"{"status": "success", "lat": 12.97, "lon": 77.59, "city": "Bengaluru"}"#;
        let body: IpLookupResponse = serde_json::from_str(json).unwrap();

        assert_eq!(body.status, "success");
        assert!((body.lat - 12.97).abs() < 0.0001);
    }

    #[test]
    fn test_search_result_string_coords() {
        let json = r#"[{"lat": "12.9716", "lon": "77.5946", "display_name": "Bengaluru, India"}]"#;
        let results: Vec<SearchResult> = serde_json::from_str(json).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].lat.parse::<f64>().unwrap(), 12.9716);
    }

    #[test]
    fn test_error_messages_are_distinct() {
        let messages = [
            GeoError::Denied.user_message(),
            GeoError::Unavailable.user_message(),
            GeoError::Timeout.user_message(),
            GeoError::Other(String::new()).user_message(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in messages.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
