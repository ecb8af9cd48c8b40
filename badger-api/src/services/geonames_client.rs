//! GeoNames reverse geocoding client

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoNamesError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("GeoNames returned status {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// GeoNames API client
#[derive(Debug, Clone)]
pub struct GeoNamesClient {
    http_client: reqwest::Client,
    subdivision_url: String,
    ocean_url: String,
    username: String,
}

impl GeoNamesClient {
    pub fn new(
        http_client: reqwest::Client,
        subdivision_url: &str,
        ocean_url: &str,
        username: &str,
    ) -> Self {
        Self {
            http_client,
            subdivision_url: subdivision_url.to_string(),
            ocean_url: ocean_url.to_string(),
            username: username.to_string(),
        }
    }

    /// Country subdivision at a point. Points at sea come back with a
    /// `status` member instead of a country.
    pub async fn country_subdivision(&self, lat: f64, lng: f64) -> Result<Value, GeoNamesError> {
        self.fetch(&self.subdivision_url, lat, lng).await
    }

    /// Ocean or sea at a point
    pub async fn ocean(&self, lat: f64, lng: f64) -> Result<Value, GeoNamesError> {
        self.fetch(&self.ocean_url, lat, lng).await
    }

    async fn fetch(&self, url: &str, lat: f64, lng: f64) -> Result<Value, GeoNamesError> {
        tracing::debug!(url = %url, lat = lat, lng = lng, "Querying GeoNames");

        let response = self
            .http_client
            .get(url)
            .query(&[
                ("lat", lat.to_string()),
                ("lng", lng.to_string()),
                ("username", self.username.clone()),
            ])
            .send()
            .await
            .map_err(|e| GeoNamesError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status != 200 {
            return Err(GeoNamesError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeoNamesError::NetworkError(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| GeoNamesError::ParseError(e.to_string()))
    }
}
