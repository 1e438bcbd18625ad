//! IP geolocation lookup via ip-api.com.
//!
//! Failures never propagate: they come back as a `GeoLocation` whose
//! `error` field is set.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const IP_API_URL: &str = "http://ip-api.com/json/";
const FIELDS: &str = "status,message,country,countryCode,region,city,lat,lon,isp";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Location of an IP address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub ip: String,
    pub country: String,
    pub country_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub isp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GeoLocation {
    fn failed(ip: &str, error: impl Into<String>) -> Self {
        Self {
            ip: ip.to_string(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Body returned by ip-api.com.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    country: String,
    #[serde(default)]
    country_code: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
    #[serde(default)]
    isp: String,
}

/// HTTP client for geolocation lookups.
pub struct GeoLocator {
    client: reqwest::Client,
    base_url: String,
}

impl GeoLocator {
    pub fn new() -> Self {
        Self::with_base_url(IP_API_URL)
    }

    /// Use a different service endpoint; the IP is appended to `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Look up `ip`.
    pub async fn lookup(&self, ip: &str) -> GeoLocation {
        let url = format!("{}{}?fields={}", self.base_url, ip, FIELDS);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return GeoLocation::failed(ip, e.to_string()),
        };

        let body: IpApiResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => return GeoLocation::failed(ip, e.to_string()),
        };

        if body.status != "success" {
            let reason = body.message.unwrap_or_else(|| "lookup failed".to_string());
            return GeoLocation::failed(ip, reason);
        }

        GeoLocation {
            ip: ip.to_string(),
            country: body.country,
            country_code: body.country_code,
            region: body.region,
            city: body.city,
            latitude: body.lat,
            longitude: body.lon,
            isp: body.isp,
            error: None,
        }
    }
}

impl Default for GeoLocator {
    fn default() -> Self {
        Self::new()
    }
}
