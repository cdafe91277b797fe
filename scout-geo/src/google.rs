//! Google Geocoding API client.
use crate::{GeoError, GeocodeResult, GeocodingApi};
use async_trait::async_trait;
use scout_http::{Auth, HttpClient, RequestOpts};
use serde::Deserialize;
use std::borrow::Cow;

pub const GOOGLE_MAPS_BASE_URL: &str = "https://maps.googleapis.com";
const GEOCODE_PATH: &str = "maps/api/geocode/json";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Clone)]
pub struct GoogleGeocoder {
    http: HttpClient,
    api_key: String,
    region: Option<String>,
}

impl GoogleGeocoder {
    pub fn new(api_key: String) -> Result<Self, GeoError> {
        Self::with_base_url(GOOGLE_MAPS_BASE_URL, api_key)
    }

    /// Point the client at another host (tests, proxies).
    pub fn with_base_url(base_url: &str, api_key: String) -> Result<Self, GeoError> {
        if api_key.trim().is_empty() {
            return Err(GeoError::Config("Google Maps API key is empty".into()));
        }
        let http = HttpClient::new(base_url)?;
        Ok(Self {
            http,
            api_key,
            region: None,
        })
    }

    /// Bias results towards a ccTLD region (e.g. `"ch"`).
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

#[async_trait]
impl GeocodingApi for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, GeoError> {
        let mut query: Vec<(&str, Cow<'_, str>)> = vec![("address", Cow::Borrowed(address))];
        if let Some(region) = &self.region {
            query.push(("region", Cow::Borrowed(region.as_str())));
        }

        let resp: GeocodeResponse = self
            .http
            .get_json(
                GEOCODE_PATH,
                RequestOpts {
                    query: Some(query),
                    auth: Some(Auth::Query {
                        name: "key",
                        value: Cow::Borrowed(&self.api_key),
                    }),
                    ..Default::default()
                },
            )
            .await?;

        match resp.status.as_str() {
            "OK" => Ok(resp.results),
            "ZERO_RESULTS" => Ok(Vec::new()),
            _ => Err(GeoError::Status {
                message: resp.error_message.unwrap_or_default(),
                status: resp.status,
            }),
        }
    }
}
