//! Building-type lookup through a geocoding service.
//!
//! [`building_types`] turns a free-text address into the place types of its
//! best geocoding match, swallowing collaborator failures; [`is_commercial`]
//! checks those types against an allow-list of commercial premises.
pub mod google;

use async_trait::async_trait;
use scout_http::HttpError;
use serde::{Deserialize, Serialize};

pub use google::GoogleGeocoder;

/// Place types considered indicative of a legitimate commercial premises.
///
/// See https://developers.google.com/maps/documentation/places/web-service/supported_types
pub const DEFAULT_COMMERCIAL_TYPES: &[&str] = &["bakery", "bar", "beauty_salon", "restaurant"];

#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("geocoding request failed: {0}")]
    Http(#[from] HttpError),

    #[error("geocoding returned status {status}: {message}")]
    Status { status: String, message: String },

    #[error("geocoding is not configured: {0}")]
    Config(String),
}

/// One candidate location for an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

#[async_trait]
pub trait GeocodingApi: Send + Sync {
    /// Resolve an address into candidate locations, best match first.
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, GeoError>;
}

/// Place types of the best match for `address`; empty on any failure.
pub async fn building_types(api: &dyn GeocodingApi, address: &str) -> Vec<String> {
    tracing::info!("Getting building type for {}", address);
    match api.geocode(address).await {
        Ok(results) => match results.into_iter().next() {
            Some(best) => {
                tracing::info!("For {}, got types: {:?}", address, best.types);
                best.types
            }
            None => {
                tracing::warn!("Could not get building type for {}: no results", address);
                Vec::new()
            }
        },
        Err(err) => {
            tracing::warn!(error = %err, "Could not get building type for {}", address);
            Vec::new()
        }
    }
}

/// True iff at least one of `types` is in `allow_list`.
pub fn is_commercial<S: AsRef<str>>(types: &[String], allow_list: &[S]) -> bool {
    types
        .iter()
        .any(|t| allow_list.iter().any(|allowed| allowed.as_ref() == t))
}

/// Types of a building and whether they mark it as a commercial premises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildingClass {
    pub types: Vec<String>,
    pub official: bool,
}

/// Look up `address` and test the result against `allow_list`.
pub async fn classify_building<S: AsRef<str>>(
    api: &dyn GeocodingApi,
    address: &str,
    allow_list: &[S],
) -> BuildingClass {
    let types = building_types(api, address).await;
    let official = is_commercial(&types, allow_list);
    BuildingClass { types, official }
}
