//! Commercial-registry enrichment.
//!
//! Rows come from a delimited export ([`reader`]), are enriched with a
//! building classification and an activity classification ([`enrich`]) and
//! are rendered for the console or as JSON ([`render`]).
pub mod enrich;
pub mod reader;
pub mod render;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use enrich::{EnrichedRow, RegistryEnricher};
pub use reader::{read_rows, read_rows_from_path};
pub use render::{render_json, render_table};

/// One business from the registry export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRow {
    pub address: String,
    pub postal_code: String,
    pub city: String,
    /// Free-text description of the activity.
    pub description: String,
}

impl RegistryRow {
    /// `"{address}, {postal_code} {city}"`, the form sent to the geocoder.
    ///
    /// ```
    /// use scout_registry::RegistryRow;
    ///
    /// let row = RegistryRow {
    ///     address: "Rue de Bourg 8".into(),
    ///     postal_code: "1003".into(),
    ///     city: "Lausanne".into(),
    ///     description: "Boulangerie".into(),
    /// };
    /// assert_eq!(row.address_full(), "Rue de Bourg 8, 1003 Lausanne");
    /// ```
    pub fn address_full(&self) -> String {
        format!("{}, {} {}", self.address, self.postal_code, self.city)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("column {column:?} not found (available: {available:?})")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("separator {0:?} is not a single-byte character")]
    Separator(char),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
