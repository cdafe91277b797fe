//! Two-pass enrichment: every row is geocoded first, then every description
//! is classified. Calls run one at a time in row order.
use crate::RegistryRow;
use scout_geo::{classify_building, BuildingClass, GeocodingApi};
use scout_llm::{ActivityClass, ActivityClassifier};
use serde::Serialize;
use std::sync::Arc;

/// A registry row with both classifications attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedRow {
    pub address_full: String,
    #[serde(skip)]
    pub row: RegistryRow,
    pub google_maps_building_type: Vec<String>,
    pub google_maps_official: bool,
    pub ollama_activity_type: String,
    pub ollama_official: bool,
}

impl EnrichedRow {
    fn new(row: RegistryRow, building: BuildingClass, activity: ActivityClass) -> Self {
        Self {
            address_full: row.address_full(),
            row,
            google_maps_building_type: building.types,
            google_maps_official: building.official,
            ollama_activity_type: activity.label,
            ollama_official: activity.official,
        }
    }
}

pub struct RegistryEnricher {
    geocoder: Arc<dyn GeocodingApi>,
    classifier: ActivityClassifier,
    commercial_types: Vec<String>,
}

impl RegistryEnricher {
    pub fn new(
        geocoder: Arc<dyn GeocodingApi>,
        classifier: ActivityClassifier,
        commercial_types: Vec<String>,
    ) -> Self {
        Self {
            geocoder,
            classifier,
            commercial_types,
        }
    }

    /// Classify the building behind every row.
    pub async fn classify_buildings(&self, rows: &[RegistryRow]) -> Vec<BuildingClass> {
        let mut out = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            tracing::debug!(row = i + 1, total = rows.len(), "geocoding");
            let class = classify_building(
                self.geocoder.as_ref(),
                &row.address_full(),
                &self.commercial_types,
            )
            .await;
            out.push(class);
        }
        out
    }

    /// Classify the activity described by every row.
    pub async fn classify_activities(&self, rows: &[RegistryRow]) -> Vec<ActivityClass> {
        let mut out = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            tracing::debug!(row = i + 1, total = rows.len(), "classifying activity");
            out.push(self.classifier.classify(&row.description).await);
        }
        out
    }

    /// Run both passes and merge them row by row.
    ///
    /// Collaborator failures never surface here: a row that could not be
    /// geocoded gets no types, one that could not be classified gets an
    /// empty label, and both flags stay false.
    pub async fn enrich(&self, rows: Vec<RegistryRow>) -> Vec<EnrichedRow> {
        tracing::info!(rows = rows.len(), model = self.classifier.model(), "enriching registry rows");
        let buildings = self.classify_buildings(&rows).await;
        let activities = self.classify_activities(&rows).await;

        let enriched: Vec<EnrichedRow> = rows
            .into_iter()
            .zip(buildings)
            .zip(activities)
            .map(|((row, building), activity)| EnrichedRow::new(row, building, activity))
            .collect();

        let commercial = enriched.iter().filter(|r| r.google_maps_official).count();
        let official = enriched.iter().filter(|r| r.ollama_official).count();
        tracing::info!(
            rows = enriched.len(),
            commercial_buildings = commercial,
            official_activities = official,
            "registry enrichment done"
        );
        enriched
    }
}
