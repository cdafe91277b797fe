mod common;

use async_trait::async_trait;
use futures::stream;
use scout_common::RetryPolicy;
use scout_config::ColumnNames;
use scout_geo::{GeoError, GeocodeResult, GeocodingApi};
use scout_llm::{ActivityClassifier, GenerateRequest, LlmClient, LlmError, TextStream};
use scout_registry::{read_rows_from_path, render_table, RegistryEnricher};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

type Journal = Arc<Mutex<Vec<String>>>;

const EXPORT: &str = "Raison sociale;Adresse;NPA;Localité;Objet
Boulangerie du Bourg SA;Rue de Bourg 8;1003;Lausanne;Boulangerie, pâtisserie, tea-room
Atelier Lena;Chemin des Vignes 2;1095;Lutry;Fabrication de bougies à domicile
Bar Le Central;Place Centrale 1;1110;Morges;Exploitation d'un bar
Kiosque Gare;Place de la Gare 5;1260;Nyon;Vente de journaux
";

/// Answers from a fixed table and writes every call to the journal.
struct TableGeocoder {
    journal: Journal,
}

#[async_trait]
impl GeocodingApi for TableGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, GeoError> {
        self.journal.lock().unwrap().push(format!("geo:{address}"));
        let types: &[&str] = match address {
            "Rue de Bourg 8, 1003 Lausanne" => &["bakery", "food", "store"],
            "Chemin des Vignes 2, 1095 Lutry" => &["premise"],
            "Place Centrale 1, 1110 Morges" => &["bar", "point_of_interest"],
            _ => {
                return Err(GeoError::Status {
                    status: "OVER_QUERY_LIMIT".into(),
                    message: "quota".into(),
                })
            }
        };
        Ok(vec![GeocodeResult {
            formatted_address: Some(address.to_string()),
            place_id: None,
            types: types.iter().map(|t| t.to_string()).collect(),
        }])
    }
}

/// Says "Officiel" unless the description mentions home production.
struct KeywordLlm {
    journal: Journal,
}

#[async_trait]
impl LlmClient for KeywordLlm {
    async fn generate_stream(&self, request: &GenerateRequest) -> Result<TextStream, LlmError> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("llm:{}", request.prompt));
        if request.prompt.contains("journaux") {
            return Err(LlmError::Stream("connection reset".into()));
        }
        let answer = if request.prompt.contains("domicile") {
            vec!["non-", "officiel"]
        } else {
            vec![" Offi", "ciel\n"]
        };
        let items: Vec<Result<String, LlmError>> =
            answer.into_iter().map(|p| Ok(p.to_string())).collect();
        Ok(Box::pin(stream::iter(items)))
    }
}

fn export_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(EXPORT.as_bytes()).expect("write export");
    file
}

fn enricher(journal: &Journal) -> RegistryEnricher {
    let classifier = ActivityClassifier::new(Arc::new(KeywordLlm {
        journal: journal.clone(),
    }))
    .with_policy(RetryPolicy::immediate(2));
    RegistryEnricher::new(
        Arc::new(TableGeocoder {
            journal: journal.clone(),
        }),
        classifier,
        vec!["bakery".into(), "bar".into(), "beauty_salon".into(), "restaurant".into()],
    )
}

#[tokio::test]
async fn enriches_rows_from_a_file() -> anyhow::Result<()> {
    common::init_test_tracing();
    let file = export_file();
    let rows = read_rows_from_path(file.path(), &ColumnNames::default(), ';', Some(20))?;
    assert_eq!(rows.len(), 4);

    let journal: Journal = Arc::default();
    let out = enricher(&journal).enrich(rows).await;

    let summary: Vec<(&str, bool, &str, bool)> = out
        .iter()
        .map(|r| {
            (
                r.address_full.as_str(),
                r.google_maps_official,
                r.ollama_activity_type.as_str(),
                r.ollama_official,
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Rue de Bourg 8, 1003 Lausanne", true, "officiel", true),
            ("Chemin des Vignes 2, 1095 Lutry", false, "non-officiel", false),
            ("Place Centrale 1, 1110 Morges", true, "officiel", true),
            ("Place de la Gare 5, 1260 Nyon", false, "", false),
        ]
    );
    assert!(out[3].google_maps_building_type.is_empty());

    let table = render_table(&out);
    assert_eq!(table.lines().count(), 5);
    Ok(())
}

#[tokio::test]
async fn geocoding_pass_runs_before_classification_pass() -> anyhow::Result<()> {
    common::init_test_tracing();
    let file = export_file();
    let rows = read_rows_from_path(file.path(), &ColumnNames::default(), ';', Some(2))?;

    let journal: Journal = Arc::default();
    enricher(&journal).enrich(rows).await;

    let calls = journal.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            "geo:Rue de Bourg 8, 1003 Lausanne",
            "geo:Chemin des Vignes 2, 1095 Lutry",
            "llm:Boulangerie, pâtisserie, tea-room",
            "llm:Fabrication de bougies à domicile",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn failing_classifier_is_retried_then_left_empty() -> anyhow::Result<()> {
    common::init_test_tracing();
    let file = export_file();
    let rows: Vec<_> = read_rows_from_path(file.path(), &ColumnNames::default(), ';', None)?
        .into_iter()
        .filter(|r| r.city == "Nyon")
        .collect();

    let journal: Journal = Arc::default();
    let out = enricher(&journal).enrich(rows).await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].ollama_activity_type, "");

    let llm_calls = journal
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.starts_with("llm:"))
        .count();
    assert_eq!(llm_calls, 2);
    Ok(())
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let err = read_rows_from_path(
        std::path::Path::new("/definitely/not/here.csv"),
        &ColumnNames::default(),
        ';',
        None,
    )
    .unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.csv"));
}
