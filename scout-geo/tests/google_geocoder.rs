use anyhow::Result;
use scout_geo::{
    building_types, classify_building, GeoError, GeocodingApi, GoogleGeocoder,
    DEFAULT_COMMERCIAL_TYPES,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GEOCODE: &str = "/maps/api/geocode/json";

#[tokio::test]
async fn returns_types_of_first_result() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE))
        .and(query_param("address", "Place de la Palud 2, 1003 Lausanne"))
        .and(query_param("key", "test-key"))
        .and(query_param("region", "ch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                {
                    "formatted_address": "Pl. de la Palud 2, 1003 Lausanne, Switzerland",
                    "place_id": "abc",
                    "types": ["bar", "point_of_interest", "establishment"]
                },
                { "types": ["street_address"] }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let geocoder =
        GoogleGeocoder::with_base_url(&server.uri(), "test-key".into())?.with_region("ch");
    let class = classify_building(
        &geocoder,
        "Place de la Palud 2, 1003 Lausanne",
        DEFAULT_COMMERCIAL_TYPES,
    )
    .await;

    assert_eq!(
        class.types,
        vec!["bar", "point_of_interest", "establishment"]
    );
    assert!(class.official);
    Ok(())
}

#[tokio::test]
async fn zero_results_is_an_empty_list() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "ZERO_RESULTS", "results": []})),
        )
        .mount(&server)
        .await;

    let geocoder = GoogleGeocoder::with_base_url(&server.uri(), "k".into())?;
    assert!(geocoder.geocode("xyz").await?.is_empty());
    assert!(building_types(&geocoder, "xyz").await.is_empty());
    Ok(())
}

#[tokio::test]
async fn denied_request_is_an_error_but_lookup_degrades() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "results": []
        })))
        .mount(&server)
        .await;

    let geocoder = GoogleGeocoder::with_base_url(&server.uri(), "bad".into())?;
    match geocoder.geocode("Rue de Bourg 8, 1003 Lausanne").await {
        Err(GeoError::Status { status, message }) => {
            assert_eq!(status, "REQUEST_DENIED");
            assert_eq!(message, "The provided API key is invalid.");
        }
        other => panic!("unexpected: {other:?}"),
    }

    let class = classify_building(&geocoder, "Rue de Bourg 8, 1003 Lausanne", &["bar"]).await;
    assert!(class.types.is_empty());
    assert!(!class.official);
    Ok(())
}

#[tokio::test]
async fn http_failure_degrades_to_empty() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error_message": "Invalid request. Missing the 'address' parameter.",
            "status": "INVALID_REQUEST"
        })))
        .mount(&server)
        .await;

    let geocoder = GoogleGeocoder::with_base_url(&server.uri(), "k".into())?;
    assert!(matches!(geocoder.geocode("").await, Err(GeoError::Http(_))));
    assert!(building_types(&geocoder, "").await.is_empty());
    Ok(())
}

#[test]
fn empty_key_is_rejected() {
    assert!(matches!(
        GoogleGeocoder::new("  ".into()),
        Err(GeoError::Config(_))
    ));
}
