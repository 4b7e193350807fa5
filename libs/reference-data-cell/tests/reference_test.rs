use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reference_data_cell::models::{CreateEntryRequest, ReferenceDataError, ReferenceKind, UpdateEntryRequest};
use reference_data_cell::router::reference_routes;
use reference_data_cell::services::ReferenceDataService;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn service_for(server: &MockServer) -> ReferenceDataService {
    ReferenceDataService::new(&TestConfig::with_url(&server.uri()).to_app_config())
}

#[tokio::test]
async fn list_reads_table_for_kind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/dosages"))
        .and(query_param("order", "name.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::reference_entry_response(&Uuid::new_v4().to_string(), "1-0-1"),
            MockSupabaseResponses::reference_entry_response(&Uuid::new_v4().to_string(), "1-1-1"),
        ])))
        .mount(&server)
        .await;

    let entries = service_for(&server).list_entries(ReferenceKind::Dosages, None).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "1-0-1");
}

#[tokio::test]
async fn duplicate_name_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/medicines"))
        .and(body_partial_json(json!({ "name": "Paracetamol 500mg" })))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::error_response(
            "duplicate key value violates unique constraint \"medicines_name_key\"",
            "23505",
        )))
        .mount(&server)
        .await;

    let result = service_for(&server)
        .create_entry(
            ReferenceKind::Medicines,
            CreateEntryRequest {
                name: " Paracetamol 500mg ".to_string(),
                description: None,
            },
            None,
        )
        .await;

    assert_matches!(
        result,
        Err(ReferenceDataError::Duplicate { kind: ReferenceKind::Medicines, name }) if name == "Paracetamol 500mg"
    );
}

#[tokio::test]
async fn blank_name_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let result = service_for(&server)
        .create_entry(
            ReferenceKind::Diagnoses,
            CreateEntryRequest {
                name: "".to_string(),
                description: Some("unused".to_string()),
            },
            None,
        )
        .await;

    assert_matches!(result, Err(ReferenceDataError::ValidationError(_)));
}

#[tokio::test]
async fn update_missing_entry_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/frequencies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = service_for(&server)
        .update_entry(
            ReferenceKind::Frequencies,
            &Uuid::new_v4().to_string(),
            UpdateEntryRequest {
                description: Some("Twice daily".to_string()),
                ..Default::default()
            },
            None,
        )
        .await;

    assert_matches!(result, Err(ReferenceDataError::NotFound(ReferenceKind::Frequencies)));
}

#[tokio::test]
async fn test_router_create_entry() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());
    let user = TestUser::doctor("rao@clinic.example");

    Mock::given(method("POST"))
        .and(path("/rest/v1/instructions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::reference_entry_response(&Uuid::new_v4().to_string(), "After food")
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/instructions")
        .header("authorization", JwtTestUtils::bearer(&user, &config.jwt_secret))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "name": "After food" }).to_string()))
        .unwrap();

    let response = reference_routes(config.to_arc()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json_response["name"], "After food");
}

#[tokio::test]
async fn test_router_unknown_kind_is_rejected() {
    let config = TestConfig::default();
    let user = TestUser::doctor("rao@clinic.example");

    let request = Request::builder()
        .method("GET")
        .uri("/allergies")
        .header("authorization", JwtTestUtils::bearer(&user, &config.jwt_secret))
        .body(Body::empty())
        .unwrap();

    let response = reference_routes(config.to_arc()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
