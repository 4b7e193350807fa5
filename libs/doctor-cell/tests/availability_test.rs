use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::models::DoctorError;
use doctor_cell::services::AvailabilityService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

async fn mount_doctor(server: &MockServer, doctor_id: &str, windows: &[(&str, &str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(doctor_id, "Dr. Rao", windows)
        ])))
        .mount(server)
        .await;
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

#[tokio::test]
async fn window_resolves_from_weekday_name() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4().to_string();
    mount_doctor(&server, &doctor_id, &[
        ("Monday", "09:00", "12:00"),
        ("Friday", "14:00", "18:00"),
    ]).await;

    let service = AvailabilityService::new(&TestConfig::with_url(&server.uri()).to_app_config());
    let window = service.availability_for(&doctor_id, monday(), None).await.unwrap().unwrap();

    assert_eq!(window.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    assert_eq!(window.end_time, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
}

#[tokio::test]
async fn day_without_clinic_is_not_an_error() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4().to_string();
    mount_doctor(&server, &doctor_id, &[("Monday", "09:00", "12:00")]).await;

    let service = AvailabilityService::new(&TestConfig::with_url(&server.uri()).to_app_config());
    let tuesday = monday().succ_opt().unwrap();

    let window = service.availability_for(&doctor_id, tuesday, None).await.unwrap();
    assert!(window.is_none());
}

#[tokio::test]
async fn duplicate_weekday_takes_first_entry() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4().to_string();
    mount_doctor(&server, &doctor_id, &[
        ("Monday", "10:00", "11:00"),
        ("Monday", "08:00", "17:00"),
    ]).await;

    let service = AvailabilityService::new(&TestConfig::with_url(&server.uri()).to_app_config());
    let window = service.availability_for(&doctor_id, monday(), None).await.unwrap().unwrap();

    assert_eq!(window.start_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
}

#[tokio::test]
async fn unknown_doctor_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = AvailabilityService::new(&TestConfig::with_url(&server.uri()).to_app_config());
    let result = service
        .availability_for(&Uuid::new_v4().to_string(), monday(), None)
        .await;

    assert_matches!(result, Err(DoctorError::NotFound));
}

#[tokio::test]
async fn malformed_id_never_reaches_the_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let service = AvailabilityService::new(&TestConfig::with_url(&server.uri()).to_app_config());
    let result = service.availability_for("not-a-uuid", monday(), None).await;

    assert_matches!(result, Err(DoctorError::ValidationError(_)));
}

#[tokio::test]
async fn store_failure_surfaces_as_database_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("connection reset"))
        .mount(&server)
        .await;

    let service = AvailabilityService::new(&TestConfig::with_url(&server.uri()).to_app_config());
    let result = service
        .availability_for(&Uuid::new_v4().to_string(), monday(), None)
        .await;

    assert_matches!(result, Err(DoctorError::DatabaseError(_)));
}
