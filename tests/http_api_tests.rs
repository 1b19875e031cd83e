#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use serde_json::{Value, json};
use task_analyzer::http_api::{self, CapacityResponse, DatasetResponse, ResolveResponse};
use task_analyzer::{BusinessCalendarConfig, HolidayTable, ResolutionReport};
use tower::util::ServiceExt;

const EXPORT: &str = "Created Date,Done Timestamp,Person,Ticket Category
2024-01-02 09:30,2024-01-02 18:30,Alice,Billing
2024-01-03 09:30,2024-01-04 18:30,Alice,Support
2024-01-05 17:00,08/01/2024 09:00,Bob,Billing
2024-01-08 10:00,,Bob,Support
";

fn new_router() -> axum::Router {
    let state = http_api::AppState::new(http_api::Workspace::default());
    http_api::router(state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn csv_upload(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/datasets?sheet=Sheet1")
        .header("content-type", "text/csv")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn january() -> Value {
    json!({ "range": { "start": "2024-01-01", "end": "2024-01-31" } })
}

#[tokio::test]
async fn health_reports_ok() {
    let response = new_router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn resolve_returns_working_days_or_null() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/resolve",
            json!({ "created_at": "2024-01-02 09:30", "completed_at": "2024-01-02 18:30" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: ResolveResponse = read_json(response).await;
    assert_eq!(body.working_days, Some(1.0));

    let response = app
        .oneshot(json_request(
            "POST",
            "/resolve",
            json!({ "created_at": "not-a-date", "completed_at": "2024-01-02 18:30" }),
        ))
        .await
        .unwrap();
    let body: ResolveResponse = read_json(response).await;
    assert_eq!(body.working_days, None);
}

#[tokio::test]
async fn capacity_follows_calendar_updates() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/capacity",
            json!({ "start": "2024-01-01", "end": "2024-01-07" }),
        ))
        .await
        .unwrap();
    let body: CapacityResponse = read_json(response).await;
    assert_eq!(body.working_days, 5);
    assert_eq!(body.hours, 45.0);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/calendar",
            json!({ "work_start": "08:00", "work_end": "12:00", "excluded_dates": ["2024-01-03"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/calendar").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let config: BusinessCalendarConfig = read_json(response).await;
    assert_eq!(config.excluded_dates.len(), 1);

    let response = app
        .oneshot(json_request(
            "POST",
            "/capacity",
            json!({ "start": "2024-01-01", "end": "2024-01-07" }),
        ))
        .await
        .unwrap();
    let body: CapacityResponse = read_json(response).await;
    assert_eq!(body.working_days, 4);
    assert_eq!(body.hours, 16.0);
}

#[tokio::test]
async fn reports_need_an_uploaded_dataset() {
    let response = new_router()
        .oneshot(json_request("POST", "/reports/resolution", january()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = read_json(response).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn upload_is_cached_and_feeds_reports() {
    let app = new_router();

    let response = app.clone().oneshot(csv_upload(EXPORT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let first: DatasetResponse = read_json(response).await;
    assert_eq!(first.rows, 4);
    assert!(!first.cached);

    let response = app.clone().oneshot(csv_upload(EXPORT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second: DatasetResponse = read_json(response).await;
    assert!(second.cached);
    assert_eq!(second.key, first.key);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/reports/resolution", january()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report: ResolutionReport = read_json(response).await;
    assert_eq!(report.total_rows, 4);
    assert_eq!(report.valid_rows, 3);
    assert_eq!(report.people[0].person, "Alice");
    assert_eq!(report.people[0].average_resolution_wd, Some(1.5));

    let mut body = january();
    body["method"] = json!({ "kind": "standard", "default_minutes": 30 });
    let response = app
        .oneshot(json_request("POST", "/reports/productivity", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report: Value = read_json(response).await;
    assert_eq!(report["team_size"], 2);
    assert_eq!(report["people"][0]["time_spent_minutes"], 60.0);
}

#[tokio::test]
async fn preset_with_explicit_today() {
    let app = new_router();
    app.clone().oneshot(csv_upload(EXPORT)).await.unwrap();
    let response = app
        .oneshot(json_request(
            "POST",
            "/reports/resolution",
            json!({ "preset": "last_week", "today": "2024-01-10", "persons": ["Alice"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report: ResolutionReport = read_json(response).await;
    // 2024-01-01 .. 2024-01-07, Alice only
    assert_eq!(report.total_rows, 2);
    assert_eq!(report.people.len(), 1);
}

#[tokio::test]
async fn upload_without_required_columns_is_rejected() {
    let response = new_router()
        .oneshot(csv_upload("Person,Ticket Category\nAlice,Billing\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["error"], "invalid_request");
    assert!(body["message"].as_str().unwrap().contains("Created Date"));
}

#[tokio::test]
async fn inverted_range_is_rejected() {
    let app = new_router();
    app.clone().oneshot(csv_upload(EXPORT)).await.unwrap();
    let response = app
        .oneshot(json_request(
            "POST",
            "/reports/resolution",
            json!({ "range": { "start": "2024-01-31", "end": "2024-01-01" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn preset_before_the_earliest_date_is_rejected() {
    let app = new_router();
    app.clone().oneshot(csv_upload(EXPORT)).await.unwrap();
    let response = app
        .oneshot(json_request(
            "POST",
            "/reports/resolution",
            json!({ "preset": "last_month", "today": NaiveDate::MIN }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["error"], "invalid_request");
    assert!(body["message"].as_str().unwrap().contains("last_month"));
}

fn holiday_router() -> axum::Router {
    let table: HolidayTable = serde_json::from_value(json!({
        "entries": [
            { "date": "2024-01-03", "name": "State day", "subdivision": "SGR" },
            { "date": "2024-01-04", "name": "Johor day", "subdivision": "JHR" },
            { "date": "2024-02-07", "name": "Later state day", "subdivision": "SGR" }
        ]
    }))
    .unwrap();
    let workspace = http_api::Workspace::default().with_holidays(table);
    http_api::router(http_api::AppState::new(workspace))
}

#[tokio::test]
async fn holidays_apply_inside_the_requested_range() {
    let app = holiday_router();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/capacity",
            json!({ "start": "2024-01-01", "end": "2024-01-07" }),
        ))
        .await
        .unwrap();
    let body: CapacityResponse = read_json(response).await;
    assert_eq!(body.working_days, 4);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/resolve",
            json!({ "created_at": "2024-01-02 09:30", "completed_at": "2024-01-04 18:30" }),
        ))
        .await
        .unwrap();
    let body: ResolveResponse = read_json(response).await;
    assert_eq!(body.working_days, Some(2.0));

    // the table never edits the stored calendar
    let response = app
        .oneshot(Request::builder().uri("/calendar").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let config: BusinessCalendarConfig = read_json(response).await;
    assert!(config.excluded_dates.is_empty());
}

#[tokio::test]
async fn invalidation_drops_the_active_dataset() {
    let app = new_router();
    app.clone().oneshot(csv_upload(EXPORT)).await.unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/datasets")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(json_request("POST", "/reports/resolution", january()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
