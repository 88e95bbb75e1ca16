use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use cupid_api::{AppState, AppStateInner, router};
use cupid_db::Database;

fn test_state() -> AppState {
    let db = Database::open_in_memory().unwrap();
    Arc::new(AppStateInner {
        db,
        jwt_secret: "test-secret".into(),
        base_url: "http://localhost:3000".into(),
    })
}

fn seed_roster(state: &AppState, student_id: &str) {
    state
        .db
        .add_official_student(&Uuid::new_v4().to_string(), student_id, "Ana", "Cruz")
        .unwrap();
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request(method, uri, token, body.as_ref()))
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn register_payload(student_id: &str, email: &str) -> Value {
    json!({
        "student_id": student_id,
        "name": "Ana Cruz",
        "course": "BSIT",
        "year": "3rd Year",
        "email": email,
        "password": "valentine1",
        "confirm_password": "valentine1",
    })
}

async fn create_instructor(app: &Router, name: &str) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/admin/instructors",
        None,
        Some(json!({ "name": name, "background_color": "#ffccd5" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["instructor"]["id"].as_str().unwrap().to_string(),
        body["instructor"]["unique_code"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn register_login_and_send_message_flow() {
    let state = test_state();
    seed_roster(&state, "2021-00001");
    let app = router(state.clone());

    let (instructor_id, code) = create_instructor(&app, "Dr. Reyes").await;
    assert_eq!(code.len(), 8);

    // Register issues a token right away
    let (status, body) = send(
        &app,
        "POST",
        "/student/register",
        None,
        Some(register_payload("2021-00001", "ana@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].is_string());

    // Login works too
    let (status, body) = send(
        &app,
        "POST",
        "/student/login",
        None,
        Some(json!({ "student_id": "2021-00001", "password": "valentine1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    // The guard rejects missing and garbage tokens
    let (status, _) = send(&app, "GET", "/student/dashboard", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, "GET", "/student/dashboard", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Dashboard lists the instructor but never leaks the unique code
    let (status, body) = send(&app, "GET", "/student/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let instructors = body["instructors"].as_array().unwrap();
    assert_eq!(instructors.len(), 1);
    assert!(instructors[0].get("unique_code").is_none());

    // Send a message
    let (status, body) = send(
        &app,
        "POST",
        &format!("/student/instructors/{}/messages", instructor_id),
        Some(&token),
        Some(json!({ "message": "Happy hearts day!" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_approved"], json!(true));

    // The instructor's inbox shows it with the sender's details
    let (status, body) = send(
        &app,
        "GET",
        &format!("/instructor/{}/messages", code),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["student_name"], json!("Ana Cruz"));
    assert_eq!(messages[0]["message"], json!("Happy hearts day!"));

    // And the student's profile counts it
    let (status, body) = send(&app, "GET", "/student/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message_count"], json!(1));
    assert_eq!(body["approved_count"], json!(1));
}

#[tokio::test]
async fn registration_is_validated() {
    let state = test_state();
    let app = router(state.clone());

    // Not on the official roster
    let (status, body) = send(
        &app,
        "POST",
        "/student/register",
        None,
        Some(register_payload("2021-00001", "ana@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("official records"));
    assert!(
        state
            .db
            .get_student_by_student_id("2021-00001")
            .unwrap()
            .is_none()
    );

    seed_roster(&state, "2021-00001");

    // Password mismatch
    let mut payload = register_payload("2021-00001", "ana@example.com");
    payload["confirm_password"] = json!("different1");
    let (status, body) = send(&app, "POST", "/student/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Passwords do not match"));

    // Happy path
    let (status, _) = send(
        &app,
        "POST",
        "/student/register",
        None,
        Some(register_payload("2021-00001", "ana@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Same ID or email again is a duplicate
    let (status, body) = send(
        &app,
        "POST",
        "/student/register",
        None,
        Some(register_payload("2021-00001", "other@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already registered"));
}

#[tokio::test]
async fn instructor_message_is_one_shot() {
    let state = test_state();
    let app = router(state);

    let (_, code) = create_instructor(&app, "Dr. Reyes").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/instructor/{}/message", code),
        None,
        Some(json!({ "message": "To my students: thank you." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved"], json!(true));

    // A resubmission is redirected to the inbox, nothing overwritten
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/instructor/{}/message", code),
            None,
            Some(&json!({ "message": "Second thoughts" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("/instructor/{}/messages", code).as_str()
    );

    let (status, body) = send(&app, "GET", &format!("/instructor/{}", code), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("To my students: thank you."));
    assert_eq!(body["is_message_added"], json!(true));
}

#[tokio::test]
async fn unknown_instructor_code_is_not_found() {
    let app = router(test_state());

    let (status, _) = send(&app, "GET", "/instructor/NOPE1234", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/instructor/NOPE1234/messages", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn qr_preview_renders_a_labeled_code() {
    let app = router(test_state());

    let (status, body) = send(
        &app,
        "POST",
        "/admin/qr-preview",
        None,
        Some(json!({ "name": "Dr. Smith" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let temp_code = body["temp_code"].as_str().unwrap();
    assert_eq!(temp_code.len(), 8);
    assert_eq!(
        body["preview_url"].as_str().unwrap(),
        format!("http://localhost:3000/instructor/{}", temp_code)
    );
    // Enough base64 to be a real PNG, ready for a data URI
    assert!(body["qr_code"].as_str().unwrap().len() > 100);
}

#[tokio::test]
async fn deleting_an_instructor_cascades_to_messages() {
    let state = test_state();
    seed_roster(&state, "2021-00002");
    let app = router(state);

    let (instructor_id, code) = create_instructor(&app, "Dr. Diaz").await;

    let (_, body) = send(
        &app,
        "POST",
        "/student/register",
        None,
        Some(register_payload("2021-00002", "ben@example.com")),
    )
    .await;
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/student/instructors/{}/messages", instructor_id),
        Some(&token),
        Some(json!({ "message": "see you in class" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/admin/instructors/{}", instructor_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/instructor/{}", code), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", "/student/messages", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);
}
