pub mod admin;
pub mod instructor;
pub mod middleware;
pub mod student;

mod convert;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{error, warn};

use cupid_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Public origin embedded in instructor links and QR payloads,
    /// e.g. "https://valentine.example.edu".
    pub base_url: String,
}

/// The full route table. Layering (CORS, request tracing) is left to the
/// binary so tests can drive the bare router.
pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route(
            "/admin/instructors",
            get(admin::list_instructors).post(admin::create_instructor),
        )
        .route(
            "/admin/instructors/{id}",
            get(admin::instructor_detail).delete(admin::delete_instructor),
        )
        .route("/admin/qr-preview", post(admin::qr_preview))
        .route(
            "/admin/roster",
            get(admin::list_roster).post(admin::add_roster_entry),
        );

    let instructor_routes = Router::new()
        .route("/instructor/{code}", get(instructor::page))
        .route("/instructor/{code}/message", post(instructor::submit_message))
        .route("/instructor/{code}/messages", get(instructor::inbox))
        .route(
            "/instructor/{code}/messages/{message_id}",
            get(instructor::view_message),
        );

    let student_public = Router::new()
        .route("/student/register", post(student::register))
        .route("/student/login", post(student::login));

    let student_protected = Router::new()
        .route("/student/dashboard", get(student::dashboard))
        .route("/student/instructors/{id}", get(student::view_instructor))
        .route(
            "/student/instructors/{id}/messages",
            post(student::send_message),
        )
        .route("/student/messages", get(student::my_messages))
        .route("/student/profile", get(student::profile))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(admin_routes)
        .merge(instructor_routes)
        .merge(student_public)
        .merge(student_protected)
        .with_state(state)
}

/// 4xx with a JSON `{error}` body: the transient validation notice the
/// client surfaces and re-renders the form around.
pub(crate) fn notice(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

pub(crate) fn internal_error<E: std::fmt::Display>(err: E) -> StatusCode {
    error!("internal error: {}", err);
    StatusCode::INTERNAL_SERVER_ERROR
}

pub(crate) fn instructor_link(base_url: &str, code: &str) -> String {
    format!("{}/instructor/{}", base_url.trim_end_matches('/'), code)
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC when RFC 3339 parsing fails.
pub(crate) fn parse_timestamp(raw: &str, ctx: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {}: {}", raw, ctx, e);
            DateTime::default()
        })
}
