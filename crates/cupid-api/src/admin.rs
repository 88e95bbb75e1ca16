use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;
use uuid::Uuid;

use cupid_db::Database;
use cupid_qr::{QrOptions, generate_code, render_qr_base64};
use cupid_types::api::{
    CreateInstructorRequest, DashboardInstructor, InstructorDetailResponse, QrPreviewRequest,
    QrPreviewResponse, RosterEntryRequest,
};
use cupid_types::models::OfficialStudent;

use crate::{AppState, convert, instructor_link, internal_error, notice};

/// Attempts before giving up on minting a code that isn't already taken.
const MINT_ATTEMPTS: usize = 8;

fn mint_unique_code(db: &Database) -> anyhow::Result<String> {
    for _ in 0..MINT_ATTEMPTS {
        let code = generate_code();
        if db.get_instructor_by_code(&code)?.is_none() {
            return Ok(code);
        }
    }
    Err(anyhow!(
        "no unique instructor code after {} attempts",
        MINT_ATTEMPTS
    ))
}

pub async fn list_instructors(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_instructors())
        .await
        .map_err(internal_error)?
        .map_err(internal_error)?;

    let instructors: Vec<DashboardInstructor> =
        rows.into_iter().map(convert::dashboard_instructor).collect();
    Ok(Json(instructors))
}

pub async fn create_instructor(
    State(state): State<AppState>,
    Json(req): Json<CreateInstructorRequest>,
) -> Result<Response, StatusCode> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Ok(notice(StatusCode::BAD_REQUEST, "Instructor name is required"));
    }

    let db = state.clone();
    let base_url = state.base_url.clone();
    let background_color = req.background_color.clone();
    let row = tokio::task::spawn_blocking(move || {
        let code = mint_unique_code(&db.db)?;
        let link = instructor_link(&base_url, &code);

        // A failed render is cosmetic: the instructor still gets created,
        // just without a stored QR image.
        let qr = match render_qr_base64(&link, None, &QrOptions::link()) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                warn!("QR render failed for code {}: {}", code, e);
                None
            }
        };

        let id = Uuid::new_v4().to_string();
        db.db
            .create_instructor(&id, &name, background_color.as_deref(), &code, qr.as_deref())?;
        db.db
            .get_instructor(&id)?
            .ok_or_else(|| anyhow!("instructor {} missing after insert", id))
    })
    .await
    .map_err(internal_error)?
    .map_err(internal_error)?;

    let instructor_url = instructor_link(&state.base_url, &row.unique_code);
    Ok((
        StatusCode::CREATED,
        Json(InstructorDetailResponse {
            instructor: convert::instructor(row),
            instructor_url,
        }),
    )
        .into_response())
}

pub async fn instructor_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || db.db.get_instructor(&id.to_string()))
        .await
        .map_err(internal_error)?
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let instructor_url = instructor_link(&state.base_url, &row.unique_code);
    Ok(Json(InstructorDetailResponse {
        instructor: convert::instructor(row),
        instructor_url,
    }))
}

pub async fn delete_instructor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let db = state.clone();
    let deleted = tokio::task::spawn_blocking(move || db.db.delete_instructor(&id.to_string()))
        .await
        .map_err(internal_error)?
        .map_err(internal_error)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

/// Live preview for the add-instructor form: mints a throwaway code and
/// renders the labeled QR before anything is persisted. Render failures are
/// an expected outcome here, reported in-band rather than as a 500.
pub async fn qr_preview(
    State(state): State<AppState>,
    Json(req): Json<QrPreviewRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let name = req.name.trim().to_string();
    let label = if name.is_empty() {
        "Instructor".to_string()
    } else {
        name
    };

    let temp_code = generate_code();
    let preview_url = instructor_link(&state.base_url, &temp_code);

    let url = preview_url.clone();
    let rendered =
        tokio::task::spawn_blocking(move || render_qr_base64(&url, Some(&label), &QrOptions::badge()))
            .await
            .map_err(internal_error)?;

    let body = match rendered {
        Ok(qr_code) => QrPreviewResponse::ok(qr_code, preview_url, temp_code),
        Err(e) => {
            warn!("QR preview render failed: {}", e);
            QrPreviewResponse::err(e.to_string())
        }
    };
    Ok(Json(body))
}

// -- Official roster --

pub async fn list_roster(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_official_students())
        .await
        .map_err(internal_error)?
        .map_err(internal_error)?;

    let roster: Vec<OfficialStudent> = rows.into_iter().map(convert::official).collect();
    Ok(Json(roster))
}

pub async fn add_roster_entry(
    State(state): State<AppState>,
    Json(req): Json<RosterEntryRequest>,
) -> Result<Response, StatusCode> {
    let student_id = req.student_id.trim().to_string();
    if student_id.is_empty() {
        return Ok(notice(StatusCode::BAD_REQUEST, "Student ID is required"));
    }

    let db = state.clone();
    let added = tokio::task::spawn_blocking(move || {
        db.db.add_official_student(
            &Uuid::new_v4().to_string(),
            &student_id,
            req.first_name.trim(),
            req.last_name.trim(),
        )
    })
    .await
    .map_err(internal_error)?
    .map_err(internal_error)?;

    if added {
        Ok((StatusCode::CREATED, Json(serde_json::json!({ "added": true }))).into_response())
    } else {
        Ok(notice(
            StatusCode::CONFLICT,
            "Student ID is already on the roster",
        ))
    }
}
