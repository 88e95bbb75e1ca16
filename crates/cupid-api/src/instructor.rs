use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use uuid::Uuid;

use cupid_types::api::{InboxResponse, SubmitMessageRequest};

use crate::{AppState, convert, internal_error, notice};

fn inbox_path(code: &str) -> String {
    format!("/instructor/{}/messages", code)
}

/// The page behind an instructor's personal link.
pub async fn page(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || db.db.get_instructor_by_code(&code))
        .await
        .map_err(internal_error)?
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(convert::instructor_page(&row)))
}

/// One-shot message save. Once is_message_added is set the primary flow
/// never writes the field again; a resubmission lands on the inbox instead.
pub async fn submit_message(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<SubmitMessageRequest>,
) -> Result<Response, StatusCode> {
    let db = state.clone();
    let lookup_code = code.clone();
    let row = tokio::task::spawn_blocking(move || db.db.get_instructor_by_code(&lookup_code))
        .await
        .map_err(internal_error)?
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;

    if row.is_message_added {
        return Ok(Redirect::to(&inbox_path(&code)).into_response());
    }

    let message = req.message.trim().to_string();
    if message.is_empty() {
        return Ok(notice(StatusCode::BAD_REQUEST, "Please enter a message"));
    }

    let db = state.clone();
    let id = row.id.clone();
    let saved = tokio::task::spawn_blocking(move || db.db.set_instructor_message(&id, &message))
        .await
        .map_err(internal_error)?
        .map_err(internal_error)?;

    if !saved {
        // Lost the race to a concurrent first submission; same answer as a resubmit
        return Ok(Redirect::to(&inbox_path(&code)).into_response());
    }

    Ok(Json(serde_json::json!({ "saved": true })).into_response())
}

/// Inbox view: every message students sent this instructor, newest first.
pub async fn inbox(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let found = tokio::task::spawn_blocking(move || {
        let Some(row) = db.db.get_instructor_by_code(&code)? else {
            return anyhow::Ok(None);
        };
        let messages = db.db.messages_for_instructor(&row.id)?;
        Ok(Some((row, messages)))
    })
    .await
    .map_err(internal_error)?
    .map_err(internal_error)?;

    let Some((row, messages)) = found else {
        return Err(StatusCode::NOT_FOUND);
    };

    Ok(Json(InboxResponse {
        instructor: convert::instructor_page(&row),
        messages: messages.into_iter().map(convert::inbox_message).collect(),
    }))
}

/// A single message, scoped to the owning instructor's code so one
/// instructor's link can't read another's mail.
pub async fn view_message(
    State(state): State<AppState>,
    Path((code, message_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let found = tokio::task::spawn_blocking(move || {
        let Some(row) = db.db.get_instructor_by_code(&code)? else {
            return anyhow::Ok(None);
        };
        db.db
            .get_message_for_instructor(&message_id.to_string(), &row.id)
    })
    .await
    .map_err(internal_error)?
    .map_err(internal_error)?;

    let Some(message) = found else {
        return Err(StatusCode::NOT_FOUND);
    };

    Ok(Json(convert::inbox_message(message)))
}
