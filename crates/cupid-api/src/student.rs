use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use cupid_types::api::{
    Claims, DashboardResponse, LoginRequest, LoginResponse, ProfileResponse, RegisterRequest,
    RegisterResponse, SendMessageRequest, ViewInstructorResponse,
};
use cupid_types::models::SentMessage;

use crate::{AppState, convert, internal_error, notice};

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, StatusCode> {
    let student_no = req.student_id.trim().to_string();
    let name = req.name.trim().to_string();
    let email = req.email.trim().to_string();
    let course = req.course.trim().to_string();
    let year = req.year.trim().to_string();

    if student_no.is_empty() || name.is_empty() || course.is_empty() || year.is_empty() || email.is_empty()
    {
        return Ok(notice(StatusCode::BAD_REQUEST, "All fields are required"));
    }
    if req.password != req.confirm_password {
        return Ok(notice(StatusCode::BAD_REQUEST, "Passwords do not match"));
    }
    if req.password.len() < 8 {
        return Ok(notice(
            StatusCode::BAD_REQUEST,
            "Password must be at least 8 characters",
        ));
    }

    // Roster membership and duplicate pre-checks
    let db = state.clone();
    let sid = student_no.clone();
    let mail = email.clone();
    let (official, existing) = tokio::task::spawn_blocking(move || {
        let official = db.db.get_official_by_student_id(&sid)?;
        let existing = db.db.find_student_by_id_or_email(&sid, &mail)?;
        anyhow::Ok((official, existing))
    })
    .await
    .map_err(internal_error)?
    .map_err(internal_error)?;

    if official.is_none() {
        return Ok(notice(
            StatusCode::BAD_REQUEST,
            "Student ID not found in official records. Please contact the administrator.",
        ));
    }
    if existing.is_some() {
        return Ok(notice(
            StatusCode::CONFLICT,
            "Student ID or email already registered. Please login.",
        ));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(internal_error)?
        .to_string();

    let student_uuid = Uuid::new_v4();
    let db = state.clone();
    let row_name = name.clone();
    let created = tokio::task::spawn_blocking(move || {
        db.db.create_student(
            &student_uuid.to_string(),
            &student_no,
            &row_name,
            &course,
            &year,
            &email,
            &password_hash,
        )
    })
    .await
    .map_err(internal_error)?;

    if let Err(e) = created {
        // UNIQUE backstop: two registrations can race past the pre-check
        if cupid_db::is_unique_violation(&e) {
            return Ok(notice(
                StatusCode::CONFLICT,
                "Student ID or email already registered. Please login.",
            ));
        }
        return Err(internal_error(e));
    }

    let token = create_token(&state.jwt_secret, student_uuid, &name).map_err(internal_error)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            student_id: student_uuid,
            token,
        }),
    )
        .into_response())
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let sid = req.student_id.trim().to_string();
    let student = tokio::task::spawn_blocking(move || db.db.get_student_by_student_id(&sid))
        .await
        .map_err(internal_error)?
        .map_err(internal_error)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&student.password).map_err(internal_error)?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let student_uuid: Uuid = student.id.parse().map_err(internal_error)?;
    let token =
        create_token(&state.jwt_secret, student_uuid, &student.name).map_err(internal_error)?;

    Ok(Json(LoginResponse {
        student_id: student_uuid,
        name: student.name,
        token,
    }))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let sid = claims.sub.to_string();
    let found = tokio::task::spawn_blocking(move || {
        let Some(student) = db.db.get_student(&sid)? else {
            return anyhow::Ok(None);
        };
        let instructors = db.db.list_instructors()?;
        let my_messages = db.db.messages_for_student(&sid)?;
        Ok(Some((student, instructors, my_messages)))
    })
    .await
    .map_err(internal_error)?
    .map_err(internal_error)?;

    // Valid token for an account that no longer exists
    let Some((student, instructors, my_messages)) = found else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    Ok(Json(DashboardResponse {
        student: convert::student(student),
        instructors: instructors
            .into_iter()
            .map(|r| convert::instructor_card(r.instructor))
            .collect(),
        my_messages: my_messages.into_iter().map(convert::sent_message).collect(),
    }))
}

pub async fn view_instructor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let sid = claims.sub.to_string();
    let iid = id.to_string();
    let found = tokio::task::spawn_blocking(move || {
        let Some(row) = db.db.get_instructor(&iid)? else {
            return anyhow::Ok(None);
        };
        let already_messaged = db.db.has_messaged(&sid, &iid)?;
        Ok(Some((row, already_messaged)))
    })
    .await
    .map_err(internal_error)?
    .map_err(internal_error)?;

    let Some((row, already_messaged)) = found else {
        return Err(StatusCode::NOT_FOUND);
    };

    Ok(Json(ViewInstructorResponse {
        instructor: convert::instructor_card(row),
        already_messaged,
    }))
}

/// Students may send an instructor any number of messages; each is approved
/// on insert.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Response, StatusCode> {
    let message = req.message.trim().to_string();
    if message.is_empty() {
        return Ok(notice(StatusCode::BAD_REQUEST, "Please enter a message"));
    }

    let message_id = Uuid::new_v4();
    let db = state.clone();
    let sid = claims.sub.to_string();
    let iid = id.to_string();
    let body = message.clone();
    let instructor = tokio::task::spawn_blocking(move || {
        let Some(instructor) = db.db.get_instructor(&iid)? else {
            return anyhow::Ok(None);
        };
        db.db
            .insert_student_message(&message_id.to_string(), &sid, &iid, &body, true)?;
        Ok(Some(instructor))
    })
    .await
    .map_err(internal_error)?
    .map_err(internal_error)?;

    let Some(instructor) = instructor else {
        return Err(StatusCode::NOT_FOUND);
    };

    Ok((
        StatusCode::CREATED,
        Json(SentMessage {
            id: message_id,
            instructor_id: id,
            instructor_name: instructor.name,
            message,
            is_approved: true,
            created_at: chrono::Utc::now(),
        }),
    )
        .into_response())
}

pub async fn my_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let sid = claims.sub.to_string();
    let rows = tokio::task::spawn_blocking(move || db.db.messages_for_student(&sid))
        .await
        .map_err(internal_error)?
        .map_err(internal_error)?;

    let messages: Vec<SentMessage> = rows.into_iter().map(convert::sent_message).collect();
    Ok(Json(messages))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let sid = claims.sub.to_string();
    let found = tokio::task::spawn_blocking(move || {
        let Some(student) = db.db.get_student(&sid)? else {
            return anyhow::Ok(None);
        };
        let counts = db.db.message_counts(&sid)?;
        Ok(Some((student, counts)))
    })
    .await
    .map_err(internal_error)?
    .map_err(internal_error)?;

    let Some((student, (message_count, approved_count))) = found else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    Ok(Json(ProfileResponse {
        student: convert::student(student),
        message_count,
        approved_count,
    }))
}

fn create_token(secret: &str, student_id: Uuid, name: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: student_id,
        name: name.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
