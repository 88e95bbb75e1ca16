use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{InboxMessage, Instructor, InstructorCard, SentMessage, Student};

// -- JWT Claims --

/// JWT claims for student sessions, shared between token issuance
/// (student login/register) and the bearer middleware. Canonical definition
/// lives here in cupid-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub exp: usize,
}

// -- Student auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub student_id: String,
    pub name: String,
    pub course: String,
    pub year: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub student_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub student_id: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub student_id: Uuid,
    pub name: String,
    pub token: String,
}

// -- Admin --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateInstructorRequest {
    pub name: String,
    pub background_color: Option<String>,
}

/// Returned on creation and from the admin detail view: the record plus the
/// personal link the QR encodes.
#[derive(Debug, Serialize, Deserialize)]
pub struct InstructorDetailResponse {
    pub instructor: Instructor,
    pub instructor_url: String,
}

/// One row of the admin dashboard listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardInstructor {
    pub id: Uuid,
    pub name: String,
    pub unique_code: String,
    pub background_color: Option<String>,
    pub is_message_added: bool,
    pub message_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QrPreviewRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QrPreviewResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QrPreviewResponse {
    pub fn ok(qr_code: String, preview_url: String, temp_code: String) -> Self {
        Self {
            success: true,
            qr_code: Some(qr_code),
            preview_url: Some(preview_url),
            temp_code: Some(temp_code),
            error: None,
        }
    }

    pub fn err(error: String) -> Self {
        Self {
            success: false,
            qr_code: None,
            preview_url: None,
            temp_code: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RosterEntryRequest {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
}

// -- Instructor pages --

/// What an instructor sees when they open their personal link.
#[derive(Debug, Serialize, Deserialize)]
pub struct InstructorPage {
    pub name: String,
    pub background_color: Option<String>,
    pub message: Option<String>,
    pub is_message_added: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InboxResponse {
    pub instructor: InstructorPage,
    pub messages: Vec<InboxMessage>,
}

// -- Student pages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub student: Student,
    pub instructors: Vec<InstructorCard>,
    pub my_messages: Vec<SentMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewInstructorResponse {
    pub instructor: InstructorCard,
    pub already_messaged: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub student: Student,
    pub message_count: i64,
    pub approved_count: i64,
}
