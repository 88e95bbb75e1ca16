use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Full instructor record, admin-facing. Carries the unique code and the
/// stored QR image; never hand this to students.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instructor {
    pub id: Uuid,
    pub name: String,
    pub unique_code: String,
    pub background_color: Option<String>,
    pub message: Option<String>,
    pub is_message_added: bool,
    /// Base64-encoded PNG, suitable for a `data:image/png;base64,...` URI.
    pub qr_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Student-facing instructor listing. The unique code is the only thing
/// guarding an instructor's inbox, so it is deliberately absent here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructorCard {
    pub id: Uuid,
    pub name: String,
    pub background_color: Option<String>,
    pub is_message_added: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub student_id: String,
    pub name: String,
    pub course: String,
    pub year: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficialStudent {
    pub id: Uuid,
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// A message as seen from the receiving instructor's inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxMessage {
    pub id: Uuid,
    pub message: String,
    pub is_approved: bool,
    pub student_name: String,
    pub student_course: String,
    pub student_year: String,
    pub created_at: DateTime<Utc>,
}

/// A message as seen from the sending student's side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub instructor_name: String,
    pub message: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}
