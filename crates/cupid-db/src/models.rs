/// Database row types — these map directly to SQLite rows.
/// Distinct from cupid-types API models to keep the DB layer independent.

pub struct InstructorRow {
    pub id: String,
    pub name: String,
    pub unique_code: String,
    pub message: Option<String>,
    pub background_color: Option<String>,
    pub qr_code: Option<String>,
    pub is_message_added: bool,
    pub created_at: String,
}

/// Dashboard listing row: instructor plus how many messages they received.
pub struct InstructorCountRow {
    pub instructor: InstructorRow,
    pub message_count: i64,
}

pub struct StudentRow {
    pub id: String,
    pub student_id: String,
    pub name: String,
    pub course: String,
    pub year: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct OfficialStudentRow {
    pub id: String,
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
}

/// Inbox row: message joined with the sending student's display fields.
pub struct InboxMessageRow {
    pub id: String,
    pub message: String,
    pub is_approved: bool,
    pub student_name: String,
    pub student_course: String,
    pub student_year: String,
    pub created_at: String,
}

/// Outbox row: message joined with the receiving instructor's name.
pub struct SentMessageRow {
    pub id: String,
    pub instructor_id: String,
    pub instructor_name: String,
    pub message: String,
    pub is_approved: bool,
    pub created_at: String,
}
