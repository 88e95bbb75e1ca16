//! Row-to-API conversions. SQLite hands back strings; anything corrupt is
//! logged and replaced with a default rather than failing the whole page.

use tracing::warn;
use uuid::Uuid;

use cupid_db::models::{
    InboxMessageRow, InstructorCountRow, InstructorRow, OfficialStudentRow, SentMessageRow,
    StudentRow,
};
use cupid_types::api::{DashboardInstructor, InstructorPage};
use cupid_types::models::{
    InboxMessage, Instructor, InstructorCard, OfficialStudent, SentMessage, Student,
};

use crate::parse_timestamp;

pub(crate) fn parse_uuid(raw: &str, ctx: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}' on {}: {}", raw, ctx, e);
        Uuid::default()
    })
}

pub(crate) fn instructor(row: InstructorRow) -> Instructor {
    Instructor {
        id: parse_uuid(&row.id, "instructor"),
        name: row.name,
        unique_code: row.unique_code,
        background_color: row.background_color,
        message: row.message,
        is_message_added: row.is_message_added,
        qr_code: row.qr_code,
        created_at: parse_timestamp(&row.created_at, "instructor"),
    }
}

pub(crate) fn instructor_card(row: InstructorRow) -> InstructorCard {
    InstructorCard {
        id: parse_uuid(&row.id, "instructor"),
        name: row.name,
        background_color: row.background_color,
        is_message_added: row.is_message_added,
        created_at: parse_timestamp(&row.created_at, "instructor"),
    }
}

pub(crate) fn instructor_page(row: &InstructorRow) -> InstructorPage {
    InstructorPage {
        name: row.name.clone(),
        background_color: row.background_color.clone(),
        message: row.message.clone(),
        is_message_added: row.is_message_added,
    }
}

pub(crate) fn dashboard_instructor(row: InstructorCountRow) -> DashboardInstructor {
    let InstructorCountRow {
        instructor,
        message_count,
    } = row;
    DashboardInstructor {
        id: parse_uuid(&instructor.id, "instructor"),
        name: instructor.name,
        unique_code: instructor.unique_code,
        background_color: instructor.background_color,
        is_message_added: instructor.is_message_added,
        message_count,
        created_at: parse_timestamp(&instructor.created_at, "instructor"),
    }
}

pub(crate) fn student(row: StudentRow) -> Student {
    Student {
        id: parse_uuid(&row.id, "student"),
        student_id: row.student_id,
        name: row.name,
        course: row.course,
        year: row.year,
        email: row.email,
        created_at: parse_timestamp(&row.created_at, "student"),
    }
}

pub(crate) fn official(row: OfficialStudentRow) -> OfficialStudent {
    OfficialStudent {
        id: parse_uuid(&row.id, "official student"),
        student_id: row.student_id,
        first_name: row.first_name,
        last_name: row.last_name,
        created_at: parse_timestamp(&row.created_at, "official student"),
    }
}

pub(crate) fn inbox_message(row: InboxMessageRow) -> InboxMessage {
    InboxMessage {
        id: parse_uuid(&row.id, "message"),
        message: row.message,
        is_approved: row.is_approved,
        student_name: row.student_name,
        student_course: row.student_course,
        student_year: row.student_year,
        created_at: parse_timestamp(&row.created_at, "message"),
    }
}

pub(crate) fn sent_message(row: SentMessageRow) -> SentMessage {
    SentMessage {
        id: parse_uuid(&row.id, "message"),
        instructor_id: parse_uuid(&row.instructor_id, "message"),
        instructor_name: row.instructor_name,
        message: row.message,
        is_approved: row.is_approved,
        created_at: parse_timestamp(&row.created_at, "message"),
    }
}
