use crate::Database;
use crate::models::{
    InboxMessageRow, InstructorCountRow, InstructorRow, OfficialStudentRow, SentMessageRow,
    StudentRow,
};
use anyhow::Result;
use rusqlite::Row;

impl Database {
    // -- Instructors --

    pub fn create_instructor(
        &self,
        id: &str,
        name: &str,
        background_color: Option<&str>,
        unique_code: &str,
        qr_code: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO instructors (id, name, background_color, unique_code, qr_code)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, name, background_color, unique_code, qr_code],
            )?;
            Ok(())
        })
    }

    pub fn get_instructor(&self, id: &str) -> Result<Option<InstructorRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {INSTRUCTOR_COLS} FROM instructors WHERE id = ?1"
            ))?;
            let row = stmt.query_row([id], map_instructor).optional()?;
            Ok(row)
        })
    }

    pub fn get_instructor_by_code(&self, unique_code: &str) -> Result<Option<InstructorRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {INSTRUCTOR_COLS} FROM instructors WHERE unique_code = ?1"
            ))?;
            let row = stmt.query_row([unique_code], map_instructor).optional()?;
            Ok(row)
        })
    }

    /// All instructors, newest first, each with a received-message count.
    pub fn list_instructors(&self) -> Result<Vec<InstructorCountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT i.id, i.name, i.unique_code, i.message, i.background_color,
                        i.qr_code, i.is_message_added, i.created_at, COUNT(m.id)
                 FROM instructors i
                 LEFT JOIN student_messages m ON m.instructor_id = i.id
                 GROUP BY i.id
                 ORDER BY i.created_at DESC, i.id",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(InstructorCountRow {
                        instructor: map_instructor(row)?,
                        message_count: row.get(8)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// One-shot message save: only succeeds while is_message_added is still
    /// unset. Returns false when the message was already written.
    pub fn set_instructor_message(&self, id: &str, message: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE instructors
                 SET message = ?2, is_message_added = 1
                 WHERE id = ?1 AND is_message_added = 0",
                rusqlite::params![id, message],
            )?;
            Ok(changed == 1)
        })
    }

    /// Returns false when no such instructor existed. Messages go with it
    /// via ON DELETE CASCADE.
    pub fn delete_instructor(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM instructors WHERE id = ?1", [id])?;
            Ok(changed == 1)
        })
    }

    // -- Students --

    pub fn create_student(
        &self,
        id: &str,
        student_id: &str,
        name: &str,
        course: &str,
        year: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO students (id, student_id, name, course, year, email, password)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![id, student_id, name, course, year, email, password_hash],
            )?;
            Ok(())
        })
    }

    pub fn get_student(&self, id: &str) -> Result<Option<StudentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {STUDENT_COLS} FROM students WHERE id = ?1"
            ))?;
            let row = stmt.query_row([id], map_student).optional()?;
            Ok(row)
        })
    }

    pub fn get_student_by_student_id(&self, student_id: &str) -> Result<Option<StudentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {STUDENT_COLS} FROM students WHERE student_id = ?1"
            ))?;
            let row = stmt.query_row([student_id], map_student).optional()?;
            Ok(row)
        })
    }

    /// Registration duplicate pre-check: either field taken means taken.
    pub fn find_student_by_id_or_email(
        &self,
        student_id: &str,
        email: &str,
    ) -> Result<Option<StudentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {STUDENT_COLS} FROM students WHERE student_id = ?1 OR email = ?2"
            ))?;
            let row = stmt
                .query_row(rusqlite::params![student_id, email], map_student)
                .optional()?;
            Ok(row)
        })
    }

    // -- Official roster --

    /// Idempotent per student_id. Returns true if a new row was added.
    pub fn add_official_student(
        &self,
        id: &str,
        student_id: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO official_students (id, student_id, first_name, last_name)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, student_id, first_name, last_name],
            )?;
            Ok(changed == 1)
        })
    }

    pub fn get_official_by_student_id(
        &self,
        student_id: &str,
    ) -> Result<Option<OfficialStudentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, student_id, first_name, last_name, created_at
                 FROM official_students WHERE student_id = ?1",
            )?;
            let row = stmt.query_row([student_id], map_official).optional()?;
            Ok(row)
        })
    }

    pub fn list_official_students(&self) -> Result<Vec<OfficialStudentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, student_id, first_name, last_name, created_at
                 FROM official_students ORDER BY student_id",
            )?;
            let rows = stmt
                .query_map([], map_official)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Student messages --

    pub fn insert_student_message(
        &self,
        id: &str,
        student_id: &str,
        instructor_id: &str,
        message: &str,
        is_approved: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO student_messages (id, student_id, instructor_id, message, is_approved)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, student_id, instructor_id, message, is_approved],
            )?;
            Ok(())
        })
    }

    /// Inbox for one instructor, newest first, with sender display fields.
    pub fn messages_for_instructor(&self, instructor_id: &str) -> Result<Vec<InboxMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.message, m.is_approved, s.name, s.course, s.year, m.created_at
                 FROM student_messages m
                 JOIN students s ON m.student_id = s.id
                 WHERE m.instructor_id = ?1
                 ORDER BY m.created_at DESC, m.id",
            )?;

            let rows = stmt
                .query_map([instructor_id], map_inbox_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// One inbox message, scoped to its owning instructor. Returns None for a
    /// message id that exists but belongs to someone else's inbox.
    pub fn get_message_for_instructor(
        &self,
        message_id: &str,
        instructor_id: &str,
    ) -> Result<Option<InboxMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.message, m.is_approved, s.name, s.course, s.year, m.created_at
                 FROM student_messages m
                 JOIN students s ON m.student_id = s.id
                 WHERE m.id = ?1 AND m.instructor_id = ?2",
            )?;
            let row = stmt
                .query_row(rusqlite::params![message_id, instructor_id], map_inbox_message)
                .optional()?;
            Ok(row)
        })
    }

    /// Everything one student has sent, newest first.
    pub fn messages_for_student(&self, student_id: &str) -> Result<Vec<SentMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.instructor_id, i.name, m.message, m.is_approved, m.created_at
                 FROM student_messages m
                 JOIN instructors i ON m.instructor_id = i.id
                 WHERE m.student_id = ?1
                 ORDER BY m.created_at DESC, m.id",
            )?;

            let rows = stmt
                .query_map([student_id], map_sent_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn has_messaged(&self, student_id: &str, instructor_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM student_messages
                 WHERE student_id = ?1 AND instructor_id = ?2",
                rusqlite::params![student_id, instructor_id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    /// (total, approved) message counts for one student's profile.
    pub fn message_counts(&self, student_id: &str) -> Result<(i64, i64)> {
        self.with_conn(|conn| {
            let counts = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(is_approved), 0)
                 FROM student_messages WHERE student_id = ?1",
                [student_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(counts)
        })
    }
}

const INSTRUCTOR_COLS: &str =
    "id, name, unique_code, message, background_color, qr_code, is_message_added, created_at";

const STUDENT_COLS: &str = "id, student_id, name, course, year, email, password, created_at";

fn map_instructor(row: &Row) -> rusqlite::Result<InstructorRow> {
    Ok(InstructorRow {
        id: row.get(0)?,
        name: row.get(1)?,
        unique_code: row.get(2)?,
        message: row.get(3)?,
        background_color: row.get(4)?,
        qr_code: row.get(5)?,
        is_message_added: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn map_student(row: &Row) -> rusqlite::Result<StudentRow> {
    Ok(StudentRow {
        id: row.get(0)?,
        student_id: row.get(1)?,
        name: row.get(2)?,
        course: row.get(3)?,
        year: row.get(4)?,
        email: row.get(5)?,
        password: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn map_official(row: &Row) -> rusqlite::Result<OfficialStudentRow> {
    Ok(OfficialStudentRow {
        id: row.get(0)?,
        student_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_inbox_message(row: &Row) -> rusqlite::Result<InboxMessageRow> {
    Ok(InboxMessageRow {
        id: row.get(0)?,
        message: row.get(1)?,
        is_approved: row.get(2)?,
        student_name: row.get(3)?,
        student_course: row.get(4)?,
        student_year: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn map_sent_message(row: &Row) -> rusqlite::Result<SentMessageRow> {
    Ok(SentMessageRow {
        id: row.get(0)?,
        instructor_id: row.get(1)?,
        instructor_name: row.get(2)?,
        message: row.get(3)?,
        is_approved: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
