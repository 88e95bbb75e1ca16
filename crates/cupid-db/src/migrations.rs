use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS instructors (
            id                  TEXT PRIMARY KEY,
            name                TEXT NOT NULL,
            unique_code         TEXT NOT NULL UNIQUE,
            message             TEXT,
            background_color    TEXT,
            qr_code             TEXT,
            is_message_added    INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS students (
            id          TEXT PRIMARY KEY,
            student_id  TEXT NOT NULL UNIQUE,
            name        TEXT NOT NULL,
            course      TEXT NOT NULL,
            year        TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS official_students (
            id          TEXT PRIMARY KEY,
            student_id  TEXT NOT NULL UNIQUE,
            first_name  TEXT NOT NULL,
            last_name   TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS student_messages (
            id              TEXT PRIMARY KEY,
            student_id      TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
            instructor_id   TEXT NOT NULL REFERENCES instructors(id) ON DELETE CASCADE,
            message         TEXT NOT NULL,
            is_approved     INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_student_messages_instructor
            ON student_messages(instructor_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_student_messages_student
            ON student_messages(student_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
