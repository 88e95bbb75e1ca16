use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::Database;

/// One line of the roster CSV: `student_id,first_name,last_name`.
#[derive(Debug, Deserialize)]
struct RosterRecord {
    student_id: String,
    first_name: String,
    last_name: String,
}

/// Import the official-student roster from a CSV file. Rows already present
/// (by student_id) are left untouched. Returns how many rows were added.
pub fn import_csv(db: &Database, path: &Path) -> Result<usize> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening roster file {}", path.display()))?;
    let added = import_from_reader(db, file)?;
    info!("Roster import finished: {} new entries", added);
    Ok(added)
}

fn import_from_reader<R: Read>(db: &Database, source: R) -> Result<usize> {
    let mut reader = csv::Reader::from_reader(source);

    let mut added = 0;
    for (line, record) in reader.deserialize::<RosterRecord>().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                // +2: one for the header line, one for zero-based enumerate
                warn!("Skipping malformed roster row {}: {}", line + 2, e);
                continue;
            }
        };

        let student_id = record.student_id.trim();
        if student_id.is_empty() {
            warn!("Skipping roster row {} with empty student_id", line + 2);
            continue;
        }

        if db.add_official_student(
            &Uuid::new_v4().to_string(),
            student_id,
            record.first_name.trim(),
            record.last_name.trim(),
        )? {
            added += 1;
        }
    }

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::import_from_reader;
    use crate::Database;

    #[test]
    fn imports_and_skips_duplicates() {
        let db = Database::open_in_memory().unwrap();

        let csv = "\
student_id,first_name,last_name
2021-00001,Ana,Cruz
2021-00002,Ben,Reyes
";
        assert_eq!(import_from_reader(&db, csv.as_bytes()).unwrap(), 2);
        // Re-import adds nothing new
        assert_eq!(import_from_reader(&db, csv.as_bytes()).unwrap(), 0);

        let roster = db.list_official_students().unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].student_id, "2021-00001");
        assert_eq!(roster[0].first_name, "Ana");
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let db = Database::open_in_memory().unwrap();

        let csv = "\
student_id,first_name,last_name
2021-00001,Ana,Cruz
,Missing,Id
2021-00003,Carol,Diaz
";
        assert_eq!(import_from_reader(&db, csv.as_bytes()).unwrap(), 2);
        assert!(db.get_official_by_student_id("2021-00003").unwrap().is_some());
    }
}
