// SQLite access for the reporting datasets.
//
// The store is read-only from the pipeline's point of view: it serves whole
// tables as frames and nothing else. Writes happen out of band when the
// database is produced.
use crate::error::{InsightError, InsightResult};
use crate::frame::{Frame, Value};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::path::Path;

pub struct Store {
    conn: Option<Connection>,
}

impl Store {
    /// Open the database file and enable `foreign_keys`.
    pub fn open(path: &Path) -> InsightResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Store { conn: Some(conn) })
    }

    /// A store with no backing connection; every fetch errors with
    /// `InsightError::Unavailable` and loads degrade to empty frames.
    pub fn unavailable() -> Self {
        Store { conn: None }
    }

    /// Fetch every row of `table` into a frame, preserving column order.
    ///
    /// The identifier is validated before it is interpolated into SQL, so a
    /// malformed table name is a deterministic error rather than a syntax
    /// error from SQLite.
    pub fn fetch_table(&self, table: &str) -> InsightResult<Frame> {
        let Some(conn) = &self.conn else {
            return Err(InsightError::Unavailable);
        };
        if !valid_identifier(table) {
            return Err(InsightError::Identifier(table.to_string()));
        }
        let mut stmt = conn.prepare(&format!("SELECT * FROM {}", table))?;
        // Collect column names before borrowing the statement for query.
        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let width = columns.len();

        let mut frame = Frame::new(columns);
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(decode_cell(row.get_ref(i)?));
            }
            frame.push_row(cells)?;
        }
        Ok(frame)
    }
}

#[cfg(test)]
impl Store {
    /// Wrap an already-open connection. Test fixtures seed an in-memory
    /// database through rusqlite and hand it over.
    pub fn from_connection(conn: Connection) -> Self {
        Store { conn: Some(conn) }
    }
}

/// SQLite storage classes map onto the cell value menu; BLOB has no place
/// in these datasets and decodes to null.
fn decode_cell(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(bytes) => Value::Str(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

fn valid_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> Store {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE sample (a INTEGER, b REAL, c TEXT, d BLOB);
             INSERT INTO sample VALUES (1, 1.5, 'x', x'00');
             INSERT INTO sample VALUES (NULL, NULL, NULL, NULL);",
        )
        .unwrap();
        Store::from_connection(conn)
    }

    #[test]
    fn fetch_decodes_all_storage_classes() {
        let store = seeded_store();
        let frame = store.fetch_table("sample").unwrap();
        assert_eq!(frame.columns(), ["a", "b", "c", "d"]);
        assert_eq!(
            frame.rows()[0],
            vec![
                Value::Int(1),
                Value::Float(1.5),
                Value::Str("x".into()),
                Value::Null
            ]
        );
        assert_eq!(frame.rows()[1], vec![Value::Null; 4]);
    }

    #[test]
    fn malformed_identifiers_are_rejected() {
        let store = seeded_store();
        for bad in ["sample; DROP TABLE sample", "a-b", "", "x y"] {
            assert!(matches!(
                store.fetch_table(bad),
                Err(InsightError::Identifier(_))
            ));
        }
    }

    #[test]
    fn missing_table_is_a_sqlite_error() {
        let store = seeded_store();
        assert!(matches!(
            store.fetch_table("absent"),
            Err(InsightError::Sqlite(_))
        ));
    }

    #[test]
    fn unavailable_store_errors_on_every_fetch() {
        let store = Store::unavailable();
        assert!(matches!(
            store.fetch_table("sample"),
            Err(InsightError::Unavailable)
        ));
    }

    #[test]
    fn opens_a_file_backed_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("insights.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE sample (a INTEGER);
                 INSERT INTO sample VALUES (42);",
            )
            .unwrap();
        }
        let store = Store::open(&path).unwrap();
        let frame = store.fetch_table("sample").unwrap();
        assert_eq!(frame.rows()[0][0], Value::Int(42));
    }
}
