use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::error::{Error, Result};

pub mod read;
pub mod schema;
pub mod serialize;
pub mod tables;
pub mod write;

/// Owns the one connection the whole process works through. Dropping it closes the database.
#[derive(Debug)]
pub struct Database {
    path: Option<PathBuf>,
    conn: Connection,
}

impl Database {
    /// Opens (creating if absent) the database at `path`, or a private in-memory one
    /// when no path is given, and initializes both schemas.
    #[instrument]
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let conn = match path {
            Some(path) => Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
            ),
            None => Connection::open_in_memory(),
        }
        .map_err(|e| Error::engine("open database", e))?;

        let db = Database {
            path: path.map(Path::to_path_buf),
            conn,
        };
        db.init()?;

        Ok(db)
    }

    /// Loads a serialized image as the main database of a fresh in-memory connection.
    #[instrument(skip(image), fields(len = image.len()))]
    pub fn from_image(image: &[u8]) -> Result<Self> {
        let mut conn =
            Connection::open_in_memory().map_err(|e| Error::engine("open database", e))?;
        conn.deserialize_read_exact("main", image, image.len(), false)
            .map_err(|e| Error::engine("deserialize", e))?;

        let db = Database { path: None, conn };
        db.init()?;

        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .pragma_update(None, "foreign_keys", true)
            .map_err(|e| Error::engine("pragma foreign_keys", e))?;
        debug!("Enabled foreign keys");

        schema::initialize(&self.conn)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reopening_a_migrated_file_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.db3");

        let db = Database::open(Some(&path)).unwrap();
        assert_eq!(schema::schema_version(db.conn()).unwrap(), 1);
        assert_eq!(db.path(), Some(path.as_path()));
        drop(db);

        let db = Database::open(Some(&path)).unwrap();
        assert_eq!(schema::schema_version(db.conn()).unwrap(), 1);
    }

    #[test]
    fn too_new_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.db3");
        Connection::open(&path)
            .unwrap()
            .pragma_update(None, "user_version", 7)
            .unwrap();

        let err = Database::open(Some(&path)).unwrap_err();

        assert!(matches!(err, Error::SchemaTooNew { found: 7, .. }));
        let conn = Connection::open(&path).unwrap();
        assert_eq!(schema::schema_version(&conn).unwrap(), 7);
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let db = Database::open(None).unwrap();

        let err = write::insert_output(db.conn(), "aaaaaaaaaaaa", 0).unwrap_err();

        assert!(err.is_data());
    }
}
