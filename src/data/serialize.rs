use rusqlite::{params, Connection};
use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// Copies the current image of the `schema` database ("main", "temp" or an attached name).
/// A database without pages gives an empty image; an unknown name or a refusal by SQLite is
/// [`Error::Serialization`].
#[instrument(skip(conn))]
pub fn serialize(conn: &Connection, schema: &str) -> Result<Vec<u8>> {
    if !schema_exists(conn, schema)? {
        return Err(Error::serialization(schema, "no such database", None));
    }

    //SQLite hands back no image at all for zero pages, same as for a failure
    let pages: i64 = conn
        .pragma_query_value(Some(schema), "page_count", |row| row.get(0))
        .map_err(|e| Error::engine("pragma page_count", e))?;
    if pages == 0 {
        debug!("{} has no pages, empty image", schema);
        return Ok(Vec::new());
    }

    let image = conn
        .serialize(schema)
        .map_err(|e| Error::serialization(schema, "engine returned no image", Some(e)))?;

    debug!("Serialized {} into {} bytes", schema, image.len());
    Ok(image.to_vec())
}

//temp always has a slot, even before anything opened it
fn schema_exists(conn: &Connection, schema: &str) -> Result<bool> {
    if schema.eq_ignore_ascii_case("temp") {
        return Ok(true);
    }

    let found: i64 = conn
        .query_row(
            "SELECT count(*) FROM pragma_database_list WHERE name = ?1 COLLATE NOCASE",
            params![schema],
            |row| row.get(0),
        )
        .map_err(|e| Error::engine("pragma database_list", e))?;
    Ok(found > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{read, write, Database};

    #[test]
    fn image_reloads_with_the_same_devices() {
        let db = Database::open(None).unwrap();
        write::insert_device(db.conn(), "012345678901").unwrap();

        let image = serialize(db.conn(), "main").unwrap();
        let copy = Database::from_image(&image).unwrap();

        assert_eq!(
            read::device_ids(copy.conn()).unwrap(),
            vec!["012345678901".to_string()]
        );
    }

    #[test]
    fn image_of_file_database_matches_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.db3");
        let db = Database::open(Some(&path)).unwrap();
        write::insert_device(db.conn(), "abcdefghijkl").unwrap();

        let image = serialize(db.conn(), "main").unwrap();
        let copy_path = dir.path().join("copy.db3");
        std::fs::write(&copy_path, &image).unwrap();
        let copy = Database::open(Some(&copy_path)).unwrap();

        assert_eq!(
            read::device_ids(copy.conn()).unwrap(),
            vec!["abcdefghijkl".to_string()]
        );
    }

    #[test]
    fn memory_database_serializes_too() {
        let db = Database::open(None).unwrap();

        let image = serialize(db.conn(), "state").unwrap();

        assert!(!image.is_empty());
    }

    #[test]
    fn unknown_schema_is_a_serialization_error() {
        let db = Database::open(None).unwrap();

        let err = serialize(db.conn(), "nowhere").unwrap_err();

        match err {
            Error::Serialization {
                schema,
                reason,
                source,
            } => {
                assert_eq!(schema, "nowhere");
                assert_eq!(reason, "no such database");
                assert!(source.is_none());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn zero_page_database_is_an_empty_image() {
        let db = Database::open(None).unwrap();

        let image = serialize(db.conn(), "temp").unwrap();

        assert!(image.is_empty());
    }
}
