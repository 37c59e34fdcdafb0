use rusqlite::Connection;
use tracing::{debug, error, info, instrument};

use crate::data::tables;
use crate::error::{Error, Result};

/// Brings the persistent schema up to date and attaches the memory database.
#[instrument(skip(conn))]
pub fn initialize(conn: &Connection) -> Result<()> {
    migrate(conn)?;
    attach_memory_schema(conn)?;
    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<i32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| Error::engine("pragma user_version", e))
}

pub fn migrate(conn: &Connection) -> Result<()> {
    let version = schema_version(conn)?;
    debug!("Schema version on disk is {}", version);

    match version {
        0 => {
            info!("Doing full schema migration");
            apply_full_schema(conn, tables::FULL_SCHEMA)
        }
        tables::SCHEMA_VERSION => Ok(()),
        found => {
            //Too new for us, don't touch it
            error!("Schema version {} is too new, giving up", found);
            Err(Error::SchemaTooNew {
                found,
                supported: tables::SCHEMA_VERSION,
            })
        }
    }
}

fn apply_full_schema(conn: &Connection, schema: &str) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::engine("begin migration", e))?;

    tx.execute_batch(schema)
        .map_err(|e| Error::engine("full schema migration", e))?;
    tx.pragma_update(None, "user_version", tables::SCHEMA_VERSION)
        .map_err(|e| Error::engine("pragma user_version", e))?;

    tx.commit()
        .map_err(|e| Error::engine("commit migration", e))?;
    debug!("Migrated schema to version {}", tables::SCHEMA_VERSION);

    Ok(())
}

/// The memory database is never persisted, so it's built from scratch every time. If the
/// connection already has it attached, the old copy is detached and thrown away first.
pub fn attach_memory_schema(conn: &Connection) -> Result<()> {
    let attached: i64 = conn
        .query_row(
            "SELECT count(*) FROM pragma_database_list WHERE name = ?1",
            [tables::MEMORY_SCHEMA_NAME],
            |row| row.get(0),
        )
        .map_err(|e| Error::engine("pragma database_list", e))?;
    if attached > 0 {
        conn.execute_batch(tables::DETACH_MEMORY)
            .map_err(|e| Error::engine("detach memory database", e))?;
        debug!("Detached previous {} database", tables::MEMORY_SCHEMA_NAME);
    }

    conn.execute_batch(tables::ATTACH_MEMORY)
        .map_err(|e| Error::engine("attach memory database", e))?;
    debug!("Attached memory database as {}", tables::MEMORY_SCHEMA_NAME);

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::engine("begin memory schema", e))?;

    tx.execute_batch(tables::MEASURED_TABLE)
        .map_err(|e| Error::engine("create measured table", e))?;
    debug!("Built measured table");

    tx.execute_batch(tables::SETPOINT_TABLE)
        .map_err(|e| Error::engine("create setpoint table", e))?;
    debug!("Built setpoint table");

    tx.commit()
        .map_err(|e| Error::engine("commit memory schema", e))
}
