use rusqlite::{params, Connection};
use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// The 12 character length is enforced by the table, not here.
#[instrument(skip(conn))]
pub fn insert_device(conn: &Connection, device_id: &str) -> Result<()> {
    let query = "INSERT INTO devices (deviceid) VALUES (?1)";

    let mut stmt = conn
        .prepare(query)
        .map_err(|e| Error::engine("prepare insert device", e))?;
    stmt.execute([device_id])
        .map_err(|e| Error::write("insert device", e))?;

    debug!("Inserted device {}", device_id);
    Ok(())
}

pub fn insert_output(conn: &Connection, device_id: &str, output_id: i64) -> Result<()> {
    let query = "INSERT INTO outputs (deviceid, outputid) VALUES (?1, ?2)";

    conn.execute(query, params![device_id, output_id])
        .map_err(|e| Error::write("insert output", e))?;

    debug!("Inserted output {} for device {}", output_id, device_id);
    Ok(())
}

pub fn insert_group(
    conn: &Connection,
    device_id: &str,
    output_id: i64,
    group_id: i64,
) -> Result<()> {
    let query = "INSERT INTO output_groups (deviceid, outputid, groupid) VALUES (?1, ?2, ?3)";

    conn.execute(query, params![device_id, output_id, group_id])
        .map_err(|e| Error::write("insert group", e))?;

    debug!(
        "Inserted group {} for output {} of device {}",
        group_id, output_id, device_id
    );
    Ok(())
}

//Replacing the row re-evaluates the timestamp default
pub fn record_measured(
    conn: &Connection,
    device_id: &str,
    output_id: i64,
    state: bool,
    level: Option<i64>,
) -> Result<()> {
    let query = "INSERT OR REPLACE INTO state.measured (
            deviceid, outputid, state, level
        ) VALUES (?1, ?2, ?3, ?4)";

    conn.execute(query, params![device_id, output_id, state, level])
        .map_err(|e| Error::write("record measured state", e))?;
    Ok(())
}

pub fn record_setpoint(
    conn: &Connection,
    device_id: &str,
    output_id: i64,
    state: bool,
    level: Option<i64>,
) -> Result<()> {
    let query = "INSERT OR REPLACE INTO state.setpoint (
            deviceid, outputid, setstate, setlevel
        ) VALUES (?1, ?2, ?3, ?4)";

    conn.execute(query, params![device_id, output_id, state, level])
        .map_err(|e| Error::write("record setpoint", e))?;
    Ok(())
}
