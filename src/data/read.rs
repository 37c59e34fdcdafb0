use rusqlite::{params, Connection, OptionalExtension};
use tracing::{error, info, instrument};

use crate::common::model::{AggregateResult, MeasuredState, Setpoint};
use crate::error::{Error, Result};
use crate::functions::aggregate::Accumulator;

//Upper bound on steps for a single select, way above any realistic result size
pub const MAX_QUERY_LOOP_STEPS: usize = 1_048_576;

pub fn device_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT deviceid FROM devices ORDER BY deviceid")
        .map_err(|e| Error::engine("prepare select devices", e))?;

    let rows = stmt
        .query_map([], |row| row.get(0))
        .map_err(|e| Error::engine("select devices", e))?;

    rows.collect::<rusqlite::Result<Vec<String>>>()
        .map_err(|e| Error::engine("select devices", e))
}

pub fn measured(
    conn: &Connection,
    device_id: &str,
    output_id: i64,
) -> Result<Option<MeasuredState>> {
    conn.query_row(
        "SELECT deviceid, outputid, timestamp, state, level
         FROM state.measured
         WHERE deviceid = ?1 AND outputid = ?2",
        params![device_id, output_id],
        |row| {
            Ok(MeasuredState {
                device_id: row.get(0)?,
                output_id: row.get(1)?,
                timestamp: row.get(2)?,
                state: row.get(3)?,
                level: row.get(4)?,
            })
        },
    )
    .optional()
    .map_err(|e| Error::engine("select measured state", e))
}

pub fn setpoint(conn: &Connection, device_id: &str, output_id: i64) -> Result<Option<Setpoint>> {
    conn.query_row(
        "SELECT deviceid, outputid, timestamp, setstate, setlevel
         FROM state.setpoint
         WHERE deviceid = ?1 AND outputid = ?2",
        params![device_id, output_id],
        |row| {
            Ok(Setpoint {
                device_id: row.get(0)?,
                output_id: row.get(1)?,
                timestamp: row.get(2)?,
                state: row.get(3)?,
                level: row.get(4)?,
            })
        },
    )
    .optional()
    .map_err(|e| Error::engine("select setpoint", e))
}

pub fn run_aggregate_query(conn: &Connection) -> Result<Vec<AggregateResult>> {
    run_aggregate_query_capped(conn, MAX_QUERY_LOOP_STEPS)
}

/// Runs the grouped `group_agg` select. The step that reports the end of the rows counts
/// towards `cap`, so at most `cap - 1` groups come back.
#[instrument(skip(conn))]
pub fn run_aggregate_query_capped(conn: &Connection, cap: usize) -> Result<Vec<AggregateResult>> {
    let mut stmt = conn
        .prepare(
            "SELECT groupid, group_agg(deviceid, outputid, groupid)
             FROM output_groups
             GROUP BY groupid
             ORDER BY groupid",
        )
        .map_err(|e| Error::engine("prepare aggregate query", e))?;

    let mut rows = stmt
        .query([])
        .map_err(|e| Error::engine("aggregate query", e))?;

    let mut result = vec![];

    for _ in 0..cap {
        let Some(row) = rows
            .next()
            .map_err(|e| Error::engine("step aggregate query", e))?
        else {
            return Ok(result);
        };

        let group_id: i64 = row
            .get(0)
            .map_err(|e| Error::engine("read group id", e))?;
        let blob: Vec<u8> = row
            .get(1)
            .map_err(|e| Error::engine("read aggregate", e))?;

        let accumulator = Accumulator::decode(&blob)?;
        info!("group {} aggregate={}", group_id, accumulator.sum());

        result.push(AggregateResult {
            group_id,
            sum: accumulator.sum(),
        });
    }

    error!("Aggregate query still had rows after {} steps", cap);
    Err(Error::UnboundedResult { cap })
}
