use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use tracing::{debug, instrument};

use crate::error::{Error, Result};

pub mod aggregate;
pub mod monotonic;

pub const NOW_MONOTONIC: &str = "now_monotonic";
pub const GROUP_AGG: &str = "group_agg";
pub const GROUP_AGG_ARITY: usize = 3;

/// Registers `now_monotonic()` and `group_agg(deviceid, outputid, groupid)` on `conn`.
#[instrument(skip(conn))]
pub fn register_functions(conn: &Connection) -> Result<()> {
    monotonic::anchor();

    //Innocuous so the memory schema defaults may call it
    conn.create_scalar_function(
        NOW_MONOTONIC,
        0,
        FunctionFlags::SQLITE_UTF8
            | FunctionFlags::SQLITE_DETERMINISTIC
            | FunctionFlags::SQLITE_INNOCUOUS,
        |_ctx| Ok(monotonic::now_monotonic()),
    )
    .map_err(|e| Error::registration(NOW_MONOTONIC, e))?;
    debug!("Registered {}", NOW_MONOTONIC);

    conn.create_aggregate_function(
        GROUP_AGG,
        GROUP_AGG_ARITY as i32,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        aggregate::GroupAggregate,
    )
    .map_err(|e| Error::registration(GROUP_AGG, e))?;
    debug!("Registered {}", GROUP_AGG);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_arity_is_rejected_before_running() {
        let conn = Connection::open_in_memory().unwrap();
        register_functions(&conn).unwrap();

        assert!(conn.prepare("SELECT group_agg(1, 2)").is_err());
        assert!(conn.prepare("SELECT now_monotonic(1)").is_err());
    }

    #[test]
    fn aggregate_over_constant_row() {
        let conn = Connection::open_in_memory().unwrap();
        register_functions(&conn).unwrap();

        let blob: Vec<u8> = conn
            .query_row("SELECT group_agg('012345678901', 0, 5)", [], |row| {
                row.get(0)
            })
            .unwrap();

        assert_eq!(aggregate::Accumulator::decode(&blob).unwrap().sum(), 85);
    }

    #[test]
    fn aggregate_over_no_rows_is_null() {
        let conn = Connection::open_in_memory().unwrap();
        register_functions(&conn).unwrap();
        conn.execute_batch("CREATE TABLE t (a, b, c)").unwrap();

        let blob: Option<Vec<u8>> = conn
            .query_row("SELECT group_agg(a, b, c) FROM t", [], |row| row.get(0))
            .unwrap();

        assert!(blob.is_none());
    }

    #[test]
    fn non_integer_group_fails_the_query() {
        let conn = Connection::open_in_memory().unwrap();
        register_functions(&conn).unwrap();

        let result: rusqlite::Result<Vec<u8>> =
            conn.query_row("SELECT group_agg('012345678901', 0, 'five')", [], |row| {
                row.get(0)
            });

        assert!(result.is_err());
    }
}
