use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info};

use sqlite_harness::common::logging::{init_logger, LogLevel};
use sqlite_harness::common::model::AggregateResult;
use sqlite_harness::data::{read, schema, serialize, write};
use sqlite_harness::{functions, Database};

#[derive(Parser, Debug)]
struct Args {
    /// Keeps the main database in memory when omitted
    #[arg(long = "db")]
    db_file: Option<std::path::PathBuf>,
    #[arg(long = "device-id", default_value = "012345678901")]
    device_id: String,
    /// Inserts output 0 of the device with these groups before aggregating
    #[arg(long = "group")]
    groups: Vec<i64>,
    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
    #[arg(long = "log-file", default_value = "")]
    log_file: String,
}

#[derive(Serialize, Debug)]
struct Report {
    schema_version: i32,
    aggregates: Vec<AggregateResult>,
    serialized_len: usize,
}

fn run(args: &Args) -> Result<Report> {
    let db = Database::open(args.db_file.as_deref()).context("Couldn't init db")?;
    let schema_version =
        schema::schema_version(db.conn()).context("Couldn't read schema version")?;
    info!("Schema at version {}", schema_version);

    functions::register_functions(db.conn()).context("Couldn't register functions")?;

    write::insert_device(db.conn(), &args.device_id)
        .with_context(|| format!("Couldn't insert device {}", args.device_id))?;

    if !args.groups.is_empty() {
        write::insert_output(db.conn(), &args.device_id, 0)
            .with_context(|| format!("Couldn't insert output 0 of {}", args.device_id))?;
        for group in &args.groups {
            write::insert_group(db.conn(), &args.device_id, 0, *group)
                .with_context(|| format!("Couldn't add output 0 to group {}", group))?;
        }
    }

    let aggregates = read::run_aggregate_query(db.conn()).context("Aggregate query failed")?;

    let image = serialize::serialize(db.conn(), "main").context("Couldn't serialize db")?;
    info!("Serialized main database, {} bytes", image.len());

    Ok(Report {
        schema_version,
        aggregates,
        serialized_len: image.len(),
    })
}

fn main() {
    let args = Args::parse();

    //We have to keep the worker guard alive
    let _worker_guard = init_logger(args.log_level, &args.log_file).unwrap_or_else(|e| {
        eprintln!("Couldn't init logger: {}", e);
        std::process::exit(1);
    });

    let report = run(&args).unwrap_or_else(|e| {
        //The cause was logged where it happened
        error!("{}", e);
        std::process::exit(1);
    });

    match serde_json::to_string(&report) {
        Ok(report) => println!("{}", report),
        Err(e) => {
            error!("Couldn't format report: {}", e);
            std::process::exit(1);
        }
    }

    info!("ok");
}
