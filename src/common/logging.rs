use anyhow::{anyhow, Result};
use clap::ValueEnum;
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum LogLevel {
    No,
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::No => None,
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Warning => Some(Level::WARN),
            LogLevel::Error => Some(Level::ERROR),
        }
    }
}

/// Installs the global subscriber. Logs go to stderr unless `log_file` names a daily
/// rolling file, in which case the returned guard has to outlive the logging.
pub fn init_logger(log_level: LogLevel, log_file: &str) -> Result<Option<WorkerGuard>> {
    let Some(level) = log_level.to_tracing_level() else {
        return Ok(None);
    };

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    if !log_file.is_empty() {
        let file_appender = rolling::daily(".", log_file);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let subscriber = fmt()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_env_filter(env_filter)
            .with_file(false)
            .with_target(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| anyhow!("couldn't set file subscriber: {}", e))?;

        Ok(Some(guard))
    } else {
        //stdout carries the report, logs go to stderr
        let subscriber = fmt()
            .with_writer(io::stderr)
            .with_env_filter(env_filter)
            .with_file(false)
            .with_target(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| anyhow!("couldn't set stderr subscriber: {}", e))?;

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_level_installs_nothing() {
        assert_eq!(LogLevel::No.to_tracing_level(), None);
        assert!(init_logger(LogLevel::No, "").unwrap().is_none());
    }

    #[test]
    fn warning_maps_to_warn() {
        assert_eq!(LogLevel::Warning.to_tracing_level(), Some(Level::WARN));
    }
}
