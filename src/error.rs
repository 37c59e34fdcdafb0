use rusqlite::ErrorCode;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{op} failed")]
    Engine {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: i32, supported: i32 },

    #[error("couldn't register function {function}")]
    Registration {
        function: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{function} takes {expected} arguments, but given {found}")]
    Arity {
        function: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{op} rejected by constraint")]
    Data {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("accumulator blob is {found} bytes, expected {expected}")]
    Decode { expected: usize, found: usize },

    #[error("couldn't serialize database {schema}: {reason}")]
    Serialization {
        schema: String,
        reason: &'static str,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("accumulator guard is {found}, memory corrupt?")]
    GuardViolation { found: u32 },

    #[error("aggregate sum {sum} overflows when adding {addend}")]
    SumOverflow { sum: i64, addend: i64 },

    #[error("query didn't finish within {cap} steps")]
    UnboundedResult { cap: usize },
}

impl Error {
    pub fn engine(op: &'static str, source: rusqlite::Error) -> Self {
        error!("{} returned {:?}: {}", op, source.sqlite_error_code(), source);
        Error::Engine { op, source }
    }

    /// Constraint violations become [`Error::Data`], anything else is an engine failure.
    pub fn write(op: &'static str, source: rusqlite::Error) -> Self {
        if source.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
            error!("{} violated a constraint: {}", op, source);
            Error::Data { op, source }
        } else {
            Self::engine(op, source)
        }
    }

    pub fn registration(function: &'static str, source: rusqlite::Error) -> Self {
        error!("create function {} returned: {}", function, source);
        Error::Registration { function, source }
    }

    pub fn serialization(
        schema: &str,
        reason: &'static str,
        source: Option<rusqlite::Error>,
    ) -> Self {
        match &source {
            Some(source) => error!("serialize {} failed, {}: {}", schema, reason, source),
            None => error!("serialize {} failed, {}", schema, reason),
        }
        Error::Serialization {
            schema: schema.to_string(),
            reason,
            source,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Error::Data { .. })
    }
}
