use crate::SemanticType;
use thiserror::Error;

/// What a failed statement was trying to do.
///
/// Execution errors carry this instead of the raw SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Connect,
    CheckTable,
    CreateTable,
    Inspect,
    Migrate,
    Insert,
    Update,
    Select,
    Exists,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Intent::Connect => "connect to database",
            Intent::CheckTable => "check table existence",
            Intent::CreateTable => "create table",
            Intent::Inspect => "inspect table columns",
            Intent::Migrate => "migrate table",
            Intent::Insert => "insert row",
            Intent::Update => "update rows",
            Intent::Select => "select rows",
            Intent::Exists => "check row existence",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{table}.{column}: no converter registered for semantic type {semantic}")]
    UnsupportedType {
        table: String,
        column: String,
        semantic: SemanticType,
    },

    #[error("{type_name} does not declare a table name")]
    NotATable { type_name: &'static str },

    #[error("{table}.{column}: {source}")]
    Conversion {
        table: String,
        column: String,
        #[source]
        source: ConversionError,
    },

    #[error("failed to {intent}: {source}")]
    Execution {
        intent: Intent,
        #[source]
        source: BackendError,
    },

    #[error("invalid schema for table {table}: {reason}")]
    InvalidSchema { table: String, reason: String },

    #[error("unknown table {table}")]
    UnknownTable { table: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

impl Error {
    pub(crate) fn execution(intent: Intent) -> impl FnOnce(BackendError) -> Self {
        move |source| Error::Execution { intent, source }
    }
}

/// A value that could not be converted between its semantic and storage form.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("value {value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("expected {expected}, found {found}")]
    Unexpected {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid uuid: {0}")]
    InvalidUuid(String),

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("{name:?} is not one of the declared enum members")]
    UnknownVariant { name: String },

    #[error("unexpected NULL")]
    Null,
}

/// A failure reported by the backend itself.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Sql(#[from] sqlx::Error),

    #[error("{0}")]
    Message(String),
}

impl From<String> for BackendError {
    fn from(message: String) -> Self {
        BackendError::Message(message)
    }
}

impl From<&str> for BackendError {
    fn from(message: &str) -> Self {
        BackendError::Message(message.to_owned())
    }
}
