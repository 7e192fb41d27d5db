use crate::db::DatabaseError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Database operation failed")]
    #[diagnostic(
        code(stitchline_core::database),
        help("Check database connectivity and that the schema has been bootstrapped")
    )]
    Database(#[from] DatabaseError),

    #[error("Configuration error in {config_path}")]
    #[diagnostic(
        code(stitchline_core::configuration_error),
        help("Field '{field}' should be {expected}")
    )]
    ConfigurationError {
        config_path: String,
        field: String,
        expected: String,
        #[source]
        cause: ConfigError,
    },

    #[error("Failed to serialize {data_type}")]
    #[diagnostic(code(stitchline_core::serialization_error))]
    SerializationError {
        data_type: String,
        #[source]
        cause: serde_json::Error,
    },
}

/// Low level causes for configuration failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
