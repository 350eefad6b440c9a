//! Error types for VighnaNav

use thiserror::Error;

/// VighnaNav error type
#[derive(Error, Debug)]
pub enum VighnaError {
    /// Invalid threshold profile or configuration file. Fatal at construction.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sensor acquisition failed. Ends the current episode.
    #[error("Sensor read error: {0}")]
    SensorRead(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {0}")]
    Output(String),
}

impl From<toml::de::Error> for VighnaError {
    fn from(e: toml::de::Error) -> Self {
        VighnaError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for VighnaError {
    fn from(e: toml::ser::Error) -> Self {
        VighnaError::Output(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VighnaError>;
