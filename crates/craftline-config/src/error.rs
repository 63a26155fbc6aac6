//! Errors raised while loading or persisting `config.ron`.

/// Failure modes of [`Config`](crate::Config) persistence.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("cannot read config file: {0}")]
    ReadError(#[source] std::io::Error),

    /// The config directory or file could not be written.
    #[error("cannot write config file: {0}")]
    WriteError(#[source] std::io::Error),

    /// The file is not valid RON for [`Config`](crate::Config).
    #[error("invalid config file: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// Serializing the in-memory config failed.
    #[error("cannot serialize config: {0}")]
    SerializeError(#[source] ron::Error),

    /// An override variable held an unusable value.
    #[error("ignoring invalid {var} value {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}
