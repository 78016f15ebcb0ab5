use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage medium unavailable")]
    Unavailable,
    #[error("log file is not open")]
    LogClosed,
    #[error("settings file not found")]
    SettingsMissing,
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingError {
    #[error("unknown setting `{0}`")]
    UnknownName(String),
    #[error("invalid value `{value}` for setting `{name}`")]
    InvalidValue { name: String, value: String },
}
