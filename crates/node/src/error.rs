//! A bunch of wrap errors.

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors enum mapping global custom errors.
/// The error type can be expressed in decimal, where the high decs represent
/// the error category and the low decs represent the error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
#[repr(u32)]
pub enum Error {
    #[error("Invalid logging level: {0}")]
    InvalidLoggingLevel(String) = 100,
    #[error("Invalid config: {0}")]
    InvalidConfig(String) = 101,
    #[error("Create File Error: {0}")]
    CreateFileError(String) = 200,
    #[error("Open File Error: {0}")]
    OpenFileError(String) = 201,
    #[error("Cannot find home directory")]
    HomeDirError = 202,
    #[error("Cannot find parent directory")]
    ParentDirError = 203,
    #[error("Serde json error: {0}")]
    SerdeJsonError(#[from] serde_json::Error) = 300,
    #[error("Serde yaml error: {0}")]
    SerdeYamlError(#[from] serde_yaml::Error) = 301,
    #[error("Core error: {0}")]
    CoreError(#[from] chordring_core::Error) = 400,
    #[error("Transport error: {0}")]
    TransportError(#[from] chordring_transport::error::Error) = 500,
    #[error("Server task failed: {0}")]
    ServerTaskFailed(String) = 501,
}
