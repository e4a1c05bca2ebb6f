use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlumeError>;

#[derive(Debug, Error)]
pub enum PlumeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("ingest failed: {0}")]
    Ingest(String),
    #[error("builder is defunct: `put_tensor` and `build` are prohibited after `build`")]
    BuilderDefunct,
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}
