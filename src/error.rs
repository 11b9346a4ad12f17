use thiserror::Error;

use crate::inputs::ValidationError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("WDL parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Workflow registration error: {0}")]
    Registration(String),

    #[error("Run submission error: {0}")]
    Submission(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl Error {
    /// Process exit code reported for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Registration(_) => 2,
            Error::Submission(_) => 3,
            _ => 1,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Config(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
