use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("network error: {0}")]
    Net(#[from] reqwest::Error),

    #[error("{url}: server responded {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("transfer from {url} interrupted: {source}")]
    Transfer {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("remote metadata is malformed: {0}")]
    MalformedMetadata(String),

    #[error("can't find a bundle compatible with client version {0}")]
    NoCompatibleVersion(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("failed to move {} -> {}: {source}", from.display(), to.display())]
    Swap {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("platform {0} is not supported")]
    UnsupportedPlatform(String),

    #[error("updater is busy")]
    Busy,

    #[error("operation canceled")]
    Canceled,
}

/// Coarse classification used by collaborators to render failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    MalformedMetadata,
    Extraction,
    Swap,
    Config,
    Busy,
    Canceled,
}

impl BundleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BundleError::Net(_)
            | BundleError::HttpStatus { .. }
            | BundleError::Transfer { .. } => ErrorKind::Network,
            BundleError::MalformedMetadata(_) | BundleError::NoCompatibleVersion(_) => {
                ErrorKind::MalformedMetadata
            }
            BundleError::Extraction(_) | BundleError::Io(_) => ErrorKind::Extraction,
            BundleError::Swap { .. } => ErrorKind::Swap,
            BundleError::InvalidConfig(_) | BundleError::UnsupportedPlatform(_) => {
                ErrorKind::Config
            }
            BundleError::Busy => ErrorKind::Busy,
            BundleError::Canceled => ErrorKind::Canceled,
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, BundleError::Canceled)
    }
}

impl From<serde_json::Error> for BundleError {
    fn from(e: serde_json::Error) -> Self {
        BundleError::MalformedMetadata(e.to_string())
    }
}

impl From<zip::result::ZipError> for BundleError {
    fn from(e: zip::result::ZipError) -> Self {
        BundleError::Extraction(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BundleError>;
