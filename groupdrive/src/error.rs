use groupdrive_core::{TransferError, TransportError};
use thiserror::Error;

/// Lookups that find nothing return `Ok(None)` or an empty collection;
/// absence is data, not an error, and never appears here.
#[derive(Debug, Error)]
pub enum DriveError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("server returned code {code}: {message}")]
    Protocol { code: i32, message: String },
    #[error("server reported success but {0} could not be located")]
    InvariantViolation(String),
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("bulk transfer failed: {0}")]
    Transfer(#[from] TransferError),
    #[error("announcement failed: {0}")]
    Announce(#[from] AnnounceError),
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct AnnounceError(pub String);
