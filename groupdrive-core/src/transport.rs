use std::io;
use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::wire::{
    CreateFolderResponse, HostPort, ListChildrenResponse, NegotiateUploadResponse,
};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
    #[error("transport i/o: {0}")]
    Io(#[from] io::Error),
    #[error("malformed response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("no reachable upload endpoint")]
    NoEndpoint,
    #[error("transfer channel i/o: {0}")]
    Io(#[from] io::Error),
    #[error("transfer rejected by server: {0}")]
    Rejected(String),
}

/// The metadata request/response transport. Implementations own packet
/// encoding, signing and response matching; callers see one round trip
/// per method call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn list_children(
        &self,
        folder_id: &str,
        start_index: u32,
    ) -> Result<ListChildrenResponse, TransportError>;

    async fn create_folder(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<CreateFolderResponse, TransportError>;

    async fn negotiate_upload(
        &self,
        request: UploadSlotRequest<'_>,
    ) -> Result<NegotiateUploadResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct UploadSlotRequest<'a> {
    pub parent_id: &'a str,
    pub filename: &'a str,
    pub size: u64,
    pub md5: &'a str,
    pub sha1: &'a str,
}

/// Where the negotiated upload should be pushed. Candidates are tried in
/// order; LAN addresses come before the public fallback.
#[derive(Debug, Clone)]
pub struct TransferDestination {
    pub candidates: Vec<HostPort>,
    pub check_key: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct TransferMeta {
    pub file_id: String,
    pub bus_id: i32,
    pub filename: String,
}

/// Binary bulk-transfer channel, distinct from the metadata transport.
/// `progress` is called with cumulative bytes pushed so far.
#[async_trait]
pub trait BulkTransfer: Send + Sync {
    async fn transfer(
        &self,
        content: &dyn ContentHandle,
        destination: &TransferDestination,
        meta: &TransferMeta,
        progress: &mut (dyn FnMut(u64) + Send),
    ) -> Result<(), TransferError>;
}

pub type ContentStream = Pin<Box<dyn AsyncRead + Send>>;

/// Opaque handle over the bytes being uploaded. Digests are lowercase hex.
/// At most one stream may be open at a time; `close` releases the handle
/// and is synchronous so it can run from a drop guard.
#[async_trait]
pub trait ContentHandle: Send + Sync {
    fn size(&self) -> u64;
    fn md5(&self) -> String;
    fn sha1(&self) -> String;
    async fn open(&self) -> Result<ContentStream, io::Error>;
    fn close(&self);
}
