mod transport;
mod wire;

pub use transport::{
    BulkTransfer, ContentHandle, ContentStream, Transport, TransferDestination, TransferError,
    TransferMeta, TransportError, UploadSlotRequest,
};
pub use wire::{
    CreateFolderResponse, FileRecord, FolderRecord, HostPort, ListChildrenResponse,
    NegotiateUploadResponse, RawEntry, codes,
};
