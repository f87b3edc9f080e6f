use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use groupdrive_core::{ContentHandle, RawEntry};
use tokio::runtime::{Builder, Runtime};

use crate::drive::GroupDrive;
use crate::entry::{Entry, File, Folder};
use crate::error::DriveError;
use crate::list::Pager;
use crate::upload::ProgressObserver;

/// Thread-blocking twin of [`GroupDrive`]. Owns a private current-thread
/// runtime and drives the same operations to completion on the calling
/// thread. Must not be constructed or used from inside an async runtime.
pub struct BlockingGroupDrive {
    inner: GroupDrive,
    runtime: Runtime,
}

impl BlockingGroupDrive {
    pub fn new(inner: GroupDrive) -> io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { inner, runtime })
    }

    pub fn root(&self) -> Folder {
        self.inner.root()
    }

    /// Blocking equivalent of [`GroupDrive::children`]. Pages are fetched on
    /// demand as the iterator advances; every call starts an independent
    /// cursor at offset 0.
    pub fn children(&self, folder: &Folder) -> BlockingEntries<'_> {
        BlockingEntries {
            runtime: &self.runtime,
            pager: Pager::new(self.inner.transport.clone(), folder.id().to_owned()),
            parent: folder.clone(),
            buffered: VecDeque::new(),
            failed: false,
        }
    }

    pub fn files(&self, folder: &Folder) -> impl Iterator<Item = Result<File, DriveError>> + '_ {
        self.children(folder).filter_map(|item| match item {
            Ok(entry) => entry.into_file().map(Ok),
            Err(err) => Some(Err(err)),
        })
    }

    pub fn folders(
        &self,
        folder: &Folder,
    ) -> impl Iterator<Item = Result<Folder, DriveError>> + '_ {
        self.children(folder).filter_map(|item| match item {
            Ok(entry) => entry.into_folder().map(Ok),
            Err(err) => Some(Err(err)),
        })
    }

    pub fn resolve_folder(
        &self,
        parent: &Folder,
        name: &str,
    ) -> Result<Option<Folder>, DriveError> {
        self.runtime
            .block_on(self.inner.resolve_folder(parent, name))
    }

    pub fn resolve_file_by_id(
        &self,
        folder: &Folder,
        id: &str,
        deep: bool,
    ) -> Result<Option<File>, DriveError> {
        self.runtime
            .block_on(self.inner.resolve_file_by_id(folder, id, deep))
    }

    pub fn resolve_files(&self, folder: &Folder, path: &str) -> Result<Vec<File>, DriveError> {
        self.runtime.block_on(self.inner.resolve_files(folder, path))
    }

    pub fn resolve_all(&self, folder: &Folder, path: &str) -> Result<Vec<Entry>, DriveError> {
        self.runtime.block_on(self.inner.resolve_all(folder, path))
    }

    pub fn create_folder(&self, parent: &Folder, name: &str) -> Result<Folder, DriveError> {
        self.runtime
            .block_on(self.inner.create_folder(parent, name))
    }

    pub fn upload(
        &self,
        folder: &Folder,
        filename: &str,
        content: Arc<dyn ContentHandle>,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<File, DriveError> {
        self.runtime
            .block_on(self.inner.upload(folder, filename, content, observer))
    }

    pub fn into_inner(self) -> GroupDrive {
        self.inner
    }
}

/// Iterator over one folder's children, fetched page by page. After a
/// transport failure the iterator yields that error once and then ends.
pub struct BlockingEntries<'a> {
    runtime: &'a Runtime,
    pager: Pager,
    parent: Folder,
    buffered: VecDeque<RawEntry>,
    failed: bool,
}

impl Iterator for BlockingEntries<'_> {
    type Item = Result<Entry, DriveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            while let Some(raw) = self.buffered.pop_front() {
                if let Some(entry) = Entry::from_record(raw, &self.parent) {
                    return Some(Ok(entry));
                }
            }
            match self.runtime.block_on(self.pager.next_batch()) {
                Ok(batch) if batch.is_empty() => return None,
                Ok(batch) => self.buffered.extend(batch),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
