use std::pin::pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::{self, BoxFuture};
use futures_util::{Stream, TryStreamExt};
use groupdrive_core::{BulkTransfer, Transport, codes};
use tracing::debug;

use crate::entry::{Entry, File, Folder};
use crate::error::{AnnounceError, DriveError};
use crate::list::entry_stream;

/// Whether the acting principal may mutate the group-owned tree.
pub trait PermissionOracle: Send + Sync {
    fn is_operator(&self, principal: u64) -> bool;
}

/// Posts a completed upload into the owning conversation. Fire-and-forget
/// from the engine's perspective: failures are reported, never retried.
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(&self, file: &File) -> Result<(), AnnounceError>;
}

pub trait PathChecker: Send + Sync {
    fn is_legal(&self, name: &str) -> bool;

    fn check_legality(&self, name: &str) -> Result<(), DriveError> {
        if self.is_legal(name) {
            Ok(())
        } else {
            Err(DriveError::InvalidArgument(format!(
                "name {name:?} contains characters the server rejects"
            )))
        }
    }
}

/// Rejects blank names, path separators, control characters and the usual
/// reserved punctuation.
pub struct DefaultPathChecker;

impl PathChecker for DefaultPathChecker {
    fn is_legal(&self, name: &str) -> bool {
        !name.trim().is_empty()
            && !name.chars().any(|c| {
                c.is_control()
                    || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            })
    }
}

/// Client engine over one group's remote file tree. Holds no tree state:
/// every operation re-queries the transport, and the nodes it hands out are
/// transient snapshots.
pub struct GroupDrive {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) bulk: Arc<dyn BulkTransfer>,
    pub(crate) perms: Arc<dyn PermissionOracle>,
    pub(crate) announcer: Arc<dyn Announcer>,
    pub(crate) checker: Arc<dyn PathChecker>,
    pub(crate) principal: u64,
}

impl GroupDrive {
    pub fn new(
        transport: Arc<dyn Transport>,
        bulk: Arc<dyn BulkTransfer>,
        perms: Arc<dyn PermissionOracle>,
        announcer: Arc<dyn Announcer>,
        principal: u64,
    ) -> Self {
        Self {
            transport,
            bulk,
            perms,
            announcer,
            checker: Arc::new(DefaultPathChecker),
            principal,
        }
    }

    pub fn with_checker(mut self, checker: Arc<dyn PathChecker>) -> Self {
        self.checker = checker;
        self
    }

    pub fn root(&self) -> Folder {
        Folder::root()
    }

    /// Lazy sequence of a folder's direct children, in server order.
    /// Restartable: each call re-runs the paginated fetch from offset 0.
    pub fn children(
        &self,
        folder: &Folder,
    ) -> impl Stream<Item = Result<Entry, DriveError>> + Send + use<> {
        entry_stream(self.transport.clone(), folder.clone())
    }

    pub fn files(
        &self,
        folder: &Folder,
    ) -> impl Stream<Item = Result<File, DriveError>> + Send + use<> {
        self.children(folder)
            .try_filter_map(|entry| future::ready(Ok(entry.into_file())))
    }

    pub fn folders(
        &self,
        folder: &Folder,
    ) -> impl Stream<Item = Result<Folder, DriveError>> + Send + use<> {
        self.children(folder)
            .try_filter_map(|entry| future::ready(Ok(entry.into_folder())))
    }

    /// Exact single-segment lookup of a child folder by name. Illegal names
    /// (blank or containing rejected characters) resolve to `None`, not an
    /// error.
    pub async fn resolve_folder(
        &self,
        parent: &Folder,
        name: &str,
    ) -> Result<Option<Folder>, DriveError> {
        if !self.checker.is_legal(name) {
            return Ok(None);
        }
        let mut folders = pin!(self.folders(parent));
        while let Some(folder) = folders.try_next().await? {
            if folder.name() == name {
                return Ok(Some(folder));
            }
        }
        Ok(None)
    }

    /// Finds a file by server id among `folder`'s direct children; with
    /// `deep`, recurses into child folders until some match is found. The
    /// traversal order among sibling folders is unspecified.
    pub async fn resolve_file_by_id(
        &self,
        folder: &Folder,
        id: &str,
        deep: bool,
    ) -> Result<Option<File>, DriveError> {
        if id.trim().is_empty() || id.starts_with('/') {
            return Err(DriveError::InvalidArgument(format!(
                "file id {id:?} is blank or rooted"
            )));
        }
        self.find_file_by_id(folder.clone(), id.to_owned(), deep)
            .await
    }

    fn find_file_by_id(
        &self,
        folder: Folder,
        id: String,
        deep: bool,
    ) -> BoxFuture<'_, Result<Option<File>, DriveError>> {
        Box::pin(async move {
            let mut subfolders = Vec::new();
            {
                let mut children = pin!(self.children(&folder));
                while let Some(entry) = children.try_next().await? {
                    match entry {
                        Entry::File(file) if file.id() == id => return Ok(Some(file)),
                        Entry::Folder(sub) => subfolders.push(sub),
                        Entry::File(_) => {}
                    }
                }
            }
            if deep {
                for sub in subfolders {
                    if let Some(found) = self.find_file_by_id(sub, id.clone(), true).await? {
                        return Ok(Some(found));
                    }
                }
            }
            Ok(None)
        })
    }

    /// Resolves a slash-delimited path to the files matching its last
    /// segment. A missing intermediate folder collapses the whole call to an
    /// empty result.
    pub async fn resolve_files(
        &self,
        folder: &Folder,
        path: &str,
    ) -> Result<Vec<File>, DriveError> {
        let entries = self
            .resolve_entries(folder.clone(), relative(path).to_owned(), true)
            .await?;
        Ok(entries.into_iter().filter_map(Entry::into_file).collect())
    }

    /// Like [`resolve_files`](Self::resolve_files) but the last segment
    /// matches entries of any type.
    pub async fn resolve_all(
        &self,
        folder: &Folder,
        path: &str,
    ) -> Result<Vec<Entry>, DriveError> {
        self.resolve_entries(folder.clone(), relative(path).to_owned(), false)
            .await
    }

    fn resolve_entries(
        &self,
        folder: Folder,
        path: String,
        files_only: bool,
    ) -> BoxFuture<'_, Result<Vec<Entry>, DriveError>> {
        Box::pin(async move {
            match path.split_once('/') {
                None => {
                    if !self.checker.is_legal(&path) {
                        return Ok(Vec::new());
                    }
                    let mut matches = Vec::new();
                    let mut children = pin!(self.children(&folder));
                    while let Some(entry) = children.try_next().await? {
                        if entry.name() != path {
                            continue;
                        }
                        if files_only && entry.as_file().is_none() {
                            continue;
                        }
                        matches.push(entry);
                    }
                    Ok(matches)
                }
                Some((head, rest)) => {
                    if !self.checker.is_legal(head) {
                        return Ok(Vec::new());
                    }
                    match self.resolve_folder(&folder, head).await? {
                        Some(sub) => {
                            self.resolve_entries(sub, rest.to_owned(), files_only).await
                        }
                        None => Ok(Vec::new()),
                    }
                }
            }
        })
    }

    /// Creates a child folder under `parent`. Idempotent: an already-exists
    /// response resolves the existing folder instead of failing.
    pub async fn create_folder(&self, parent: &Folder, name: &str) -> Result<Folder, DriveError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DriveError::InvalidArgument("folder name is blank".into()));
        }
        self.checker.check_legality(name)?;
        if !self.perms.is_operator(self.principal) {
            return Err(DriveError::PermissionDenied(format!(
                "principal {} is not an operator of this group",
                self.principal
            )));
        }

        let response = self.transport.create_folder(parent.id(), name).await?;
        match response.result_code {
            codes::SUCCESS => {
                if let Some(record) = response.folder {
                    return Ok(Folder::from_record(record, parent));
                }
                // Server acknowledged but sent no metadata; look it up.
            }
            codes::FOLDER_EXISTS => {
                debug!(name, "folder already exists, resolving in place");
            }
            codes::NO_PERMISSION => {
                return Err(DriveError::PermissionDenied(response.message));
            }
            code => {
                return Err(DriveError::Protocol {
                    code,
                    message: response.message,
                });
            }
        }

        self.resolve_folder(parent, name)
            .await?
            .ok_or_else(|| DriveError::InvariantViolation(format!("created folder {name:?}")))
    }
}

/// Paths may arrive with one leading separator (derived absolute paths do);
/// resolution itself is always relative to the starting folder.
fn relative(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}
