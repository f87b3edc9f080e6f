use std::sync::Arc;

use groupdrive_core::{FileRecord, FolderRecord, RawEntry};

/// The root folder's id is the path separator itself.
pub const ROOT_ID: &str = "/";

/// A folder node. Cheap to clone; clones share the same identity.
#[derive(Debug, Clone)]
pub struct Folder {
    inner: Arc<FolderInner>,
}

#[derive(Debug)]
struct FolderInner {
    id: String,
    name: String,
    upload_time: i64,
    last_modified_time: i64,
    uploader_id: u64,
    contents_count: u32,
    // Non-owning in effect: folders never hold their children, so this
    // upward link cannot form a cycle.
    parent: Option<Folder>,
}

impl Folder {
    /// Well-known sentinel for the top of the tree.
    pub fn root() -> Self {
        Self {
            inner: Arc::new(FolderInner {
                id: ROOT_ID.to_string(),
                name: String::new(),
                upload_time: 0,
                last_modified_time: 0,
                uploader_id: 0,
                contents_count: 0,
                parent: None,
            }),
        }
    }

    pub(crate) fn from_record(record: FolderRecord, parent: &Folder) -> Self {
        Self {
            inner: Arc::new(FolderInner {
                id: record.id,
                name: record.name,
                upload_time: record.create_time,
                last_modified_time: record.modified_time,
                uploader_id: record.creator_id,
                contents_count: record.total_count,
                parent: Some(parent.clone()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_root(&self) -> bool {
        self.inner.id == ROOT_ID
    }

    pub fn upload_time(&self) -> i64 {
        self.inner.upload_time
    }

    pub fn last_modified_time(&self) -> i64 {
        self.inner.last_modified_time
    }

    pub fn uploader_id(&self) -> u64 {
        self.inner.uploader_id
    }

    /// Direct-child count as reported by the fetch that produced this node;
    /// authoritative only at that moment.
    pub fn contents_count(&self) -> u32 {
        self.inner.contents_count
    }

    pub fn parent(&self) -> Option<&Folder> {
        self.inner.parent.as_ref()
    }

    /// Derived on every call, never stored. Stale if an ancestor was renamed
    /// without a refresh.
    pub fn absolute_path(&self) -> String {
        if self.is_root() {
            return ROOT_ID.to_string();
        }
        match self.parent() {
            Some(parent) if !parent.is_root() => {
                format!("{}/{}", parent.absolute_path(), self.name())
            }
            _ => format!("/{}", self.name()),
        }
    }
}

impl PartialEq for Folder {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Folder {}

/// A file node.
#[derive(Debug, Clone)]
pub struct File {
    inner: Arc<FileInner>,
}

#[derive(Debug)]
struct FileInner {
    id: String,
    name: String,
    size: u64,
    md5: String,
    sha1: String,
    upload_time: i64,
    last_modified_time: i64,
    expiry_time: i64,
    uploader_id: u64,
    bus_id: i32,
    parent: Folder,
}

impl File {
    pub(crate) fn from_record(record: FileRecord, parent: &Folder) -> Self {
        Self {
            inner: Arc::new(FileInner {
                id: record.id,
                name: record.name,
                size: record.size,
                md5: record.md5,
                sha1: record.sha1,
                upload_time: record.upload_time,
                last_modified_time: record.modified_time,
                expiry_time: record.expiry_time,
                uploader_id: record.uploader_id,
                bus_id: record.bus_id,
                parent: parent.clone(),
            }),
        }
    }

    /// Node materialized from an upload negotiation, before (or instead of)
    /// the binary transfer. Timestamps are the caller's current clock.
    pub(crate) fn provisional(
        id: String,
        name: &str,
        parent: &Folder,
        size: u64,
        md5: String,
        sha1: String,
        bus_id: i32,
        now: i64,
        uploader_id: u64,
    ) -> Self {
        Self {
            inner: Arc::new(FileInner {
                id,
                name: name.to_string(),
                size,
                md5,
                sha1,
                upload_time: now,
                last_modified_time: now,
                expiry_time: 0,
                uploader_id,
                bus_id,
                parent: parent.clone(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn size(&self) -> u64 {
        self.inner.size
    }

    pub fn md5(&self) -> &str {
        &self.inner.md5
    }

    pub fn sha1(&self) -> &str {
        &self.inner.sha1
    }

    pub fn upload_time(&self) -> i64 {
        self.inner.upload_time
    }

    pub fn last_modified_time(&self) -> i64 {
        self.inner.last_modified_time
    }

    /// Zero means the file never expires.
    pub fn expiry_time(&self) -> i64 {
        self.inner.expiry_time
    }

    pub fn uploader_id(&self) -> u64 {
        self.inner.uploader_id
    }

    pub fn bus_id(&self) -> i32 {
        self.inner.bus_id
    }

    pub fn parent(&self) -> &Folder {
        &self.inner.parent
    }

    pub fn absolute_path(&self) -> String {
        if self.inner.parent.is_root() {
            format!("/{}", self.name())
        } else {
            format!("{}/{}", self.inner.parent.absolute_path(), self.name())
        }
    }
}

impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for File {}

/// A node in the remote tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    File(File),
    Folder(Folder),
}

impl Entry {
    /// Turns one raw listing record into a typed node under `parent`.
    /// Records carrying neither file nor folder metadata are filler and
    /// produce no entry.
    pub fn from_record(record: RawEntry, parent: &Folder) -> Option<Entry> {
        if let Some(file) = record.file {
            return Some(Entry::File(File::from_record(file, parent)));
        }
        if let Some(folder) = record.folder {
            return Some(Entry::Folder(Folder::from_record(folder, parent)));
        }
        None
    }

    pub fn id(&self) -> &str {
        match self {
            Entry::File(file) => file.id(),
            Entry::Folder(folder) => folder.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entry::File(file) => file.name(),
            Entry::Folder(folder) => folder.name(),
        }
    }

    pub fn absolute_path(&self) -> String {
        match self {
            Entry::File(file) => file.absolute_path(),
            Entry::Folder(folder) => folder.absolute_path(),
        }
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            Entry::File(file) => Some(file),
            Entry::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Entry::Folder(folder) => Some(folder),
            Entry::File(_) => None,
        }
    }

    pub fn into_file(self) -> Option<File> {
        match self {
            Entry::File(file) => Some(file),
            Entry::Folder(_) => None,
        }
    }

    pub fn into_folder(self) -> Option<Folder> {
        match self {
            Entry::Folder(folder) => Some(folder),
            Entry::File(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder_record(id: &str, name: &str) -> FolderRecord {
        FolderRecord {
            id: id.into(),
            name: name.into(),
            create_time: 100,
            modified_time: 200,
            creator_id: 1,
            total_count: 0,
        }
    }

    fn file_record(id: &str, name: &str) -> FileRecord {
        FileRecord {
            id: id.into(),
            name: name.into(),
            size: 12,
            md5: "aa".into(),
            sha1: "bb".into(),
            upload_time: 100,
            modified_time: 200,
            expiry_time: 0,
            uploader_id: 1,
            bus_id: 3,
        }
    }

    #[test]
    fn root_path_is_separator() {
        assert_eq!(Folder::root().absolute_path(), "/");
        assert!(Folder::root().is_root());
    }

    #[test]
    fn paths_derive_through_parents() {
        let root = Folder::root();
        let docs = Folder::from_record(folder_record("d1", "docs"), &root);
        let nested = Folder::from_record(folder_record("d2", "2024"), &docs);
        let file = File::from_record(file_record("f1", "a.txt"), &nested);

        assert_eq!(docs.absolute_path(), "/docs");
        assert_eq!(nested.absolute_path(), "/docs/2024");
        assert_eq!(file.absolute_path(), "/docs/2024/a.txt");
    }

    #[test]
    fn identity_is_id_plus_kind() {
        let root = Folder::root();
        let a = Folder::from_record(folder_record("d1", "old-name"), &root);
        let b = Folder::from_record(folder_record("d1", "new-name"), &root);
        assert_eq!(a, b);

        let file = File::from_record(file_record("d1", "old-name"), &root);
        assert_ne!(Entry::Folder(a), Entry::File(file));
    }

    #[test]
    fn factory_skips_filler_records() {
        let root = Folder::root();
        assert!(Entry::from_record(RawEntry::default(), &root).is_none());

        let record = RawEntry {
            file: Some(file_record("f1", "a.txt")),
            folder: None,
        };
        match Entry::from_record(record, &root) {
            Some(Entry::File(file)) => assert_eq!(file.id(), "f1"),
            other => panic!("expected file entry, got {other:?}"),
        }
    }
}
