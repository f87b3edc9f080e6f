mod blocking;
mod drive;
mod entry;
mod error;
mod list;
mod upload;

pub use blocking::{BlockingEntries, BlockingGroupDrive};
pub use drive::{Announcer, DefaultPathChecker, GroupDrive, PathChecker, PermissionOracle};
pub use entry::{Entry, File, Folder, ROOT_ID};
pub use error::{AnnounceError, DriveError};
pub use upload::ProgressObserver;
