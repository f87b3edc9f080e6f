use std::sync::Arc;

use groupdrive_core::{
    ContentHandle, TransferDestination, TransferMeta, UploadSlotRequest, codes,
};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::drive::GroupDrive;
use crate::entry::{File, Folder};
use crate::error::DriveError;

/// Optional observer for one upload. `on_begin` fires exactly once before
/// any transfer attempt, including the dedup skip path. `on_progression`
/// fires only during an actual transfer, with monotone cumulative bytes.
/// `on_finished` fires exactly once with the overall outcome (transfer plus
/// announcement), on every path.
pub trait ProgressObserver: Send + Sync {
    fn on_begin(&self) {}
    fn on_progression(&self, _bytes_transferred: u64) {}
    fn on_finished(&self, _result: &Result<(), DriveError>) {}
}

struct ReleaseOnExit<'a>(&'a dyn ContentHandle);

impl Drop for ReleaseOnExit<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

impl GroupDrive {
    /// Uploads `content` as `filename` under `folder`. Two phases: negotiate
    /// an upload slot (the server may already hold content with these
    /// digests, in which case the transfer is skipped), then push bytes over
    /// the bulk channel and announce the file in the owning conversation.
    pub async fn upload(
        &self,
        folder: &Folder,
        filename: &str,
        content: Arc<dyn ContentHandle>,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<File, DriveError> {
        // Released on every exit path, including cancellation mid-await.
        let _release = ReleaseOnExit(content.as_ref());
        self.upload_inner(folder, filename, content.as_ref(), observer.as_deref())
            .await
    }

    async fn upload_inner(
        &self,
        folder: &Folder,
        filename: &str,
        content: &dyn ContentHandle,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<File, DriveError> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(DriveError::InvalidArgument("file name is blank".into()));
        }
        self.checker.check_legality(filename)?;

        let md5 = content.md5();
        let sha1 = content.sha1();
        let response = self
            .transport
            .negotiate_upload(UploadSlotRequest {
                parent_id: folder.id(),
                filename,
                size: content.size(),
                md5: &md5,
                sha1: &sha1,
            })
            .await?;
        match response.result_code {
            codes::SUCCESS => {}
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

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let file = File::provisional(
            response.file_id.clone(),
            filename,
            folder,
            content.size(),
            md5,
            sha1,
            response.bus_id,
            now,
            self.principal,
        );

        if let Some(observer) = observer {
            observer.on_begin();
        }

        if response.exists {
            debug!(file = %file.id(), "server already holds these digests, skipping transfer");
            let outcome = self.announce(&file).await;
            if let Some(observer) = observer {
                observer.on_finished(&outcome);
            }
            return Ok(file);
        }

        let mut candidates = response.lan_addrs;
        candidates.extend(response.public_addr);
        let destination = TransferDestination {
            candidates,
            check_key: response.check_key,
        };
        let meta = TransferMeta {
            file_id: response.file_id,
            bus_id: response.bus_id,
            filename: filename.to_string(),
        };

        let mut report = |bytes: u64| {
            if let Some(observer) = observer {
                observer.on_progression(bytes);
            }
        };
        let outcome = match self
            .bulk
            .transfer(content, &destination, &meta, &mut report)
            .await
        {
            Ok(()) => self.announce(&file).await,
            Err(err) => Err(DriveError::Transfer(err)),
        };
        if let Some(observer) = observer {
            observer.on_finished(&outcome);
        }
        match outcome {
            Ok(()) => Ok(file),
            // The bytes landed; a failed announcement is reported through
            // the observer but does not undo the upload.
            Err(DriveError::Announce(_)) => Ok(file),
            Err(err) => Err(err),
        }
    }

    async fn announce(&self, file: &File) -> Result<(), DriveError> {
        match self.announcer.announce(file).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(file = %file.id(), error = %err, "upload announcement failed");
                Err(DriveError::Announce(err))
            }
        }
    }
}
