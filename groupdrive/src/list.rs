use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::Stream;
use futures_util::stream;
use groupdrive_core::{RawEntry, Transport, codes};
use tracing::debug;

use crate::entry::{Entry, Folder};
use crate::error::DriveError;

/// Cursor over one folder's children. Each page request starts where the
/// previous page ended; a non-success result code or an empty batch ends
/// the sequence as success-with-no-more-data.
pub(crate) struct Pager {
    transport: Arc<dyn Transport>,
    folder_id: String,
    offset: u32,
    finished: bool,
}

impl Pager {
    pub(crate) fn new(transport: Arc<dyn Transport>, folder_id: String) -> Self {
        Self {
            transport,
            folder_id,
            offset: 0,
            finished: false,
        }
    }

    /// An empty batch means the sequence is over.
    pub(crate) async fn next_batch(&mut self) -> Result<Vec<RawEntry>, DriveError> {
        if self.finished {
            return Ok(Vec::new());
        }
        let page = self
            .transport
            .list_children(&self.folder_id, self.offset)
            .await?;
        if page.result_code != codes::SUCCESS || page.items.is_empty() {
            self.finished = true;
            return Ok(Vec::new());
        }
        debug!(
            folder = %self.folder_id,
            offset = self.offset,
            count = page.items.len(),
            "fetched listing page"
        );
        self.offset = self.offset.saturating_add(page.items.len() as u32);
        Ok(page.items)
    }
}

/// Lazy cooperative view over a folder's children. Every call builds a
/// fresh cursor at offset 0; nothing is cached across calls, and at most
/// one page is buffered.
pub(crate) fn entry_stream(
    transport: Arc<dyn Transport>,
    parent: Folder,
) -> impl Stream<Item = Result<Entry, DriveError>> + Send {
    let pager = Pager::new(transport, parent.id().to_owned());
    let buffered: VecDeque<RawEntry> = VecDeque::new();
    stream::try_unfold(
        (pager, buffered, parent),
        |(mut pager, mut buffered, parent)| async move {
            loop {
                while let Some(raw) = buffered.pop_front() {
                    if let Some(entry) = Entry::from_record(raw, &parent) {
                        return Ok(Some((entry, (pager, buffered, parent))));
                    }
                }
                let batch = pager.next_batch().await?;
                if batch.is_empty() {
                    return Ok(None);
                }
                buffered.extend(batch);
            }
        },
    )
}
