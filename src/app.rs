use std::time::Duration;

use crate::batch::{BatchCoordinator, BatchOperation, BatchOutcome};
use crate::domain::{BranchFilter, BranchId, Tab};
use crate::error::RosterError;
use crate::import::{ChunkedImporter, ImportReport};
use crate::messaging::MessagingClient;
use crate::normalize::RawRow;
use crate::store::DirectoryStore;
use crate::view::DirectoryView;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Engine facade: loads directory views and runs batch operations against
/// the store and messaging collaborators. All external calls happen
/// sequentially inside one invocation.
#[derive(Clone)]
pub struct App<S: DirectoryStore, M: MessagingClient> {
    store: S,
    messaging: M,
    page_size: usize,
    chunk_size: usize,
}

impl<S: DirectoryStore, M: MessagingClient> App<S, M> {
    pub fn new(
        store: S,
        messaging: M,
        page_size: usize,
        chunk_size: usize,
    ) -> Result<Self, RosterError> {
        if page_size == 0 {
            return Err(RosterError::InvalidPageSize(page_size));
        }
        if chunk_size == 0 {
            return Err(RosterError::InvalidChunkSize(chunk_size));
        }
        Ok(Self {
            store,
            messaging,
            page_size,
            chunk_size,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Queries the store for one tab's records and builds a fresh view over
    /// them, scoped to the given branch.
    pub fn load(
        &self,
        tab: Tab,
        branch: &BranchFilter,
        sink: &dyn ProgressSink,
    ) -> Result<DirectoryView, RosterError> {
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; loading {tab} records"),
            elapsed: None,
        });
        let records = self.store.query_records(tab.category(), branch)?;
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; {} records loaded", records.len()),
            elapsed: None,
        });
        Ok(DirectoryView::new(records, tab, self.page_size).with_branch_scope(branch.clone()))
    }

    /// Executes one batch operation over the view's selection. When any write
    /// landed, re-queries the store and swaps the reloaded records into the
    /// view rather than patching records locally.
    pub fn run_batch(
        &self,
        view: &mut DirectoryView,
        operation: &BatchOperation,
        sink: &dyn ProgressSink,
    ) -> Result<BatchOutcome, RosterError> {
        let selected = view.selected_records();
        let coordinator = BatchCoordinator::new(&self.store, &self.messaging);
        let outcome = coordinator.execute(operation, &selected, sink)?;
        if outcome.reload_needed {
            sink.event(ProgressEvent {
                message: "phase=Reload; reconciling with directory store".to_string(),
                elapsed: None,
            });
            let records = self
                .store
                .query_records(view.criteria().tab.category(), view.branch_scope())?;
            view.replace_records(records);
        }
        Ok(outcome)
    }

    /// Bulk import into one tab's category. The caller reloads any open view
    /// afterwards the same way `run_batch` does.
    pub fn import(
        &self,
        rows: &[RawRow],
        tab: Tab,
        default_branch: Option<&BranchId>,
        sink: &dyn ProgressSink,
    ) -> Result<ImportReport, RosterError> {
        let importer = ChunkedImporter::new(&self.store, self.chunk_size)?;
        Ok(importer.import(rows, tab.category(), default_branch, sink))
    }
}
