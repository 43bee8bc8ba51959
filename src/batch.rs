use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::{BranchId, Channel, Record, RecordId, RecordStatus};
use crate::error::RosterError;
use crate::messaging::MessagingClient;
use crate::store::{DirectoryStore, TransferRequest};

/// One user-triggered mutation over the current selection.
#[derive(Debug, Clone)]
pub enum BatchOperation {
    Transfer { to_branch: BranchId, reason: String },
    Notify {
        channel: Channel,
        subject: Option<String>,
        body: String,
    },
    Archive,
}

/// Per-batch accounting. `errors` preserves submission order so failures map
/// back to their source items.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<ItemError>,
}

/// `record_id == None` marks a batch-level outcome (a nacked bulk message, a
/// failed chunk span) rather than a single item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemError {
    pub record_id: Option<RecordId>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub result: BatchResult,
    /// True whenever at least one write landed: the caller must re-query the
    /// store instead of patching local state record by record.
    pub reload_needed: bool,
    /// A collaborator-fatal error that aborted the remaining items, distinct
    /// from per-item failures. Everything completed before it is still
    /// counted in `result`.
    pub fatal: Option<String>,
}

pub struct BatchCoordinator<'a, S, M> {
    store: &'a S,
    messaging: &'a M,
}

impl<'a, S: DirectoryStore, M: MessagingClient> BatchCoordinator<'a, S, M> {
    pub fn new(store: &'a S, messaging: &'a M) -> Self {
        Self { store, messaging }
    }

    /// Runs one operation over the selected records, sequentially, in input
    /// order. Item-level failures never abort the batch; operation-level
    /// preconditions fail before any collaborator call; fatal collaborator
    /// errors abort the remainder but keep the partial accounting.
    pub fn execute(
        &self,
        operation: &BatchOperation,
        selected: &[Record],
        sink: &dyn ProgressSink,
    ) -> Result<BatchOutcome, RosterError> {
        match operation {
            BatchOperation::Transfer { reason, .. } if reason.trim().is_empty() => {
                return Err(RosterError::MissingTransferReason);
            }
            BatchOperation::Notify { body, .. } if body.trim().is_empty() => {
                return Err(RosterError::EmptyMessageBody);
            }
            _ => {}
        }

        if selected.is_empty() {
            return Ok(outcome(BatchResult::default(), None));
        }

        match operation {
            BatchOperation::Transfer { to_branch, reason } => {
                self.transfer(selected, to_branch, reason, sink)
            }
            BatchOperation::Notify {
                channel,
                subject,
                body,
            } => self.notify(selected, *channel, subject.as_deref(), body, sink),
            BatchOperation::Archive => self.archive(selected, sink),
        }
    }

    fn transfer(
        &self,
        selected: &[Record],
        to_branch: &BranchId,
        reason: &str,
        sink: &dyn ProgressSink,
    ) -> Result<BatchOutcome, RosterError> {
        sink.event(ProgressEvent {
            message: format!(
                "phase=Submit; transferring {} records to {to_branch}",
                selected.len()
            ),
            elapsed: None,
        });
        let mut result = BatchResult::default();
        let mut fatal = None;
        for record in selected {
            let request = TransferRequest {
                record_id: record.id.clone(),
                from_branch: record.branch_id.clone(),
                to_branch: to_branch.clone(),
                reason: reason.to_string(),
            };
            match self.store.create_transfer_request(&request) {
                Ok(()) => result.success_count += 1,
                Err(err) => {
                    let is_fatal = err.is_fatal();
                    result.failure_count += 1;
                    result.errors.push(ItemError {
                        record_id: Some(record.id.clone()),
                        message: err.to_string(),
                    });
                    if is_fatal {
                        fatal = Some(err.to_string());
                        break;
                    }
                }
            }
        }
        Ok(outcome(result, fatal))
    }

    fn notify(
        &self,
        selected: &[Record],
        channel: Channel,
        subject: Option<&str>,
        body: &str,
        sink: &dyn ProgressSink,
    ) -> Result<BatchOutcome, RosterError> {
        let recipients: Vec<RecordId> = selected.iter().map(|record| record.id.clone()).collect();
        sink.event(ProgressEvent {
            message: format!(
                "phase=Submit; notifying {} recipients via {channel}",
                recipients.len()
            ),
            elapsed: None,
        });
        let mut result = BatchResult::default();
        let mut fatal = None;
        match self
            .messaging
            .send_bulk_message(&recipients, channel, subject, body)
        {
            Ok(()) => result.success_count = recipients.len(),
            Err(err) => {
                if err.is_fatal() {
                    fatal = Some(err.to_string());
                }
                result.failure_count = recipients.len();
                result.errors.push(ItemError {
                    record_id: None,
                    message: err.to_string(),
                });
            }
        }
        // a notification does not change store state, so no reload
        Ok(BatchOutcome {
            reload_needed: false,
            result,
            fatal,
        })
    }

    fn archive(
        &self,
        selected: &[Record],
        sink: &dyn ProgressSink,
    ) -> Result<BatchOutcome, RosterError> {
        sink.event(ProgressEvent {
            message: format!("phase=Submit; archiving {} records", selected.len()),
            elapsed: None,
        });
        let mut result = BatchResult::default();
        let mut fatal = None;
        for record in selected {
            let mut archived = record.clone();
            archived.status = RecordStatus::Archived;
            match self.store.write_record(archived.category, &archived) {
                Ok(_) => result.success_count += 1,
                Err(err) => {
                    let is_fatal = err.is_fatal();
                    result.failure_count += 1;
                    result.errors.push(ItemError {
                        record_id: Some(record.id.clone()),
                        message: err.to_string(),
                    });
                    if is_fatal {
                        fatal = Some(err.to_string());
                        break;
                    }
                }
            }
        }
        Ok(outcome(result, fatal))
    }
}

fn outcome(result: BatchResult, fatal: Option<String>) -> BatchOutcome {
    let reload_needed = result.success_count > 0;
    BatchOutcome {
        result,
        reload_needed,
        fatal,
    }
}
