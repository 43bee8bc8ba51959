use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink};
use crate::batch::{BatchResult, ItemError};
use crate::domain::{BranchId, Category, RecordDraft};
use crate::error::RosterError;
use crate::normalize::{NormalizedBatch, RawRow, RowErrors, normalize_rows};
use crate::store::DirectoryStore;

pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Outcome of one import run. Rows rejected by the normalizer never enter a
/// chunk and are reported separately from write-time failures; write-time
/// counts are sums across chunks.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub accepted_count: usize,
    pub rejected: Vec<RowErrors>,
    pub result: BatchResult,
    pub fatal: Option<String>,
}

/// Partitions accepted rows into fixed-size chunks and submits them strictly
/// sequentially, one all-or-nothing `write_batch` per chunk. A failed chunk
/// marks all of its rows failed and the import proceeds to the next chunk.
#[derive(Debug)]
pub struct ChunkedImporter<'a, S> {
    store: &'a S,
    chunk_size: usize,
}

impl<'a, S: DirectoryStore> ChunkedImporter<'a, S> {
    pub fn new(store: &'a S, chunk_size: usize) -> Result<Self, RosterError> {
        if chunk_size == 0 {
            return Err(RosterError::InvalidChunkSize(chunk_size));
        }
        Ok(Self { store, chunk_size })
    }

    pub fn import(
        &self,
        rows: &[RawRow],
        category: Category,
        default_branch: Option<&BranchId>,
        sink: &dyn ProgressSink,
    ) -> ImportReport {
        sink.event(ProgressEvent {
            message: format!("phase=Normalize; {} rows", rows.len()),
            elapsed: None,
        });
        let normalized = normalize_rows(rows, category, default_branch);
        if !normalized.rejected.is_empty() {
            sink.event(ProgressEvent {
                message: format!(
                    "phase=Normalize; rejected {} of {} rows",
                    normalized.rejected.len(),
                    normalized.total_rows
                ),
                elapsed: None,
            });
        }

        let NormalizedBatch {
            total_rows,
            accepted,
            rejected,
        } = normalized;
        let accepted_count = accepted.len();
        let chunk_count = accepted_count.div_ceil(self.chunk_size);

        let mut result = BatchResult::default();
        let mut fatal = None;
        for (index, chunk) in accepted.chunks(self.chunk_size).enumerate() {
            sink.event(ProgressEvent {
                message: format!(
                    "phase=Submit; chunk {}/{} ({} rows)",
                    index + 1,
                    chunk_count,
                    chunk.len()
                ),
                elapsed: None,
            });
            let drafts: Vec<RecordDraft> = chunk.iter().map(|row| row.draft.clone()).collect();
            match self.store.write_batch(category, &drafts) {
                Ok(()) => result.success_count += chunk.len(),
                Err(err) => {
                    let first = chunk.first().map(|row| row.row_number).unwrap_or(0);
                    let last = chunk.last().map(|row| row.row_number).unwrap_or(0);
                    result.failure_count += chunk.len();
                    result.errors.push(ItemError {
                        record_id: None,
                        message: format!("rows {first}-{last}: {err}"),
                    });
                    if err.is_fatal() {
                        fatal = Some(err.to_string());
                        break;
                    }
                }
            }
        }

        ImportReport {
            total_rows,
            accepted_count,
            rejected,
            result,
            fatal,
        }
    }
}
