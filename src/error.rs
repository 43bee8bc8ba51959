use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum RosterError {
    #[error("invalid record id: {0}")]
    InvalidRecordId(String),

    #[error("invalid branch id: {0}")]
    InvalidBranchId(String),

    #[error("invalid record status: {0}")]
    InvalidStatus(String),

    #[error("invalid membership level: {0}")]
    InvalidLevel(String),

    #[error("invalid directory tab: {0}")]
    InvalidTab(String),

    #[error("invalid message channel: {0}")]
    InvalidChannel(String),

    #[error("missing config file flock-rm.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("page size must be at least 1, got {0}")]
    InvalidPageSize(usize),

    #[error("chunk size must be at least 1, got {0}")]
    InvalidChunkSize(usize),

    #[error("transfer reason must not be empty")]
    MissingTransferReason,

    #[error("message body must not be empty")]
    EmptyMessageBody,

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("directory store request failed: {0}")]
    StoreHttp(String),

    #[error("directory store returned status {status}: {message}")]
    StoreStatus { status: u16, message: String },

    #[error("messaging request failed: {0}")]
    MessagingHttp(String),

    #[error("messaging service returned status {status}: {message}")]
    MessagingStatus { status: u16, message: String },

    #[error("authorization expired: {0}")]
    AuthExpired(String),

    #[error("directory store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl RosterError {
    /// Fatal errors abort the remainder of a batch; item-level failures do not.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RosterError::AuthExpired(_) | RosterError::StoreUnavailable(_)
        )
    }
}
