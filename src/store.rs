use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::domain::{BranchFilter, BranchId, Category, Record, RecordDraft, RecordId};
use crate::error::RosterError;

/// One branch-transfer request as submitted to the directory store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub record_id: RecordId,
    pub from_branch: BranchId,
    pub to_branch: BranchId,
    pub reason: String,
}

/// The system of record. `write_batch` is all-or-nothing per call; the other
/// writes are single-item.
pub trait DirectoryStore: Send + Sync {
    fn query_records(
        &self,
        category: Category,
        branch: &BranchFilter,
    ) -> Result<Vec<Record>, RosterError>;
    fn write_record(&self, category: Category, record: &Record) -> Result<Record, RosterError>;
    fn write_batch(&self, category: Category, drafts: &[RecordDraft]) -> Result<(), RosterError>;
    fn create_transfer_request(&self, request: &TransferRequest) -> Result<(), RosterError>;
}

#[derive(Clone)]
pub struct HttpDirectoryStore {
    client: Client,
    base_url: String,
}

impl HttpDirectoryStore {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RosterError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("flock-rm/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| RosterError::StoreHttp(err.to_string()))?,
        );
        if let Ok(token) = std::env::var("FLOCK_API_TOKEN") {
            if !token.trim().is_empty() {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                        .map_err(|err| RosterError::StoreHttp(err.to_string()))?,
                );
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| RosterError::StoreHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn send_with_retries<F>(&self, mut make_req: F) -> Result<reqwest::blocking::Response, RosterError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        tracing::debug!(status, attempt, "retrying directory store request");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        tracing::debug!(error = %err, attempt, "retrying directory store request");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    if err.is_timeout() || err.is_connect() {
                        return Err(RosterError::StoreUnavailable(err.to_string()));
                    }
                    return Err(RosterError::StoreHttp(err.to_string()));
                }
            }
        }
    }

    fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, RosterError> {
        let status = response.status().as_u16();
        if matches!(status, 401 | 403) {
            let message = response
                .text()
                .unwrap_or_else(|_| "authorization rejected".to_string());
            return Err(RosterError::AuthExpired(message));
        }
        if !response.status().is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "directory store request failed".to_string());
            return Err(RosterError::StoreStatus { status, message });
        }
        Ok(response)
    }
}

#[derive(Debug, Serialize)]
struct BatchPayload<'a> {
    category: Category,
    records: &'a [RecordDraft],
}

impl DirectoryStore for HttpDirectoryStore {
    fn query_records(
        &self,
        category: Category,
        branch: &BranchFilter,
    ) -> Result<Vec<Record>, RosterError> {
        let url = format!("{}/records", self.base_url);
        let response = self.send_with_retries(|| {
            let mut request = self
                .client
                .get(&url)
                .query(&[("category", category.to_string())]);
            if let BranchFilter::Branch(branch) = branch {
                request = request.query(&[("branch", branch.as_str())]);
            }
            request
        })?;
        let response = Self::check(response)?;
        response
            .json::<Vec<Record>>()
            .map_err(|err| RosterError::StoreHttp(err.to_string()))
    }

    fn write_record(&self, category: Category, record: &Record) -> Result<Record, RosterError> {
        let url = format!("{}/records/{}/{}", self.base_url, category, record.id);
        let response = self.send_with_retries(|| self.client.put(&url).json(record))?;
        let response = Self::check(response)?;
        response
            .json::<Record>()
            .map_err(|err| RosterError::StoreHttp(err.to_string()))
    }

    fn write_batch(&self, category: Category, drafts: &[RecordDraft]) -> Result<(), RosterError> {
        let url = format!("{}/records/batch", self.base_url);
        let payload = BatchPayload {
            category,
            records: drafts,
        };
        let response = self.send_with_retries(|| self.client.post(&url).json(&payload))?;
        Self::check(response)?;
        Ok(())
    }

    fn create_transfer_request(&self, request: &TransferRequest) -> Result<(), RosterError> {
        let url = format!("{}/transfers", self.base_url);
        let response = self.send_with_retries(|| self.client.post(&url).json(request))?;
        Self::check(response)?;
        Ok(())
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let store = HttpDirectoryStore::new("https://roster.example.org/api/").unwrap();
        assert_eq!(store.base_url, "https://roster.example.org/api");
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(401));
    }
}
