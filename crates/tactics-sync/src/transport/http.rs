//! Blocking reqwest transport.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::StatusCode;
use tactics_core::config::SyncConfig;
use tactics_core::errors::SyncError;
use tactics_core::models::AggregateStatus;
use tracing::debug;

use super::protocol::{parse_status, ModelUpload, GLOBAL_MODEL_PATH, STATUS_PATH, UPLOAD_PATH};
use super::AggregatorTransport;

const API_KEY_HEADER: &str = "X-API-Key";
const REQUEST_ID_HEADER: &str = "X-Request-Id";
const CLIENT_ID_HEADER: &str = "X-Client-Id";

#[derive(Debug)]
pub struct HttpTransport {
    base_url: String,
    api_key: Option<String>,
    timeout_secs: u64,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let timeout_secs = config.request_timeout_secs.max(1);
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .build()
            .map_err(|e| SyncError::Network {
                reason: e.to_string(),
            })?;
        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            timeout_secs,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => req.header(API_KEY_HEADER, key),
            None => req,
        }
    }

    fn send(&self, req: RequestBuilder) -> Result<Response, SyncError> {
        let resp = self.authorized(req).send().map_err(|e| self.classify(e))?;
        let status = resp.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(resp);
        }
        let reason = resp.text().unwrap_or_default();
        Err(SyncError::RemoteRejected {
            status: status.as_u16(),
            reason,
        })
    }

    fn classify(&self, err: reqwest::Error) -> SyncError {
        if err.is_timeout() {
            SyncError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            SyncError::Network {
                reason: err.to_string(),
            }
        }
    }

    fn read_status(&self, resp: Response) -> Result<AggregateStatus, SyncError> {
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(SyncError::RemoteRejected {
                status: 404,
                reason: "endpoint not found".to_string(),
            });
        }
        let body = resp.bytes().map_err(|e| self.classify(e))?;
        parse_status(&body)
    }
}

impl AggregatorTransport for HttpTransport {
    fn upload(&self, upload: &ModelUpload) -> Result<AggregateStatus, SyncError> {
        let mut req = self
            .client
            .post(self.url(UPLOAD_PATH))
            .header(CONTENT_TYPE, "application/json")
            .header(REQUEST_ID_HEADER, &upload.request_id)
            .header(CLIENT_ID_HEADER, &upload.client_id)
            .body(upload.body.clone());
        if upload.compressed {
            req = req.header(CONTENT_ENCODING, "gzip");
        }
        debug!(
            request_id = %upload.request_id,
            bytes = upload.body.len(),
            compressed = upload.compressed,
            "uploading delta"
        );
        let resp = self.send(req)?;
        self.read_status(resp)
    }

    fn fetch_status(&self) -> Result<AggregateStatus, SyncError> {
        let resp = self.send(self.client.get(self.url(STATUS_PATH)))?;
        self.read_status(resp)
    }

    fn download_global_model(&self) -> Result<Option<Vec<u8>>, SyncError> {
        let resp = self.send(self.client.get(self.url(GLOBAL_MODEL_PATH)))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = resp.bytes().map_err(|e| self.classify(e))?;
        Ok((!body.is_empty()).then(|| body.to_vec()))
    }
}
