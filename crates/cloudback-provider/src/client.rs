use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::{Error, RemoteError, Result};
use crate::log_sanitize::sanitize_remote_text;
use crate::model::{DefinitionKey, Settings};
use crate::store::RemoteStore;

pub const DEFAULT_ENDPOINT: &str = "https://app.cloudback.it";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const GET_PATH: &str = "/ops/definition/get";
const UPDATE_PATH: &str = "/ops/definition/update";
const API_KEY_HEADER: &str = "X-API-KEY";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionLookup<'a> {
    platform: &'a str,
    account: &'a str,
    subject_type: &'a str,
    subject_name: &'a str,
}

impl<'a> From<&'a DefinitionKey> for DefinitionLookup<'a> {
    fn from(key: &'a DefinitionKey) -> Self {
        Self {
            platform: &key.platform,
            account: &key.account,
            subject_type: &key.subject.subject_type,
            subject_name: &key.subject.subject_name,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionUpdate<'a> {
    #[serde(flatten)]
    lookup: DefinitionLookup<'a>,
    settings: &'a Settings,
}

// The service may omit fields it considers empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsPayload {
    enabled: bool,
    schedule: String,
    storage: String,
    retention: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DefinitionPayload {
    settings: SettingsPayload,
}

impl From<SettingsPayload> for Settings {
    fn from(p: SettingsPayload) -> Self {
        Self {
            enabled: p.enabled,
            schedule: p.schedule,
            storage: p.storage,
            retention: p.retention,
        }
    }
}

/// Blocking HTTP client for the Cloudback definitions API.
#[derive(Debug, Clone)]
pub struct CloudbackClient {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl CloudbackClient {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| Error::msg(format!("invalid API key header value: {e}")))?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::msg(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> std::result::Result<reqwest::blocking::Response, RemoteError> {
        let url = format!("{}{}", self.endpoint, path);
        tracing::debug!(%url, "cloudback request");
        let res = self
            .http
            .post(url)
            .json(body)
            .send()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let status_text = match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        };
        // The body is server-controlled; an unreadable one is reported as empty.
        let body = res.text().unwrap_or_default();
        Err(RemoteError::Status {
            status_code: status.as_u16(),
            status: status_text,
            body: sanitize_remote_text(&body),
        })
    }
}

impl RemoteStore for CloudbackClient {
    fn fetch_definition(&self, key: &DefinitionKey) -> Result<Settings> {
        let res = self.post(GET_PATH, &DefinitionLookup::from(key))?;
        let payload: DefinitionPayload = res
            .json()
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(payload.settings.into())
    }

    fn upsert_definition(&self, key: &DefinitionKey, settings: &Settings) -> Result<()> {
        let body = DefinitionUpdate {
            lookup: DefinitionLookup::from(key),
            settings,
        };
        self.post(UPDATE_PATH, &body)?;
        Ok(())
    }
}
