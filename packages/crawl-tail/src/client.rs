//! Start and tail requests against the crawl backend.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CACHE_CONTROL, CONTENT_TYPE, COOKIE};
use reqwest::RequestBuilder;

use crate::config::{AckShape, JobConfig, StartBody, CSRF_HEADER};
use crate::cursor::Cursor;
use crate::error::{StartError, StartResult, TailError, TailResult};
use crate::types::{LogBatch, StartAck, StartPayload, TailPayload, TailResponse};

/// How much of an unexpected body goes into an error message.
const BODY_SNIPPET_CHARS: usize = 120;

/// The two backend capabilities the client consumes.
///
/// Futures are `Send` on native targets so runs can be spawned on tokio; in
/// the browser they run on the single UI thread.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait JobClient {
    /// Ask the backend to start the job. Sends exactly one request.
    async fn start(&self) -> StartResult<StartAck>;

    /// Fetch log lines past `cursor` plus the current job status.
    async fn tail(&self, cursor: &Cursor) -> TailResult<TailResponse>;
}

/// [`JobClient`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpJobClient {
    client: reqwest::Client,
    config: JobConfig,
}

impl HttpJobClient {
    pub fn new(config: JobConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: JobConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    fn decorate(&self, mut req: RequestBuilder) -> RequestBuilder {
        req = req.header("X-Requested-With", "XMLHttpRequest");
        if let Some(cookie) = &self.config.cookie {
            req = req.header(COOKIE, cookie);
        }
        req
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl JobClient for HttpJobClient {
    async fn start(&self) -> StartResult<StartAck> {
        let url = self
            .config
            .start_url
            .clone()
            .ok_or(StartError::NotConfigured)?;

        let mut req = self.decorate(self.client.post(url.clone()));
        if let Some(token) = self.config.resolved_csrf_token() {
            req = req.header(CSRF_HEADER, token);
        }
        req = match &self.config.start_body {
            StartBody::Empty => req,
            StartBody::Json(value) => req.json(value),
            StartBody::Form(pairs) => req.form(pairs),
        };

        tracing::debug!(url = %url, job = %self.config.name, "Sending start request");
        let resp = req.send().await?;

        let status = resp.status();
        let is_json = is_json(resp.headers());
        let body = resp.text().await?;

        if !status.is_success() {
            let reason = is_json
                .then(|| serde_json::from_str::<StartPayload>(&body).ok())
                .flatten()
                .and_then(|payload| payload.reason());
            return Err(match reason {
                Some(reason) => StartError::Rejected(reason),
                None => StartError::BadResponse(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    snippet(&body)
                )),
            });
        }

        match self.config.ack {
            AckShape::JsonFlag => {
                if !is_json {
                    return Err(StartError::BadResponse(format!(
                        "start endpoint did not return JSON: {}",
                        snippet(&body)
                    )));
                }
                let payload: StartPayload = serde_json::from_str(&body)
                    .map_err(|e| StartError::BadResponse(format!("malformed JSON: {}", e)))?;
                match payload.ok {
                    Some(true) => Ok(payload.into_ack()),
                    Some(false) => Err(StartError::Rejected(
                        payload.reason().unwrap_or_else(|| "start failed".to_string()),
                    )),
                    None => Err(StartError::BadResponse("missing `ok` field".to_string())),
                }
            }
            AckShape::StatusOnly => {
                let payload = is_json
                    .then(|| serde_json::from_str::<StartPayload>(&body).ok())
                    .flatten();
                match payload {
                    Some(payload) if payload.ok == Some(false) => Err(StartError::Rejected(
                        payload.reason().unwrap_or_else(|| "start failed".to_string()),
                    )),
                    Some(payload) => Ok(payload.into_ack()),
                    None => Ok(StartAck::default()),
                }
            }
        }
    }

    async fn tail(&self, cursor: &Cursor) -> TailResult<TailResponse> {
        let req = self
            .decorate(self.client.get(self.config.tail_url.clone()))
            .query(&cursor.query_pairs())
            .header(CACHE_CONTROL, "no-store");

        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TailError::Status {
                status: status.as_u16(),
            });
        }

        let is_json = is_json(resp.headers());
        let body = resp.text().await?;
        if !is_json {
            return Err(TailError::BadResponse(format!(
                "tail endpoint did not return JSON: {}",
                snippet(&body)
            )));
        }

        let payload: TailPayload = serde_json::from_str(&body)
            .map_err(|e| TailError::BadResponse(format!("malformed JSON: {}", e)))?;

        match payload.ok {
            Some(true) => {}
            Some(false) => {
                return Err(TailError::Rejected(
                    payload.reason().unwrap_or_else(|| "ok: false".to_string()),
                ))
            }
            None => return Err(TailError::BadResponse("missing `ok` field".to_string())),
        }

        let running = payload.running().ok_or_else(|| {
            TailError::BadResponse("missing `is_running`/`done` flag".to_string())
        })?;

        let next_cursor = cursor.advance(&payload);
        let status = payload.status(running);
        let lines = payload.lines.unwrap_or_default();

        tracing::debug!(
            cursor = %cursor,
            next = %next_cursor,
            lines = lines.len(),
            running,
            "Tail response"
        );

        Ok(TailResponse {
            batch: LogBatch { lines, next_cursor },
            status,
        })
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("application/json"))
        .unwrap_or(false)
}

fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_CHARS).collect()
}
