use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::source::{ErrorKind, SourceResult};

pub const USER_AGENT_VALUE: &str = concat!("statusboard/", env!("CARGO_PKG_VERSION"));

/// Build the client shared by every adapter. Deadlines are applied per request.
pub fn build_client() -> Result<Client, String> {
    Client::builder()
        .user_agent(USER_AGENT_VALUE)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))
}

pub fn classify_transport(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_connect() {
        ErrorKind::NetworkUnreachable
    } else if err.is_decode() {
        ErrorKind::MalformedResponse
    } else if let Some(status) = err.status() {
        ErrorKind::HttpError(status.as_u16())
    } else {
        ErrorKind::Unknown
    }
}

pub fn classify_status(status: StatusCode) -> Result<(), ErrorKind> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ErrorKind::HttpError(status.as_u16()))
    }
}

/// Raw response as seen by an adapter before normalization.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ErrorKind> {
        serde_json::from_slice(&self.body).map_err(|e| {
            debug!(error = %e, "Response body did not match expected schema");
            ErrorKind::MalformedResponse
        })
    }
}

/// One HTTP endpoint family: base URL, default headers and a request deadline.
#[derive(Debug, Clone)]
pub struct Endpoint {
    client: Client,
    base_url: String,
    headers: HeaderMap,
    timeout: Duration,
}

impl Endpoint {
    pub fn new(client: Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: HeaderMap::new(),
            timeout,
        }
    }

    /// Endpoint preconfigured with the source-control API's headers.
    pub fn github(client: Client, base_url: &str, timeout: Duration, token: Option<&str>) -> Self {
        let mut endpoint = Self::new(client, base_url, timeout);
        endpoint
            .headers
            .insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        if let Some(token) = token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                endpoint.headers.insert(AUTHORIZATION, value);
            }
        }
        endpoint
    }

    pub fn url(&self, path: &str) -> String {
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `path` with the endpoint deadline, returning status and body without
    /// judging the status code.
    pub async fn get_raw(&self, path: &str, query: &[(&str, &str)]) -> Result<RawResponse, ErrorKind> {
        let url = self.url(path);
        let request = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .query(query)
            .send();

        let exchange = async {
            let response = request.await.map_err(|e| classify_transport(&e))?;
            let status = response.status();
            let body = response
                .bytes()
                .await
                .map_err(|e| classify_transport(&e))?;
            Ok::<_, ErrorKind>(RawResponse {
                status,
                body: body.to_vec(),
            })
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                debug!(url = %url, timeout_ms = self.timeout.as_millis() as u64, "Request deadline elapsed");
                Err(ErrorKind::Timeout)
            }
        }
    }

    /// GET `path` and decode a 2xx JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ErrorKind> {
        let raw = self.get_raw(path, query).await?;
        classify_status(raw.status)?;
        raw.json()
    }
}

/// Run `fetch`, timing it, and fold its outcome into a `SourceResult`.
pub async fn timed<T, F>(fetch: F) -> SourceResult<T>
where
    F: std::future::Future<Output = Result<T, ErrorKind>>,
{
    let started = Instant::now();
    let attempted_at = Utc::now();
    match fetch.await {
        Ok(data) => SourceResult::Ok {
            data,
            fetched_at: Utc::now(),
            latency_ms: started.elapsed().as_millis() as u64,
        },
        Err(reason) => SourceResult::Failed {
            reason,
            attempted_at,
        },
    }
}
