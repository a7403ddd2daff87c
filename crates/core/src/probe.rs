//! Single-shot HTTP and TCP probes that never fail: every outcome becomes a
//! [`ProbeResult`].

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tokio::net::TcpStream;

/// Status codes a probe treats as "the endpoint is there and answering".
pub const ACCEPTED_STATUSES: [u16; 3] = [200, 201, 422];

const TEXT_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    fn parse(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(v) => ResponseBody::Json(v),
            Err(_) => ResponseBody::Text(preview(&text)),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            ResponseBody::Text(_) => None,
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > TEXT_PREVIEW_CHARS {
        let head: String = text.chars().take(TEXT_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub success: bool,
    /// 0 when no HTTP status was obtained.
    pub status_code: u16,
    pub description: String,
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub response: Option<ResponseBody>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn failed(description: &str, url: &str, method: &str, error: String) -> Self {
        Self {
            success: false,
            status_code: 0,
            description: description.to_string(),
            url: url.to_string(),
            method: method.to_string(),
            response: None,
            error: Some(error),
        }
    }

    pub fn json(&self) -> Option<&Value> {
        self.response.as_ref().and_then(ResponseBody::as_json)
    }
}

#[derive(Clone)]
pub struct Prober {
    client: Client,
    default_timeout: Duration,
}

impl Prober {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            default_timeout,
        }
    }

    /// Issues one request and classifies it. Transport failures are captured
    /// in the result, never returned.
    pub async fn request(
        &self,
        url: &str,
        method: HttpMethod,
        payload: Option<&Value>,
        timeout: Option<Duration>,
        description: &str,
    ) -> ProbeResult {
        match self.send(url, method, payload, timeout).await {
            Ok((status, body)) => ProbeResult {
                success: ACCEPTED_STATUSES.contains(&status),
                status_code: status,
                description: description.to_string(),
                url: url.to_string(),
                method: method.to_string(),
                response: Some(ResponseBody::parse(body)),
                error: None,
            },
            Err(e) => {
                tracing::debug!(url, error = %e, "probe failed");
                ProbeResult::failed(description, url, method.as_str(), e)
            }
        }
    }

    /// Sends one request and reads the whole body. The timeout covers the
    /// body as well, so a stalled or reset body is an error like any other.
    async fn send(
        &self,
        url: &str,
        method: HttpMethod,
        payload: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<(u16, String), String> {
        let mut builder = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };
        builder = builder.timeout(timeout.unwrap_or(self.default_timeout));
        if let Some(body) = payload {
            builder = builder.json(body);
        }
        let resp = builder.send().await.map_err(|e| e.to_string())?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| e.to_string())?;
        Ok((status, body))
    }

    /// Status code of a complete exchange; the body is read and dropped.
    pub async fn status(
        &self,
        url: &str,
        method: HttpMethod,
        payload: Option<&Value>,
        timeout: Duration,
    ) -> Result<u16, String> {
        self.send(url, method, payload, Some(timeout))
            .await
            .map(|(status, _)| status)
    }
}

/// Opens and immediately closes a TCP connection to the host and port of `url`.
pub async fn tcp_connect(url: &str, timeout: Duration) -> Result<(), String> {
    let parsed = Url::parse(url).map_err(|e| format!("invalid url {}: {}", url, e))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| format!("no host in {}", url))?;
    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| format!("no port in {}", url))?;

    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            drop(stream);
            Ok(())
        }
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("connect to {}:{} timed out", host, port)),
    }
}
