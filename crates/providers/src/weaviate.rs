use crate::ProviderError;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct WeaviateConfig {
    pub url: String,
    pub api_key: Option<String>,
    /// Applies to every request, body included.
    pub timeout: Duration,
}

impl WeaviateConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_host(host: &str, port: u16, secure: bool) -> Self {
        let scheme = if secure { "https" } else { "http" };
        Self::new(format!("{}://{}:{}", scheme, host, port))
    }
}

/// Minimal client for the Weaviate REST schema and batch APIs.
#[derive(Clone)]
pub struct WeaviateClient {
    client: Client,
    cfg: WeaviateConfig,
}

impl WeaviateClient {
    pub fn new(cfg: WeaviateConfig) -> Self {
        Self {
            client: Client::new(),
            cfg,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.cfg.url
    }

    fn prepare(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.timeout(self.cfg.timeout);
        match &self.cfg.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// A refused connection reports "not ready" rather than an error.
    pub async fn is_ready(&self) -> bool {
        let url = format!("{}/v1/.well-known/ready", self.cfg.url);
        match self.prepare(self.client.get(url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!("readiness probe failed: {}", e);
                false
            }
        }
    }

    pub async fn list_classes(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/v1/schema", self.cfg.url);
        let resp = self
            .prepare(self.client.get(url))
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let resp = ensure_success(resp).await?;
        let parsed: SchemaResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(parsed.classes.into_iter().map(|c| c.class).collect())
    }

    pub async fn class_exists(&self, name: &str) -> Result<bool, ProviderError> {
        let url = format!("{}/v1/schema/{}", self.cfg.url, name);
        let resp = self
            .prepare(self.client.get(url))
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(resp).await?;
        Ok(true)
    }

    pub async fn create_class(&self, class: &ClassDefinition) -> Result<(), ProviderError> {
        let url = format!("{}/v1/schema", self.cfg.url);
        let resp = self
            .prepare(self.client.post(url).json(class))
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        ensure_success(resp).await?;
        Ok(())
    }

    pub async fn delete_class(&self, name: &str) -> Result<(), ProviderError> {
        let url = format!("{}/v1/schema/{}", self.cfg.url, name);
        let resp = self
            .prepare(self.client.delete(url))
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        ensure_success(resp).await?;
        Ok(())
    }

    pub async fn delete_objects(
        &self,
        class: &str,
        filter: serde_json::Value,
        dry_run: bool,
    ) -> Result<BatchDeleteResponse, ProviderError> {
        let url = format!("{}/v1/batch/objects", self.cfg.url);
        let body = BatchDeleteRequest {
            matcher: BatchMatch {
                class: class.to_string(),
                filter,
            },
            dry_run,
            output: "verbose",
        };
        let resp = self
            .prepare(self.client.delete(url).json(&body))
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let resp = ensure_success(resp).await?;
        resp.json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

async fn ensure_success(resp: Response) -> Result<Response, ProviderError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.bytes().await.unwrap_or(Bytes::from_static(b""));
    Err(ProviderError::Status {
        status: status.as_u16(),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    Cosine,
    Dot,
}

/// Class definition with named, caller-provided vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub class: String,
    #[serde(rename = "vectorConfig")]
    pub vector_config: HashMap<String, NamedVectorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedVectorConfig {
    pub vectorizer: serde_json::Value,
    #[serde(rename = "vectorIndexType")]
    pub vector_index_type: String,
    #[serde(rename = "vectorIndexConfig")]
    pub vector_index_config: VectorIndexConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    pub distance: Distance,
}

impl ClassDefinition {
    /// A single self-provided vector named `vector_name`, indexed with HNSW.
    pub fn self_provided(class: &str, vector_name: &str, distance: Distance) -> Self {
        let mut vector_config = HashMap::new();
        vector_config.insert(
            vector_name.to_string(),
            NamedVectorConfig {
                vectorizer: serde_json::json!({ "none": {} }),
                vector_index_type: "hnsw".to_string(),
                vector_index_config: VectorIndexConfig { distance },
            },
        );
        Self {
            class: class.to_string(),
            vector_config,
        }
    }
}

#[derive(Debug, Serialize)]
struct BatchDeleteRequest {
    #[serde(rename = "match")]
    matcher: BatchMatch,
    #[serde(rename = "dryRun")]
    dry_run: bool,
    output: &'static str,
}

#[derive(Debug, Serialize)]
struct BatchMatch {
    class: String,
    #[serde(rename = "where")]
    filter: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct SchemaResponse {
    #[serde(default)]
    classes: Vec<SchemaClass>,
}

#[derive(Debug, Deserialize)]
struct SchemaClass {
    class: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BatchDeleteResponse {
    #[serde(rename = "dryRun", default)]
    pub dry_run: bool,
    #[serde(default)]
    pub results: BatchDeleteResults,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BatchDeleteResults {
    #[serde(default)]
    pub matches: u64,
    #[serde(default)]
    pub successful: u64,
    #[serde(default)]
    pub failed: u64,
}
