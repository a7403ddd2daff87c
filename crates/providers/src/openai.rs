use crate::ProviderError;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// Full URL of the embeddings route, e.g. `http://localhost:3390/v1/embeddings`.
    pub embedding_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            embedding_url: None,
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Client for an OpenAI-compatible `/v1/embeddings` route (vLLM, LM Studio, ...).
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    cfg: Arc<OpenAiConfig>,
}

impl OpenAiProvider {
    pub fn new(cfg: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            cfg: Arc::new(cfg),
        }
    }

    pub fn embedding_url(&self) -> Option<&str> {
        self.cfg.embedding_url.as_deref()
    }

    /// Embeds a single input against `url` and returns `data[0].embedding`.
    ///
    /// Only a 200 answer is accepted; other 2xx codes count as failures too.
    pub async fn embed_at(&self, url: &str, input: &str) -> Result<Vec<f32>, ProviderError> {
        #[derive(serde::Serialize)]
        struct EmbedRequest<'a> {
            input: &'a str,
        }

        let mut builder = self
            .client
            .post(url)
            .timeout(self.cfg.timeout)
            .json(&EmbedRequest { input });
        if let Some(key) = &self.cfg.api_key {
            builder = builder.bearer_auth(key);
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingApiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ProviderError::Decode("response carried no embeddings".into()))
    }

    /// Same as [`embed_at`](Self::embed_at) using the configured URL.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, ProviderError> {
        let url = self
            .embedding_url()
            .ok_or_else(|| ProviderError::RequestFailed("no embedding url configured".into()))?
            .to_string();
        self.embed_at(&url, input).await
    }
}

#[derive(Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
