//! Convenience layer over the vector database and the embedding endpoint.
//!
//! Readiness is re-checked at the start of every operation; nothing is cached.
//! Precondition failures surface as a `false`/`None` sentinel, except that
//! [`DatabaseGateway::create_collection`] reports [`GatewayError::NotReady`]
//! as an error. Transport failures of the database always propagate.

use crate::config::GatewayConfig;
use crate::vectorstore::{CollectionSpec, DistanceMetric, VectorDatabase, WeaviateStore};
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::weaviate::{WeaviateClient, WeaviateConfig};
use providers::ProviderError;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

pub const DEFAULT_MODEL_NAME: &str = "Qwen3-Embedding-0.6B";
pub const DEFAULT_DISTANCE: &str = "cosine";

/// Collection name the creation guard looks up.
const EXISTENCE_PROBE_NAME: &str = "collection_name";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("vector database is not ready")]
    NotReady,
    #[error("collection {0} already exists")]
    AlreadyExists(String),
    #[error("collection {0} does not exist")]
    NotFound(String),
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<ProviderError> for GatewayError {
    fn from(err: ProviderError) -> Self {
        if err.is_decode() {
            GatewayError::MalformedResponse(err.to_string())
        } else {
            GatewayError::UpstreamUnavailable(err.to_string())
        }
    }
}

/// Maps precondition failures to the `false` sentinel and lets the rest through.
fn sentinel(err: GatewayError) -> Result<bool, GatewayError> {
    match err {
        GatewayError::NotReady | GatewayError::AlreadyExists(_) | GatewayError::NotFound(_) => {
            error!("{}", err);
            Ok(false)
        }
        other => Err(other),
    }
}

pub struct DatabaseGateway<D = WeaviateStore> {
    db: D,
    embedder: OpenAiProvider,
    delete_dry_run: bool,
}

impl DatabaseGateway<WeaviateStore> {
    /// Builds the Weaviate-backed gateway. No request is made here.
    pub fn connect(cfg: &GatewayConfig) -> Self {
        let mut weaviate = WeaviateConfig::from_host(
            &cfg.weaviate_http_host,
            cfg.weaviate_http_port,
            cfg.weaviate_http_secure,
        );
        weaviate.api_key = cfg.weaviate_api_key.clone();
        weaviate.timeout = Duration::from_secs(cfg.weaviate_timeout_secs);
        info!(
            http = %weaviate.url,
            grpc_host = %cfg.weaviate_grpc_host,
            grpc_port = cfg.weaviate_grpc_port,
            "configured weaviate connection"
        );
        Self::with_database(WeaviateStore::new(WeaviateClient::new(weaviate)), cfg)
    }
}

impl<D: VectorDatabase> DatabaseGateway<D> {
    pub fn with_database(db: D, cfg: &GatewayConfig) -> Self {
        let embedder = OpenAiProvider::new(OpenAiConfig {
            embedding_url: cfg.embedding_url.clone(),
            api_key: None,
            timeout: Duration::from_secs(cfg.vectorize_timeout_secs),
        });
        Self {
            db,
            embedder,
            delete_dry_run: cfg.delete_dry_run,
        }
    }

    async fn ensure_ready(&self) -> Result<(), GatewayError> {
        if self.db.is_ready().await {
            Ok(())
        } else {
            Err(GatewayError::NotReady)
        }
    }

    async fn ensure_exists(&self, name: &str) -> Result<(), GatewayError> {
        if self.db.collection_exists(name).await? {
            Ok(())
        } else {
            Err(GatewayError::NotFound(name.to_string()))
        }
    }

    // FIXME: this guard looks up EXISTENCE_PROBE_NAME, not `name`, so creation is
    // refused whenever no collection literally called "collection_name" exists.
    // Kept as deployed until the intended check (reject when `name` exists) is
    // confirmed with the callers.
    async fn ensure_creatable(&self, name: &str) -> Result<(), GatewayError> {
        if self.db.collection_exists(EXISTENCE_PROBE_NAME).await? {
            Ok(())
        } else {
            Err(GatewayError::AlreadyExists(name.to_string()))
        }
    }

    /// Embeds `text` via `endpoint`, or the configured embedding URL.
    /// Any failure is logged and yields `None`.
    pub async fn vectorize(&self, text: &str, endpoint: Option<&str>) -> Option<Vec<f32>> {
        match self.try_vectorize(text, endpoint).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!("vectorization failed: {}", e);
                None
            }
        }
    }

    pub async fn try_vectorize(
        &self,
        text: &str,
        endpoint: Option<&str>,
    ) -> Result<Vec<f32>, GatewayError> {
        let url = match endpoint {
            Some(url) => url.to_string(),
            None => {
                let url = self.embedder.embedding_url().ok_or_else(|| {
                    GatewayError::UpstreamUnavailable("no embedding endpoint configured".into())
                })?;
                info!("Using default embed_url: {}", url);
                url.to_string()
            }
        };
        Ok(self.embedder.embed_at(&url, text).await?)
    }

    /// Collection names, or `None` when the database is not ready.
    pub async fn list_collections(&self) -> Result<Option<Vec<String>>, GatewayError> {
        if let Err(e) = self.ensure_ready().await {
            error!("{}", e);
            return Ok(None);
        }
        Ok(Some(self.db.list_collections().await?))
    }

    /// Creates a collection with a self-provided HNSW-indexed vector named
    /// after `model_name`. `distance_metric` other than `"cosine"` means dot.
    pub async fn create_collection(
        &self,
        name: &str,
        model_name: &str,
        distance_metric: &str,
    ) -> Result<bool, GatewayError> {
        if let Err(e) = self.ensure_ready().await {
            error!("{}", e);
            return Err(e);
        }
        if let Err(e) = self.ensure_creatable(name).await {
            return sentinel(e);
        }

        let spec = CollectionSpec {
            name: name.to_string(),
            model_name: model_name.to_string(),
            distance: DistanceMetric::from_label(distance_metric),
        };
        if let Err(e) = self.db.create_collection(&spec).await {
            return match e {
                ProviderError::Status { status: 422, .. } => {
                    sentinel(GatewayError::AlreadyExists(name.to_string()))
                }
                other => Err(other.into()),
            };
        }
        info!(
            collection = name,
            distance = %spec.distance,
            model = model_name,
            "collection created"
        );
        Ok(true)
    }

    pub async fn delete_collection(&self, name: &str) -> Result<bool, GatewayError> {
        if let Err(e) = self.check_target(name).await {
            return sentinel(e);
        }
        self.db.delete_collection(name).await?;
        info!(collection = name, "collection deleted");
        Ok(true)
    }

    /// Batch-deletes the objects of `name` matching the `where` filter.
    /// Runs as a dry run unless `delete_dry_run` is disabled.
    pub async fn delete_objects_matching(
        &self,
        name: &str,
        filter: serde_json::Value,
    ) -> Result<bool, GatewayError> {
        if let Err(e) = self.check_target(name).await {
            return sentinel(e);
        }
        let summary = self.db.delete_many(name, filter, self.delete_dry_run).await?;
        info!(
            collection = name,
            dry_run = summary.dry_run,
            matches = summary.matches,
            successful = summary.successful,
            failed = summary.failed,
            "delete-many issued"
        );
        Ok(true)
    }

    async fn check_target(&self, name: &str) -> Result<(), GatewayError> {
        self.ensure_ready().await?;
        self.ensure_exists(name).await
    }
}
