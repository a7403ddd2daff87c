use providers::weaviate::{ClassDefinition, Distance, WeaviateClient};
use providers::ProviderError;
use std::fmt;

/// Similarity function of a collection's vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    Cosine,
    Dot,
}

impl DistanceMetric {
    /// `"cosine"` selects cosine; every other label selects dot product.
    pub fn from_label(label: &str) -> Self {
        if label == "cosine" {
            DistanceMetric::Cosine
        } else {
            DistanceMetric::Dot
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Cosine => f.write_str("cosine"),
            DistanceMetric::Dot => f.write_str("dot"),
        }
    }
}

impl From<DistanceMetric> for Distance {
    fn from(metric: DistanceMetric) -> Self {
        match metric {
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::Dot => Distance::Dot,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSpec {
    pub name: String,
    /// Name of the self-provided vector; a label only.
    pub model_name: String,
    pub distance: DistanceMetric,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub dry_run: bool,
    pub matches: u64,
    pub successful: u64,
    pub failed: u64,
}

/// The capabilities the gateway needs from a vector database.
#[async_trait::async_trait]
pub trait VectorDatabase: Send + Sync {
    async fn is_ready(&self) -> bool;
    async fn list_collections(&self) -> Result<Vec<String>, ProviderError>;
    async fn collection_exists(&self, name: &str) -> Result<bool, ProviderError>;
    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), ProviderError>;
    async fn delete_collection(&self, name: &str) -> Result<(), ProviderError>;
    async fn delete_many(
        &self,
        name: &str,
        filter: serde_json::Value,
        dry_run: bool,
    ) -> Result<DeleteSummary, ProviderError>;
}

pub struct WeaviateStore {
    client: WeaviateClient,
}

impl WeaviateStore {
    pub fn new(client: WeaviateClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl VectorDatabase for WeaviateStore {
    async fn is_ready(&self) -> bool {
        self.client.is_ready().await
    }

    async fn list_collections(&self) -> Result<Vec<String>, ProviderError> {
        self.client.list_classes().await
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, ProviderError> {
        self.client.class_exists(name).await
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), ProviderError> {
        let class =
            ClassDefinition::self_provided(&spec.name, &spec.model_name, spec.distance.into());
        self.client.create_class(&class).await
    }

    async fn delete_collection(&self, name: &str) -> Result<(), ProviderError> {
        self.client.delete_class(name).await
    }

    async fn delete_many(
        &self,
        name: &str,
        filter: serde_json::Value,
        dry_run: bool,
    ) -> Result<DeleteSummary, ProviderError> {
        let resp = self.client.delete_objects(name, filter, dry_run).await?;
        Ok(DeleteSummary {
            dry_run: resp.dry_run,
            matches: resp.results.matches,
            successful: resp.results.successful,
            failed: resp.results.failed,
        })
    }
}
