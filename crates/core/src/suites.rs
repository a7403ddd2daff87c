//! Static probe tables for each service group.

use crate::config::ServiceEndpoint;
use crate::probe::HttpMethod;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One HTTP probe, relative to a service base URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSpec {
    pub label: String,
    pub method: HttpMethod,
    pub path: String,
    #[serde(default)]
    pub payload: Option<Value>,
    /// Insert the service model name into the payload as `"model"`.
    #[serde(default)]
    pub with_model: bool,
    /// Part of the cheap health battery run by `--quick`.
    #[serde(default)]
    pub quick: bool,
}

impl ProbeSpec {
    fn get(label: &str, path: &str) -> Self {
        Self {
            label: label.to_string(),
            method: HttpMethod::Get,
            path: path.to_string(),
            payload: None,
            with_model: false,
            quick: false,
        }
    }

    fn post(label: &str, path: &str, payload: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            payload: Some(payload),
            ..Self::get(label, path)
        }
    }

    fn model_scoped(mut self) -> Self {
        self.with_model = true;
        self
    }

    fn quick(mut self) -> Self {
        self.quick = true;
        self
    }

    pub fn url(&self, service: &ServiceEndpoint) -> String {
        format!("{}{}", service.base_url.trim_end_matches('/'), self.path)
    }

    /// Request body with the model name filled in when requested.
    pub fn body(&self, service: &ServiceEndpoint) -> Option<Value> {
        let mut payload = self.payload.clone()?;
        if self.with_model {
            if let (Some(obj), Some(model)) = (payload.as_object_mut(), &service.model) {
                obj.insert("model".to_string(), Value::String(model.clone()));
            }
        }
        Some(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbePlan {
    pub server: Vec<ProbeSpec>,
    pub embedding: Vec<ProbeSpec>,
    pub database: Vec<ProbeSpec>,
}

/// Probes to run for one group; quick mode keeps only the `quick` entries.
pub fn select(specs: &[ProbeSpec], quick: bool) -> Vec<&ProbeSpec> {
    specs.iter().filter(|s| !quick || s.quick).collect()
}

pub fn default_plan() -> ProbePlan {
    ProbePlan {
        server: server_probes(),
        embedding: embedding_probes(),
        database: database_probes(),
    }
}

fn server_probes() -> Vec<ProbeSpec> {
    vec![
        ProbeSpec::get("Health Check", "/health").quick(),
        ProbeSpec::get("Version Info", "/version").quick(),
        ProbeSpec::get("Models List", "/v1/models").quick(),
        ProbeSpec::get("Ping (GET)", "/ping"),
        ProbeSpec::post("Ping (POST)", "/ping", json!({})),
        ProbeSpec::get("Metrics", "/metrics"),
        ProbeSpec::post(
            "Chat Completion",
            "/v1/chat/completions",
            json!({
                "messages": [{ "role": "user", "content": "What is 2+2?" }],
                "max_tokens": 50,
                "temperature": 0.1
            }),
        )
        .model_scoped(),
        ProbeSpec::post(
            "Text Completion",
            "/v1/completions",
            json!({
                "prompt": "The capital of France is",
                "max_tokens": 20,
                "temperature": 0.1
            }),
        )
        .model_scoped(),
        ProbeSpec::post(
            "Tokenization",
            "/tokenize",
            json!({ "text": "Hello world, this is a test." }),
        )
        .model_scoped(),
    ]
}

fn embedding_probes() -> Vec<ProbeSpec> {
    vec![
        ProbeSpec::get("Health Check", "/health").quick(),
        ProbeSpec::get("Models List", "/v1/models").quick(),
        ProbeSpec::post(
            "Text Embeddings",
            "/v1/embeddings",
            json!({ "input": "This is a test sentence for embedding generation." }),
        )
        .model_scoped()
        .quick(),
        ProbeSpec::get("Ping (GET)", "/ping"),
        ProbeSpec::post("Ping (POST)", "/ping", json!({})),
        ProbeSpec::get("Version Info", "/version"),
        ProbeSpec::get("Metrics", "/metrics"),
        ProbeSpec::post(
            "Rerank Documents",
            "/v1/rerank",
            json!({
                "query": "What is machine learning?",
                "documents": [
                    "Machine learning is a subset of artificial intelligence.",
                    "Python is a programming language.",
                    "Machine learning algorithms learn from data.",
                    "The weather is nice today."
                ]
            }),
        )
        .model_scoped(),
        ProbeSpec::post(
            "Rerank (Base Endpoint)",
            "/rerank",
            json!({
                "query": "artificial intelligence",
                "documents": [
                    "AI is transforming industries",
                    "Weather forecast for tomorrow",
                    "Machine learning algorithms"
                ]
            }),
        )
        .model_scoped(),
    ]
}

fn database_probes() -> Vec<ProbeSpec> {
    vec![
        ProbeSpec::get("Health Check", "/v1/meta").quick(),
        ProbeSpec::get("Schema Info", "/v1/schema").quick(),
        ProbeSpec::get("Ready Check", "/v1/.well-known/ready"),
        ProbeSpec::get("Live Check", "/v1/.well-known/live"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityKind {
    Http,
    /// Plain connect-and-close, for services without an HTTP surface.
    Tcp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityTarget {
    pub name: String,
    pub url: String,
    pub kind: ConnectivityKind,
}

impl ConnectivityTarget {
    pub fn http(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            kind: ConnectivityKind::Http,
        }
    }

    pub fn tcp(name: &str, url: &str) -> Self {
        Self {
            kind: ConnectivityKind::Tcp,
            ..Self::http(name, url)
        }
    }

    pub fn description(&self) -> String {
        format!("{} Connectivity", self.name)
    }
}

pub fn default_connectivity() -> Vec<ConnectivityTarget> {
    vec![
        ConnectivityTarget::http("vLLM Server", "http://localhost:3310/health"),
        ConnectivityTarget::http("vLLM Embedding", "http://localhost:3390/health"),
        ConnectivityTarget::http("Weaviate", "http://localhost:3340/v1/meta"),
        ConnectivityTarget::http("GUI", "http://localhost:3320"),
        ConnectivityTarget::tcp("Redis", "http://localhost:3330"),
        ConnectivityTarget::http("Customer Service", "http://localhost:3333"),
    ]
}
