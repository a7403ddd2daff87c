use crate::suites::{self, ConnectivityTarget, ProbePlan};
use serde::{Deserialize, Serialize};

/// Settings for the database gateway, read from the process environment
/// (`EMBEDDING_URL`, `WEAVIATE_HTTP_HOST`, `WEAVIATE_HTTP_PORT`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub embedding_url: Option<String>,
    #[serde(default = "default_host")]
    pub weaviate_http_host: String,
    #[serde(default = "default_http_port")]
    pub weaviate_http_port: u16,
    #[serde(default)]
    pub weaviate_http_secure: bool,
    /// Carried for parity with gRPC-capable clients; the REST client ignores it.
    #[serde(default = "default_host")]
    pub weaviate_grpc_host: String,
    #[serde(default = "default_grpc_port")]
    pub weaviate_grpc_port: u16,
    #[serde(default)]
    pub weaviate_api_key: Option<String>,
    #[serde(default = "default_true")]
    pub delete_dry_run: bool,
    #[serde(default = "default_vectorize_timeout")]
    pub vectorize_timeout_secs: u64,
    #[serde(default = "default_weaviate_timeout")]
    pub weaviate_timeout_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_grpc_port() -> u16 {
    50051
}

fn default_true() -> bool {
    true
}

fn default_vectorize_timeout() -> u64 {
    10
}

fn default_weaviate_timeout() -> u64 {
    30
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            embedding_url: None,
            weaviate_http_host: default_host(),
            weaviate_http_port: default_http_port(),
            weaviate_http_secure: false,
            weaviate_grpc_host: default_host(),
            weaviate_grpc_port: default_grpc_port(),
            weaviate_api_key: None,
            delete_dry_run: true,
            vectorize_timeout_secs: default_vectorize_timeout(),
            weaviate_timeout_secs: default_weaviate_timeout(),
        }
    }
}

pub fn load_gateway() -> anyhow::Result<GatewayConfig> {
    load_gateway_from(config::Environment::default())
}

pub fn load_gateway_from(env: config::Environment) -> anyhow::Result<GatewayConfig> {
    let cfg = config::Config::builder()
        .add_source(env.try_parsing(true))
        .build()?;
    Ok(cfg.try_deserialize()?)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub base_url: String,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Services {
    pub server: ServiceEndpoint,
    pub embedding: ServiceEndpoint,
    pub database: ServiceEndpoint,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            server: ServiceEndpoint {
                base_url: "http://localhost:3310".to_string(),
                model: Some("Qwen/Qwen3-1.7B".to_string()),
            },
            embedding: ServiceEndpoint {
                base_url: "http://localhost:3390".to_string(),
                model: Some("Qwen/Qwen3-Embedding-0.6B".to_string()),
            },
            database: ServiceEndpoint {
                base_url: "http://localhost:3340".to_string(),
                model: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeouts {
    pub probe_secs: u64,
    pub connectivity_secs: u64,
    pub tcp_secs: u64,
    pub benchmark_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe_secs: 30,
            connectivity_secs: 10,
            tcp_secs: 5,
            benchmark_secs: 60,
        }
    }
}

/// Everything the endpoint tester probes. Defaults match the local
/// docker-compose deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TesterConfig {
    pub services: Services,
    pub probes: ProbePlan,
    pub connectivity: Vec<ConnectivityTarget>,
    pub timeouts: Timeouts,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            services: Services::default(),
            probes: suites::default_plan(),
            connectivity: suites::default_connectivity(),
            timeouts: Timeouts::default(),
        }
    }
}

/// Loads tester settings: built-in defaults, then the optional file at `path`
/// (or `config/endpoints`), then `ENDPOINT_TESTER__*` environment overrides.
pub fn load_tester(path: Option<&str>) -> anyhow::Result<TesterConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/endpoints").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("ENDPOINT_TESTER")
            .separator("__")
            .try_parsing(true),
    );
    let overrides: serde_json::Value = settings.build()?.try_deserialize()?;

    let mut merged = serde_json::to_value(TesterConfig::default())?;
    merge_json(&mut merged, overrides);
    Ok(serde_json::from_value(merged)?)
}

/// Objects merge key by key; any other value replaces the target wholesale.
fn merge_json(target: &mut serde_json::Value, overrides: serde_json::Value) {
    match (target, overrides) {
        (serde_json::Value::Object(base), serde_json::Value::Object(over)) => {
            for (key, value) in over {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
