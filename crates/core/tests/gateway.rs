use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use providers::ProviderError;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vstack_core::config::GatewayConfig;
use vstack_core::gateway::{DatabaseGateway, GatewayError, DEFAULT_DISTANCE, DEFAULT_MODEL_NAME};
use vstack_core::vectorstore::{CollectionSpec, DeleteSummary, DistanceMetric, VectorDatabase};

#[derive(Default)]
struct FakeState {
    ready: bool,
    unreachable: bool,
    collections: Vec<String>,
    ready_checks: usize,
    created: Vec<CollectionSpec>,
    deleted: Vec<String>,
    delete_many: Vec<(String, Value, bool)>,
    create_status: Option<u16>,
}

#[derive(Clone, Default)]
struct FakeDb(Arc<Mutex<FakeState>>);

impl FakeDb {
    fn ready_with(collections: &[&str]) -> Self {
        let db = FakeDb::default();
        {
            let mut state = db.0.lock().unwrap();
            state.ready = true;
            state.collections = collections.iter().map(|c| c.to_string()).collect();
        }
        db
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.0.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl VectorDatabase for FakeDb {
    async fn is_ready(&self) -> bool {
        let mut state = self.state();
        state.ready_checks += 1;
        state.ready
    }

    async fn list_collections(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.state().collections.clone())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, ProviderError> {
        let state = self.state();
        if state.unreachable {
            return Err(ProviderError::RequestFailed("connection reset".into()));
        }
        Ok(state.collections.iter().any(|c| c == name))
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), ProviderError> {
        let mut state = self.state();
        if let Some(status) = state.create_status {
            return Err(ProviderError::Status {
                status,
                body: format!("class name {} already exists", spec.name),
            });
        }
        state.collections.push(spec.name.clone());
        state.created.push(spec.clone());
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), ProviderError> {
        let mut state = self.state();
        state.collections.retain(|c| c != name);
        state.deleted.push(name.to_string());
        Ok(())
    }

    async fn delete_many(
        &self,
        name: &str,
        filter: Value,
        dry_run: bool,
    ) -> Result<DeleteSummary, ProviderError> {
        self.state()
            .delete_many
            .push((name.to_string(), filter, dry_run));
        Ok(DeleteSummary {
            dry_run,
            matches: 2,
            ..DeleteSummary::default()
        })
    }
}

fn gateway(db: &FakeDb) -> DatabaseGateway<FakeDb> {
    DatabaseGateway::with_database(db.clone(), &GatewayConfig::default())
}

#[tokio::test]
async fn create_raises_when_not_ready() {
    let db = FakeDb::default();
    let result = gateway(&db)
        .create_collection("Docs", DEFAULT_MODEL_NAME, DEFAULT_DISTANCE)
        .await;
    assert!(matches!(result, Err(GatewayError::NotReady)));
    assert!(db.state().created.is_empty());
}

#[tokio::test]
async fn create_guard_checks_literal_name() {
    // Without a collection literally named "collection_name" the guard refuses.
    let db = FakeDb::ready_with(&[]);
    let created = gateway(&db)
        .create_collection("Docs", DEFAULT_MODEL_NAME, DEFAULT_DISTANCE)
        .await
        .unwrap();
    assert!(!created);
    assert!(db.state().created.is_empty());

    // Even when "Docs" itself exists, the literal decides.
    let db = FakeDb::ready_with(&["collection_name", "Docs"]);
    let created = gateway(&db)
        .create_collection("Docs", "bge-m3", "cosine")
        .await
        .unwrap();
    assert!(created);
    assert_eq!(
        db.state().created,
        vec![CollectionSpec {
            name: "Docs".to_string(),
            model_name: "bge-m3".to_string(),
            distance: DistanceMetric::Cosine,
        }]
    );
}

#[tokio::test]
async fn non_cosine_labels_map_to_dot() {
    let db = FakeDb::ready_with(&["collection_name"]);
    let gw = gateway(&db);
    for label in ["dot", "dot-product", "l2", "COSINE"] {
        assert!(gw.create_collection("Docs", DEFAULT_MODEL_NAME, label).await.unwrap());
    }
    assert!(db
        .state()
        .created
        .iter()
        .all(|spec| spec.distance == DistanceMetric::Dot));
}

#[tokio::test]
async fn create_rejected_by_database_maps_to_already_exists() {
    let db = FakeDb::ready_with(&["collection_name", "Docs"]);
    db.state().create_status = Some(422);
    let created = gateway(&db)
        .create_collection("Docs", DEFAULT_MODEL_NAME, DEFAULT_DISTANCE)
        .await
        .unwrap();
    assert!(!created);

    db.state().create_status = Some(500);
    let result = gateway(&db)
        .create_collection("Docs", DEFAULT_MODEL_NAME, DEFAULT_DISTANCE)
        .await;
    assert!(matches!(result, Err(GatewayError::UpstreamUnavailable(_))));
    assert!(db.state().created.is_empty());
}

#[tokio::test]
async fn read_and_delete_paths_return_sentinel_when_not_ready() {
    let db = FakeDb::default();
    let gw = gateway(&db);
    assert_eq!(gw.list_collections().await.unwrap(), None);
    assert!(!gw.delete_collection("Docs").await.unwrap());
    assert!(!gw.delete_objects_matching("Docs", json!({})).await.unwrap());
    assert!(db.state().deleted.is_empty());
    assert!(db.state().delete_many.is_empty());
}

#[tokio::test]
async fn delete_requires_existing_collection() {
    let db = FakeDb::ready_with(&["Docs"]);
    let gw = gateway(&db);

    assert!(!gw.delete_collection("Missing").await.unwrap());
    assert!(gw.delete_collection("Docs").await.unwrap());
    assert_eq!(db.state().deleted, vec!["Docs".to_string()]);
    assert_eq!(gw.list_collections().await.unwrap(), Some(vec![]));
}

#[tokio::test]
async fn delete_objects_is_a_scoped_dry_run_by_default() {
    let db = FakeDb::ready_with(&["Docs"]);
    let filter = json!({ "path": ["source"], "operator": "Equal", "valueText": "a.txt" });
    assert!(gateway(&db)
        .delete_objects_matching("Docs", filter.clone())
        .await
        .unwrap());
    assert_eq!(
        db.state().delete_many,
        vec![("Docs".to_string(), filter, true)]
    );
}

#[tokio::test]
async fn readiness_is_rechecked_for_every_operation() {
    let db = FakeDb::ready_with(&["Docs", "collection_name"]);
    let gw = gateway(&db);
    gw.list_collections().await.unwrap();
    gw.create_collection("Faq", DEFAULT_MODEL_NAME, "dot").await.unwrap();
    gw.delete_objects_matching("Docs", json!({})).await.unwrap();
    gw.delete_collection("Docs").await.unwrap();
    assert_eq!(db.state().ready_checks, 4);
}

#[tokio::test]
async fn transport_failures_propagate() {
    let db = FakeDb::ready_with(&["Docs"]);
    db.state().unreachable = true;
    let result = gateway(&db).delete_collection("Docs").await;
    assert!(matches!(result, Err(GatewayError::UpstreamUnavailable(_))));
}

async fn embedding_stub() -> String {
    let app = Router::new()
        .route(
            "/v1/embeddings",
            post(|Json(body): Json<Value>| async move {
                let input = body["input"].as_str().unwrap_or_default().to_string();
                Json(json!({
                    "data": [{ "embedding": [input.len() as f32, 0.5] }]
                }))
            }),
        )
        .route(
            "/fail",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route("/garbage", post(|| async { "not json" }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn vectorize_returns_first_embedding_or_none() {
    let base = embedding_stub().await;
    let cfg = GatewayConfig {
        embedding_url: Some(format!("{}/v1/embeddings", base)),
        ..GatewayConfig::default()
    };
    let gw = DatabaseGateway::with_database(FakeDb::default(), &cfg);

    assert_eq!(gw.vectorize("test", None).await, Some(vec![4.0, 0.5]));
    assert_eq!(
        gw.vectorize("hello", Some(&format!("{}/v1/embeddings", base)))
            .await,
        Some(vec![5.0, 0.5])
    );
    assert_eq!(gw.vectorize("test", Some(&format!("{}/fail", base))).await, None);
    assert_eq!(gw.vectorize("test", Some(&format!("{}/garbage", base))).await, None);
    assert!(matches!(
        gw.try_vectorize("test", Some(&format!("{}/garbage", base))).await,
        Err(GatewayError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn vectorize_without_endpoint_is_none() {
    let gw = DatabaseGateway::with_database(FakeDb::default(), &GatewayConfig::default());
    assert_eq!(gw.vectorize("test", None).await, None);
    assert_eq!(
        gw.vectorize("test", Some("http://127.0.0.1:9/v1/embeddings")).await,
        None
    );
}

#[tokio::test]
async fn silent_database_does_not_hang_the_gateway() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let cfg = GatewayConfig {
        weaviate_http_host: "127.0.0.1".to_string(),
        weaviate_http_port: port,
        weaviate_timeout_secs: 1,
        ..GatewayConfig::default()
    };
    let gw = DatabaseGateway::connect(&cfg);
    let listed = tokio::time::timeout(Duration::from_secs(10), gw.list_collections())
        .await
        .expect("list_collections must be bounded by the request timeout");
    assert_eq!(listed.unwrap(), None);

    let created = tokio::time::timeout(
        Duration::from_secs(10),
        gw.create_collection("Docs", DEFAULT_MODEL_NAME, DEFAULT_DISTANCE),
    )
    .await
    .expect("create_collection must be bounded by the request timeout");
    assert!(matches!(created, Err(GatewayError::NotReady)));
}
