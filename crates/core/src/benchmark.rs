//! Embedding and rerank throughput micro-benchmarks.

use crate::config::ServiceEndpoint;
use crate::probe::{HttpMethod, Prober};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

pub const EMBEDDING_BATCH: usize = 10;
pub const RERANK_BATCH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSample {
    pub success: bool,
    /// Wall-clock seconds; 0 when the request never completed.
    pub elapsed: f64,
    /// Items per second; 0 on failure.
    pub throughput: f64,
}

impl BenchmarkSample {
    pub fn new(success: bool, elapsed: f64, items: usize) -> Self {
        let throughput = if success && elapsed > 0.0 {
            items as f64 / elapsed
        } else {
            0.0
        };
        Self {
            success,
            elapsed,
            throughput,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub embedding: BenchmarkSample,
    pub rerank: BenchmarkSample,
}

impl BenchmarkReport {
    pub fn samples(&self) -> [(&'static str, &BenchmarkSample); 2] {
        [("Embedding", &self.embedding), ("Rerank", &self.rerank)]
    }
}

pub fn embedding_payload(model: Option<&str>) -> Value {
    let inputs: Vec<String> = (0..EMBEDDING_BATCH)
        .map(|i| format!("Test sentence {}", i))
        .collect();
    with_model(json!({ "input": inputs }), model)
}

pub fn rerank_payload(model: Option<&str>) -> Value {
    let documents: Vec<String> = (0..RERANK_BATCH)
        .map(|i| format!("Document {}: This is about ML topic {}", i, i))
        .collect();
    with_model(
        json!({ "query": "machine learning algorithms", "documents": documents }),
        model,
    )
}

fn with_model(mut payload: Value, model: Option<&str>) -> Value {
    if let (Some(obj), Some(m)) = (payload.as_object_mut(), model) {
        obj.insert("model".to_string(), Value::String(m.to_string()));
    }
    payload
}

/// Runs both benchmarks, one request each, strictly one after the other.
pub async fn run(prober: &Prober, service: &ServiceEndpoint, timeout: Duration) -> BenchmarkReport {
    let base = service.base_url.trim_end_matches('/');
    let model = service.model.as_deref();

    let embedding = timed(
        prober,
        &format!("{}/v1/embeddings", base),
        &embedding_payload(model),
        timeout,
        EMBEDDING_BATCH,
    )
    .await;
    let rerank = timed(
        prober,
        &format!("{}/v1/rerank", base),
        &rerank_payload(model),
        timeout,
        RERANK_BATCH,
    )
    .await;

    BenchmarkReport { embedding, rerank }
}

async fn timed(
    prober: &Prober,
    url: &str,
    payload: &Value,
    timeout: Duration,
    items: usize,
) -> BenchmarkSample {
    let start = Instant::now();
    match prober
        .status(url, HttpMethod::Post, Some(payload), timeout)
        .await
    {
        Ok(status) => BenchmarkSample::new(status == 200, start.elapsed().as_secs_f64(), items),
        Err(e) => {
            tracing::debug!(url, error = %e, "benchmark request failed");
            BenchmarkSample::new(false, 0.0, items)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput_is_zero_on_failure_or_zero_time() {
        assert_eq!(BenchmarkSample::new(true, 2.0, 10).throughput, 5.0);
        assert_eq!(BenchmarkSample::new(true, 0.0, 10).throughput, 0.0);
        assert_eq!(BenchmarkSample::new(false, 2.0, 10).throughput, 0.0);
    }

    #[test]
    fn payloads_carry_expected_batches() {
        let embed = embedding_payload(Some("m"));
        assert_eq!(embed["model"], "m");
        assert_eq!(embed["input"].as_array().unwrap().len(), EMBEDDING_BATCH);
        assert_eq!(embed["input"][3], "Test sentence 3");

        let rerank = rerank_payload(None);
        assert!(rerank.get("model").is_none());
        assert_eq!(rerank["documents"].as_array().unwrap().len(), RERANK_BATCH);
        assert_eq!(rerank["documents"][19], "Document 19: This is about ML topic 19");
    }
}
