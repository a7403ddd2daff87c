//! The endpoint tester: connectivity, per-service probes, optional benchmark,
//! report. Every probe is awaited before the next one starts.

use crate::benchmark::{self, BenchmarkReport};
use crate::config::{ServiceEndpoint, TesterConfig};
use crate::probe::{self, HttpMethod, Prober, ProbeResult};
use crate::report::{Report, Tally};
use crate::suites::{self, ConnectivityKind, ProbeSpec};
use serde_json::Value;
use std::io::{self, Write};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub results: Vec<ProbeResult>,
    pub benchmark: Option<BenchmarkReport>,
    pub overall: Tally,
}

impl RunSummary {
    /// 0 when every probe passed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.results.iter().all(|r| r.success) {
            0
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suite {
    Server,
    Embedding,
    Database,
}

pub struct EndpointTester<W: Write> {
    config: TesterConfig,
    prober: Prober,
    verbose: bool,
    out: W,
}

impl<W: Write> EndpointTester<W> {
    pub fn new(config: TesterConfig, verbose: bool, out: W) -> Self {
        let prober = Prober::new(Duration::from_secs(config.timeouts.probe_secs));
        Self {
            config,
            prober,
            verbose,
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn log(&mut self, message: &str) -> io::Result<()> {
        let timestamp = chrono::Local::now().format("%H:%M:%S");
        writeln!(self.out, "[{}] INFO: {}", timestamp, message)
    }

    pub async fn run_all(&mut self, quick: bool) -> anyhow::Result<RunSummary> {
        let start = Instant::now();
        writeln!(self.out, "🚀 Starting Comprehensive vLLM Endpoint Testing")?;
        writeln!(self.out, "{}", "=".repeat(60))?;

        let mut results = Vec::new();
        results.extend(self.test_connectivity().await?);
        results.extend(self.test_server(quick).await?);
        results.extend(self.test_embedding(quick).await?);
        results.extend(self.test_database(quick).await?);

        let benchmark = if quick {
            None
        } else {
            Some(self.run_benchmark().await?)
        };

        let report = Report {
            results: &results,
            benchmark: benchmark.as_ref(),
            services: &self.config.services,
            verbose: self.verbose,
        };
        report.write_to(&mut self.out)?;
        let overall = report.overall();

        writeln!(
            self.out,
            "\n⏱️  Total execution time: {:.2} seconds",
            start.elapsed().as_secs_f64()
        )?;
        tracing::info!(
            passed = overall.passed,
            total = overall.total,
            "endpoint test run finished"
        );

        Ok(RunSummary {
            results,
            benchmark,
            overall,
        })
    }

    pub async fn test_connectivity(&mut self) -> io::Result<Vec<ProbeResult>> {
        self.log("Testing service connectivity...")?;
        let targets = self.config.connectivity.clone();
        let http_timeout = Duration::from_secs(self.config.timeouts.connectivity_secs);
        let tcp_timeout = Duration::from_secs(self.config.timeouts.tcp_secs);

        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            let description = target.description();
            let (method, outcome) = match target.kind {
                ConnectivityKind::Tcp => (
                    "TCP",
                    probe::tcp_connect(&target.url, tcp_timeout)
                        .await
                        .map(|_| 200),
                ),
                ConnectivityKind::Http => (
                    "GET",
                    self.prober
                        .status(&target.url, HttpMethod::Get, None, http_timeout)
                        .await,
                ),
            };

            let result = match outcome {
                Ok(status) => {
                    let success = status == 200;
                    self.log(&format!(
                        "  {} {}: {}",
                        mark(success),
                        target.name,
                        if success { "Online" } else { "Offline" }
                    ))?;
                    ProbeResult {
                        success,
                        status_code: status,
                        description,
                        url: target.url.clone(),
                        method: method.to_string(),
                        response: None,
                        error: None,
                    }
                }
                Err(e) => {
                    let short: String = e.chars().take(50).collect();
                    self.log(&format!("  ❌ {}: Offline ({})", target.name, short))?;
                    ProbeResult::failed(&description, &target.url, method, e)
                }
            };
            results.push(result);
        }
        Ok(results)
    }

    pub async fn test_server(&mut self, quick: bool) -> io::Result<Vec<ProbeResult>> {
        self.log("Testing vLLM Server endpoints...")?;
        let service = self.config.services.server.clone();
        let specs = self.config.probes.server.clone();
        self.run_suite(Suite::Server, &service, &specs, quick).await
    }

    pub async fn test_embedding(&mut self, quick: bool) -> io::Result<Vec<ProbeResult>> {
        self.log("Testing vLLM Embedding endpoints...")?;
        let service = self.config.services.embedding.clone();
        let specs = self.config.probes.embedding.clone();
        self.run_suite(Suite::Embedding, &service, &specs, quick).await
    }

    pub async fn test_database(&mut self, quick: bool) -> io::Result<Vec<ProbeResult>> {
        self.log("Testing Weaviate endpoints...")?;
        let service = self.config.services.database.clone();
        let specs = self.config.probes.database.clone();
        self.run_suite(Suite::Database, &service, &specs, quick).await
    }

    async fn run_suite(
        &mut self,
        suite: Suite,
        service: &ServiceEndpoint,
        specs: &[ProbeSpec],
        quick: bool,
    ) -> io::Result<Vec<ProbeResult>> {
        let mut results = Vec::new();
        for spec in suites::select(specs, quick) {
            let url = spec.url(service);
            let body = spec.body(service);
            let result = self
                .prober
                .request(&url, spec.method, body.as_ref(), None, &spec.label)
                .await;
            self.log(&format!(
                "  {} {}: {}",
                mark(result.success),
                spec.label,
                result.status_code
            ))?;

            if self.verbose && result.success {
                if let Some(detail) = result.json().and_then(|v| detail_line(suite, &result, v)) {
                    self.log(&format!("    {}", detail))?;
                }
            }
            results.push(result);
        }
        Ok(results)
    }

    pub async fn run_benchmark(&mut self) -> io::Result<BenchmarkReport> {
        self.log("Running performance benchmark...")?;
        let timeout = Duration::from_secs(self.config.timeouts.benchmark_secs);
        let report = benchmark::run(&self.prober, &self.config.services.embedding, timeout).await;
        for (name, sample) in report.samples() {
            if sample.success {
                self.log(&format!(
                    "  ✅ {}: {:.2}s, {:.1} docs/s",
                    name, sample.elapsed, sample.throughput
                ))?;
            } else {
                self.log(&format!("  ❌ {} benchmark failed", name))?;
            }
        }
        Ok(report)
    }
}

fn mark(success: bool) -> &'static str {
    if success {
        "✅"
    } else {
        "❌"
    }
}

/// Extra line printed in verbose mode for a successful probe, if the response
/// carries something worth showing.
fn detail_line(suite: Suite, result: &ProbeResult, body: &Value) -> Option<String> {
    let label = result.description.to_lowercase();
    match suite {
        Suite::Server => {
            if !label.contains("completion") {
                return None;
            }
            let first = body.get("choices")?.as_array()?.first()?;
            let content = first
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .or_else(|| first.get("text").and_then(Value::as_str))
                .unwrap_or("");
            let head: String = content.chars().take(100).collect();
            Some(format!("Response: {}...", head))
        }
        Suite::Embedding => {
            if label.contains("embedding") {
                let data = body.get("data")?.as_array()?;
                let dimension = data
                    .first()
                    .and_then(|d| d.get("embedding"))
                    .and_then(Value::as_array)
                    .map(|e| e.len())
                    .unwrap_or(0);
                Some(format!("Embedding dimension: {}", dimension))
            } else if label.contains("rerank") {
                let ranked = body.get("results")?.as_array()?;
                let top = ranked
                    .first()
                    .and_then(|r| r.get("relevance_score"))
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                Some(format!(
                    "Ranked {} documents, top score: {:.4}",
                    ranked.len(),
                    top
                ))
            } else {
                None
            }
        }
        Suite::Database => {
            if result.url.contains("meta") {
                let version = body
                    .get("version")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown");
                let modules: Vec<String> = body
                    .get("modules")
                    .and_then(Value::as_object)
                    .map(|m| m.keys().map(|k| format!("'{}'", k)).collect())
                    .unwrap_or_default();
                Some(format!(
                    "Version: {}, Modules: [{}]",
                    version,
                    modules.join(", ")
                ))
            } else if result.url.contains("schema") {
                let classes = body
                    .get("classes")
                    .and_then(Value::as_array)
                    .map(|c| c.len())
                    .unwrap_or(0);
                Some(format!("Classes: {}", classes))
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(description: &str, url: &str) -> ProbeResult {
        ProbeResult {
            success: true,
            status_code: 200,
            description: description.to_string(),
            url: url.to_string(),
            method: "GET".to_string(),
            response: None,
            error: None,
        }
    }

    #[test]
    fn database_meta_detail_lists_modules() {
        let meta = ok("Health Check", "http://db/v1/meta");
        let line = detail_line(
            Suite::Database,
            &meta,
            &json!({ "version": "1.24.0", "modules": {} }),
        );
        assert_eq!(line.as_deref(), Some("Version: 1.24.0, Modules: []"));

        let line = detail_line(
            Suite::Database,
            &meta,
            &json!({ "modules": { "text2vec-openai": {} } }),
        );
        assert_eq!(
            line.as_deref(),
            Some("Version: Unknown, Modules: ['text2vec-openai']")
        );
    }

    #[test]
    fn completion_detail_prefers_message_content() {
        let chat = ok("Chat Completion", "http://llm/v1/chat/completions");
        let body = json!({ "choices": [{ "message": { "content": "4" } }] });
        assert_eq!(
            detail_line(Suite::Server, &chat, &body).as_deref(),
            Some("Response: 4...")
        );

        let text = ok("Text Completion", "http://llm/v1/completions");
        let body = json!({ "choices": [{ "text": " Paris" }] });
        assert_eq!(
            detail_line(Suite::Server, &text, &body).as_deref(),
            Some("Response:  Paris...")
        );

        let health = ok("Health Check", "http://llm/health");
        assert_eq!(detail_line(Suite::Server, &health, &body), None);
    }

    #[test]
    fn rerank_detail_reports_top_score() {
        let rerank = ok("Rerank Documents", "http://emb/v1/rerank");
        let body = json!({ "results": [{ "relevance_score": 0.5 }, { "relevance_score": 0.25 }] });
        assert_eq!(
            detail_line(Suite::Embedding, &rerank, &body).as_deref(),
            Some("Ranked 2 documents, top score: 0.5000")
        );
    }
}
