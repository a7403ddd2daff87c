use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vstack_core::config;
use vstack_core::tester::EndpointTester;

/// Smoke-tests the vLLM server, the embedding service, Weaviate and the
/// surrounding containers, then prints a pass/fail report.
#[derive(Parser, Debug)]
#[command(name = "endpoint-tester", version)]
struct Cli {
    /// Run only the basic health checks
    #[arg(long)]
    quick: bool,
    /// Show response details for passing probes
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = tokio::select! {
        outcome = run(&cli) => match outcome {
            Ok(code) => code,
            Err(e) => {
                println!("\n\n❌ Testing failed with error: {}", e);
                1
            }
        },
        Ok(()) = tokio::signal::ctrl_c() => {
            println!("\n\n⏹️  Testing interrupted by user.");
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: &Cli) -> Result<i32> {
    let path = std::env::var("ENDPOINT_TESTER_CONFIG").ok();
    let cfg = config::load_tester(path.as_deref())?;
    tracing::debug!(?path, quick = cli.quick, "loaded endpoint configuration");

    let mut tester = EndpointTester::new(cfg, cli.verbose, std::io::stdout());
    let summary = tester.run_all(cli.quick).await?;
    Ok(summary.exit_code())
}
