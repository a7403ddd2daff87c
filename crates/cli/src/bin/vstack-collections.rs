use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vstack_core::config;
use vstack_core::gateway::{DatabaseGateway, DEFAULT_DISTANCE, DEFAULT_MODEL_NAME};

/// Administers Weaviate collections through the database gateway.
/// Connection settings come from the environment (`WEAVIATE_HTTP_HOST`, ...).
#[derive(Parser, Debug)]
#[command(name = "vstack-collections", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List collection names
    List {
        /// Output a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Create a collection with a self-provided named vector
    Create {
        name: String,
        /// Name of the vector; usually the embedding model
        #[arg(long, default_value = DEFAULT_MODEL_NAME)]
        model: String,
        /// "cosine", anything else selects dot product
        #[arg(long, default_value = DEFAULT_DISTANCE)]
        distance: String,
    },
    /// Delete a collection and all of its objects
    Delete { name: String },
    /// Delete the objects of a collection matching a `where` filter
    DeleteObjects {
        name: String,
        /// Filter as JSON, e.g. '{"path":["source"],"operator":"Equal","valueText":"a.txt"}'
        #[arg(long)]
        filter: String,
        /// Really delete; without it the request is a dry run
        #[arg(long)]
        execute: bool,
    },
    /// Embed text and print the vector as JSON
    Vectorize {
        text: String,
        /// Embedding endpoint; defaults to EMBEDDING_URL
        #[arg(long)]
        endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load_gateway()?;
    if let Commands::DeleteObjects { execute: true, .. } = cli.command {
        cfg.delete_dry_run = false;
    }
    let gateway = DatabaseGateway::connect(&cfg);

    match cli.command {
        Commands::List { json } => {
            let Some(names) = gateway.list_collections().await? else {
                bail!("vector database is not ready");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else {
                for name in names {
                    println!("{}", name);
                }
            }
        }
        Commands::Create {
            name,
            model,
            distance,
        } => {
            if !gateway.create_collection(&name, &model, &distance).await? {
                bail!("collection {} was not created", name);
            }
            println!("created {}", name);
        }
        Commands::Delete { name } => {
            if !gateway.delete_collection(&name).await? {
                bail!("collection {} was not deleted", name);
            }
            println!("deleted {}", name);
        }
        Commands::DeleteObjects {
            name,
            filter,
            execute,
        } => {
            let filter: serde_json::Value =
                serde_json::from_str(&filter).context("filter is not valid JSON")?;
            if !gateway.delete_objects_matching(&name, filter).await? {
                bail!("no delete was issued for {}", name);
            }
            if execute {
                println!("deleted matching objects from {}", name);
            } else {
                println!("dry run issued for {}; pass --execute to delete", name);
            }
        }
        Commands::Vectorize { text, endpoint } => {
            let Some(vector) = gateway.vectorize(&text, endpoint.as_deref()).await else {
                bail!("vectorization failed");
            };
            println!("{}", serde_json::to_string(&vector)?);
        }
    }
    Ok(())
}
