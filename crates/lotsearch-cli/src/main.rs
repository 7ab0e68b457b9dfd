//! Lotsearch binary: loads configuration, wires the retrieval adapters,
//! and serves the HTTP gateway.

use clap::{Parser, Subcommand};
use lotsearch_gateway::SearchGateway;
use lotsearch_retrieval::{
    Embedder, GeminiEmbedder, InMemoryVectorIndex, LocalEmbedding, QdrantSearcher,
    SearchOrchestrator, SqliteDocumentStore, VectorSearcher,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lotsearch", about = "Lotsearch — dual-mode catalog search service")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "lotsearch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the search gateway
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Deserialize)]
struct LotsearchConfig {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    store: StoreConfig,
    #[serde(default)]
    embedding: EmbeddingConfig,
    #[serde(default)]
    vector: VectorConfig,
    #[serde(default)]
    search: SearchConfig,
}

#[derive(Deserialize)]
struct ServerConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Deserialize)]
struct StoreConfig {
    #[serde(default = "default_store_path")]
    path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Which embedding provider to use.
#[derive(Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum EmbeddingProvider {
    Gemini,
    Local,
}

#[derive(Deserialize)]
struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    provider: EmbeddingProvider,
    #[serde(default = "default_embedding_model")]
    model: String,
    /// Must match the dimension the vector collection was created with.
    #[serde(default = "default_dimension")]
    dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimension: default_dimension(),
        }
    }
}

/// Which vector index backend to use.
#[derive(Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum VectorBackend {
    Qdrant,
    Memory,
}

#[derive(Deserialize)]
struct VectorConfig {
    #[serde(default = "default_vector_backend")]
    backend: VectorBackend,
    #[serde(default = "default_vector_url")]
    url: String,
    #[serde(default = "default_collection")]
    collection: String,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            backend: default_vector_backend(),
            url: default_vector_url(),
            collection: default_collection(),
        }
    }
}

#[derive(Deserialize)]
struct SearchConfig {
    #[serde(default = "default_limit")]
    default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_store_path() -> PathBuf {
    PathBuf::from("./data/catalog.db")
}
fn default_embedding_provider() -> EmbeddingProvider {
    EmbeddingProvider::Gemini
}
fn default_embedding_model() -> String {
    lotsearch_retrieval::backends::gemini::DEFAULT_MODEL.to_string()
}
fn default_dimension() -> usize {
    lotsearch_retrieval::backends::gemini::DEFAULT_DIMENSION
}
fn default_vector_backend() -> VectorBackend {
    VectorBackend::Qdrant
}
fn default_vector_url() -> String {
    lotsearch_retrieval::backends::qdrant::DEFAULT_URL.to_string()
}
fn default_collection() -> String {
    lotsearch_retrieval::backends::qdrant::DEFAULT_COLLECTION.to_string()
}
fn default_limit() -> usize {
    lotsearch_retrieval::DEFAULT_LIMIT
}

fn build_embedder(config: &EmbeddingConfig) -> anyhow::Result<Arc<dyn Embedder>> {
    match config.provider {
        EmbeddingProvider::Gemini => {
            let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
                anyhow::anyhow!(
                    "embedding provider 'gemini' requires the GEMINI_API_KEY environment variable"
                )
            })?;
            Ok(Arc::new(
                GeminiEmbedder::new(api_key).with_model(config.model.clone(), config.dimension),
            ))
        }
        EmbeddingProvider::Local => Ok(Arc::new(LocalEmbedding::new(config.dimension))),
    }
}

fn build_vector_searcher(config: &VectorConfig) -> Arc<dyn VectorSearcher> {
    match config.backend {
        VectorBackend::Qdrant => Arc::new(QdrantSearcher::new(
            config.url.clone(),
            config.collection.clone(),
        )),
        VectorBackend::Memory => {
            warn!("in-memory vector index selected: it starts empty and is intended for tests and development");
            Arc::new(InMemoryVectorIndex::new())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let config: LotsearchConfig = if cli.config.exists() {
        let config_str = tokio::fs::read_to_string(&cli.config).await.map_err(|e| {
            anyhow::anyhow!(
                "Failed to read config file '{}': {}",
                cli.config.display(),
                e
            )
        })?;
        toml::from_str(&config_str)?
    } else {
        info!(
            path = %cli.config.display(),
            "config file not found, using defaults"
        );
        toml::from_str("")?
    };

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);

            info!("Starting Lotsearch gateway on {}:{}", host, port);

            let store = Arc::new(SqliteDocumentStore::open(&config.store.path)?);
            info!(path = %config.store.path.display(), "document store opened");

            let embedder = build_embedder(&config.embedding)?;
            let vectors = build_vector_searcher(&config.vector);

            let orchestrator = Arc::new(
                SearchOrchestrator::new(embedder, vectors, store)
                    .with_default_limit(config.search.default_limit),
            );

            let app = SearchGateway::build(orchestrator);

            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("Lotsearch gateway listening on {}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
