use clap::{Parser, Subcommand};
use std::sync::Arc;
use taskweave_mcp::{GeminiBackend, GeminiConfig};
use taskweave_memory::AgentMemory;
use taskweave_supervisor::Supervisor;
use taskweave_tools::{register_reference_tools, ToolRegistry};
use taskweave_vector::{HashedEmbedding, InMemoryBackend, VectorGateway};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskweave", about = "Taskweave — multi-agent task orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the orchestrator server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, env = "TASKWEAVE_PORT", default_value = "3000")]
        port: u16,
        /// LLM provider API key
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: String,
        /// LLM model id
        #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.0-flash")]
        model: String,
        /// Vector store URL (informational for the in-memory gateway)
        #[arg(long, env = "VECTOR_STORE_URL")]
        vector_store_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            api_key,
            model,
            vector_store_url,
        } => {
            if let Some(url) = &vector_store_url {
                info!(url = %url, "External vector store configured (using in-process gateway)");
            }

            let vectors = Arc::new(VectorGateway::new(
                Arc::new(InMemoryBackend::new()),
                Arc::new(HashedEmbedding::default()),
            ));
            let memory = Arc::new(AgentMemory::new(vectors.clone()));

            let mut registry = ToolRegistry::new();
            register_reference_tools(&mut registry, vectors.clone());
            let tools = Arc::new(registry);

            let mut config = GeminiConfig::new(api_key);
            config.model_id = model;
            let backend = Arc::new(GeminiBackend::new(config));

            let supervisor = Supervisor::new(backend, tools, memory, vectors);
            let app = taskweave_gateway::build(supervisor);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!(addr = %addr, "Taskweave listening");
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
