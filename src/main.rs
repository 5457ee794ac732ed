mod client;
mod connection;
mod error;
mod model;
mod tools;

use clap::Parser;
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

use crate::connection::ConnectionManager;

/// MCP server for controlling Music Assistant over its WebSocket API.
#[derive(Parser)]
#[command(name = "music-assistant-mcp", version)]
struct Cli {
    /// Music Assistant server URL (e.g. http://localhost:8095)
    #[arg(long, env = "MUSIC_ASSISTANT_URL")]
    url: Option<String>,
    /// Access token, for servers that require authentication
    #[arg(long, env = "MUSIC_ASSISTANT_TOKEN")]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the MCP transport, so logs must go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let server = tools::MusicAssistantServer::new(ConnectionManager::new(cli.url, cli.token));

    let service = server.clone().serve(stdio()).await?;
    service.waiting().await?;
    server.shutdown().await;
    Ok(())
}
