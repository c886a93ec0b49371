//! Notion MCP Server - Rust Implementation
//!
//! A Model Context Protocol (MCP) server for Notion integration.
//! Provides tools for searching, reading and editing pages, databases and blocks.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use notion_mcp_server_rust::config::Config;
use notion_mcp_server_rust::mcp::server::McpServer;
use notion_mcp_server_rust::mcp::tools::{self, ToolHandler};
use notion_mcp_server_rust::notion::client::NotionClient;

/// Notion MCP Server
#[derive(Parser)]
#[command(name = "notion-mcp-server")]
#[command(author, version, about = "Notion MCP Server - A Model Context Protocol server for Notion")]
struct Cli {
    /// dotenv file to load before reading the environment (default: ./.env if present)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Default log level (RUST_LOG still applies)
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tool catalog as JSON and exit
    Tools,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.log_level))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        tracing::error!("Fatal error in main(): {:#}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; `--log-level` only fills in when it sets no global level
fn log_filter(level: tracing::Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Tools) => {
            let catalog = serde_json::json!({ "tools": tools::list_tools() });
            println!("{}", serde_json::to_string_pretty(&catalog)?);
            Ok(())
        }
        None => run_server(cli.env_file).await,
    }
}

async fn run_server(env_file: Option<PathBuf>) -> anyhow::Result<()> {
    Config::load_env_file(env_file.as_deref()).context("failed to load environment file")?;
    let config = Config::from_env().context("failed to load configuration")?;

    // Create Notion client
    let notion = Arc::new(NotionClient::new(&config));

    let tool_handler = ToolHandler::new(notion).context("failed to register tools")?;

    // Create and run MCP server
    let server = McpServer::new(tool_handler);
    server
        .run_stdio()
        .await
        .context("stdio transport failed")?;

    Ok(())
}
