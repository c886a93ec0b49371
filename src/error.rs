//! Error types for the Notion MCP Server
//!
//! This module defines the error hierarchy for all operations in the server.

use thiserror::Error;

/// Main error type for the Notion MCP Server
#[derive(Error, Debug)]
pub enum NotionMcpError {
    /// Notion API errors. Displayed verbatim so the backend message reaches the caller.
    #[error(transparent)]
    Notion(#[from] NotionApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tool argument errors
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Notion API errors
#[derive(Error, Debug)]
pub enum NotionApiError {
    /// Error object returned by the API (`{"object": "error", ...}`)
    #[error("{message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Non-success response whose body was not a Notion error object
    #[error("{message}")]
    RequestFailed { message: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to load env file {path}: {message}")]
    EnvFile { path: String, message: String },
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Unsupported block type: {block_type}")]
    UnsupportedBlockType { block_type: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Tool registration failed: {message}")]
    Registration { message: String },

    #[error("Protocol error: {message}")]
    ProtocolError { message: String },
}

/// Result type alias for Notion MCP operations
pub type Result<T> = std::result::Result<T, NotionMcpError>;
