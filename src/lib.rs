//! Notion MCP Server Library
//!
//! A Model Context Protocol (MCP) server for Notion integration.
//! Provides tools for searching, reading and editing pages, databases and blocks
//! via the Notion API.

pub mod config;
pub mod error;
pub mod mcp;
pub mod notion;

pub use config::Config;
pub use error::{NotionMcpError, Result};
