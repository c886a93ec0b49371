//! Notion API module
//!
//! Contains the backend trait, HTTP client, request types and helpers for
//! interacting with the Notion API.

pub mod api;
pub mod blocks;
pub mod client;
pub mod ids;
pub mod types;
