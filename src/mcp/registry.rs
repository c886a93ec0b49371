//! Tool registry
//!
//! Lookup table from tool name to descriptor and handler.

use std::collections::HashMap;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::{McpError, NotionMcpError, Result};
use crate::mcp::types::Tool;
use crate::notion::api::NotionApi;

/// Future returned by a tool handler
pub type HandlerFuture<'a> = BoxFuture<'a, Result<Value>>;

/// A tool handler: decodes its arguments and makes one backend call
pub type HandlerFn = for<'a> fn(&'a dyn NotionApi, Value) -> HandlerFuture<'a>;

/// One registered tool
#[derive(Clone, Copy)]
pub struct ToolEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: fn() -> Value,
    pub handler: HandlerFn,
}

impl ToolEntry {
    /// Descriptor advertised in `tools/list`
    pub fn descriptor(&self) -> Tool {
        Tool {
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
            input_schema: (self.input_schema)(),
        }
    }
}

/// Name-indexed set of tools, in registration order
pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
    by_name: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    /// Build a registry, rejecting empty and duplicate names
    pub fn new(entries: Vec<ToolEntry>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(registration_error(format!(
                    "tool at position {} has an empty name",
                    index
                )));
            }
            if by_name.insert(entry.name, index).is_some() {
                return Err(registration_error(format!(
                    "tool '{}' registered more than once",
                    entry.name
                )));
            }
        }

        Ok(Self { entries, by_name })
    }

    /// Check that exactly `expected` is registered
    pub fn ensure_exactly(&self, expected: &[&str]) -> Result<()> {
        if let Some(missing) = expected.iter().find(|n| !self.by_name.contains_key(**n)) {
            return Err(registration_error(format!("no handler for tool '{}'", missing)));
        }
        if let Some(extra) = self.entries.iter().find(|e| !expected.contains(&e.name)) {
            return Err(registration_error(format!(
                "tool '{}' is not part of the catalog",
                extra.name
            )));
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> Vec<Tool> {
        self.entries.iter().map(ToolEntry::descriptor).collect()
    }
}

fn registration_error(message: String) -> NotionMcpError {
    NotionMcpError::Mcp(McpError::Registration { message })
}
