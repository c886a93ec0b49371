//! MCP Tool definitions and handlers
//!
//! Defines all available tools and their implementations. Every handler
//! decodes its arguments, applies the Notion-side defaults and makes exactly
//! one backend call.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{McpError, NotionMcpError, Result, ValidationError};
use crate::mcp::registry::{HandlerFuture, ToolEntry, ToolRegistry};
use crate::mcp::types::{CallToolResult, Tool};
use crate::notion::api::NotionApi;
use crate::notion::blocks::BlockContent;
use crate::notion::ids::{normalize_id, normalize_optional_id};
use crate::notion::types::*;

/// Names of every tool, in catalog order
pub const TOOL_NAMES: [&str; 13] = [
    "list-databases",
    "query-database",
    "create-page",
    "update-page",
    "create-database",
    "update-database",
    "get-page",
    "get-block-children",
    "append-block-children",
    "update-block",
    "get-block",
    "search",
    "get-database",
];

/// Tool handler
pub struct ToolHandler {
    notion: Arc<dyn NotionApi>,
    registry: ToolRegistry,
}

impl ToolHandler {
    /// Create a new tool handler, validating the registry against the catalog
    pub fn new(notion: Arc<dyn NotionApi>) -> Result<Self> {
        let registry = ToolRegistry::new(catalog())?;
        registry.ensure_exactly(&TOOL_NAMES)?;

        Ok(Self { notion, registry })
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        self.registry.descriptors()
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        let Some(entry) = self.registry.get(name) else {
            tracing::warn!(tool = name, "Unknown tool requested");
            return CallToolResult::error(
                McpError::UnknownTool {
                    name: name.to_string(),
                }
                .to_string(),
            );
        };

        tracing::debug!(tool = name, arguments = %args, "Calling tool");

        let outcome = (entry.handler)(self.notion.as_ref(), args)
            .await
            .and_then(|value| serde_json::to_string_pretty(&value).map_err(NotionMcpError::from));

        match outcome {
            Ok(text) => CallToolResult::text(text),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call failed");
                CallToolResult::error(format!("Error executing {}: {}", name, e))
            }
        }
    }
}

/// Descriptors of every tool, without needing a backend
pub fn list_tools() -> Vec<Tool> {
    catalog().iter().map(ToolEntry::descriptor).collect()
}

/// Every tool with its schema and handler, in catalog order
pub fn catalog() -> Vec<ToolEntry> {
    vec![
        ToolEntry {
            name: "list-databases",
            description: "List all databases the integration has access to",
            input_schema: empty_schema,
            handler: list_databases,
        },
        ToolEntry {
            name: "query-database",
            description: "Query a database",
            input_schema: query_database_schema,
            handler: query_database,
        },
        ToolEntry {
            name: "create-page",
            description: "Create a new page in a database",
            input_schema: create_page_schema,
            handler: create_page,
        },
        ToolEntry {
            name: "update-page",
            description: "Update an existing page",
            input_schema: update_page_schema,
            handler: update_page,
        },
        ToolEntry {
            name: "create-database",
            description: "Create a new database",
            input_schema: create_database_schema,
            handler: create_database,
        },
        ToolEntry {
            name: "update-database",
            description: "Update an existing database",
            input_schema: update_database_schema,
            handler: update_database,
        },
        ToolEntry {
            name: "get-page",
            description: "Retrieve a page by its ID",
            input_schema: get_page_schema,
            handler: get_page,
        },
        ToolEntry {
            name: "get-block-children",
            description: "Retrieve the children blocks of a block",
            input_schema: get_block_children_schema,
            handler: get_block_children,
        },
        ToolEntry {
            name: "append-block-children",
            description: "Append blocks to a parent block",
            input_schema: append_block_children_schema,
            handler: append_block_children,
        },
        ToolEntry {
            name: "update-block",
            description: "Update a block's content or archive status",
            input_schema: update_block_schema,
            handler: update_block,
        },
        ToolEntry {
            name: "get-block",
            description: "Retrieve a block by its ID",
            input_schema: get_block_schema,
            handler: get_block,
        },
        ToolEntry {
            name: "search",
            description: "Search Notion for pages or databases",
            input_schema: search_schema,
            handler: search,
        },
        ToolEntry {
            name: "get-database",
            description: "Retrieve a database and its properties schema by its ID",
            input_schema: get_database_schema,
            handler: get_database,
        },
    ]
}

/// Decode tool arguments; a missing arguments object counts as empty
fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    let args = if args.is_null() {
        Value::Object(Map::new())
    } else {
        args
    };

    serde_json::from_value(args).map_err(|e| {
        ValidationError::InvalidArguments {
            message: e.to_string(),
        }
        .into()
    })
}

// ==================== Tool Handlers ====================

fn list_databases(notion: &dyn NotionApi, _args: Value) -> HandlerFuture<'_> {
    Box::pin(async move {
        let response = notion.search(SearchRequest::databases()).await?;

        Ok(response
            .get("results")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new())))
    })
}

fn query_database(notion: &dyn NotionApi, args: Value) -> HandlerFuture<'_> {
    Box::pin(async move {
        #[derive(Deserialize)]
        struct Args {
            database_id: String,
            filter: Option<Value>,
            sorts: Option<Vec<Value>>,
            start_cursor: Option<String>,
            #[serde(default, deserialize_with = "deserialize_page_size")]
            page_size: Option<u32>,
        }

        let args: Args = parse_args(args)?;

        let request = QueryDatabaseRequest {
            filter: args.filter,
            sorts: args.sorts,
            start_cursor: non_empty(args.start_cursor),
            page_size: page_size_or_default(args.page_size),
        };

        notion.query_database(&args.database_id, request).await
    })
}

fn create_page(notion: &dyn NotionApi, args: Value) -> HandlerFuture<'_> {
    Box::pin(async move {
        #[derive(Deserialize)]
        struct Args {
            parent_id: String,
            properties: Map<String, Value>,
            children: Option<Vec<Value>>,
        }

        let args: Args = parse_args(args)?;

        let request = CreatePageRequest {
            parent: Parent::DatabaseId {
                database_id: args.parent_id,
            },
            properties: args.properties,
            children: args.children,
        };

        notion.create_page(request).await
    })
}

fn update_page(notion: &dyn NotionApi, args: Value) -> HandlerFuture<'_> {
    Box::pin(async move {
        #[derive(Deserialize)]
        struct Args {
            page_id: String,
            properties: Map<String, Value>,
            archived: Option<bool>,
        }

        let args: Args = parse_args(args)?;

        let request = UpdatePageRequest {
            properties: args.properties,
            archived: args.archived,
        };

        notion.update_page(&normalize_id(&args.page_id), request).await
    })
}

fn create_database(notion: &dyn NotionApi, args: Value) -> HandlerFuture<'_> {
    Box::pin(async move {
        #[derive(Deserialize)]
        struct Args {
            parent_id: String,
            title: Vec<Value>,
            properties: Map<String, Value>,
            icon: Option<Value>,
            cover: Option<Value>,
        }

        let args: Args = parse_args(args)?;

        let request = CreateDatabaseRequest {
            parent: Parent::PageId {
                page_id: normalize_id(&args.parent_id),
            },
            title: args.title,
            properties: args.properties,
            icon: args.icon.map(with_default_emoji),
            cover: args.cover,
        };

        notion.create_database(request).await
    })
}

fn update_database(notion: &dyn NotionApi, args: Value) -> HandlerFuture<'_> {
    Box::pin(async move {
        #[derive(Deserialize)]
        struct Args {
            database_id: String,
            title: Option<Vec<Value>>,
            description: Option<Vec<Value>>,
            properties: Option<Map<String, Value>>,
        }

        let args: Args = parse_args(args)?;

        let request = UpdateDatabaseRequest {
            title: args.title,
            description: args.description,
            properties: args.properties,
        };

        notion.update_database(&args.database_id, request).await
    })
}

fn get_database(notion: &dyn NotionApi, args: Value) -> HandlerFuture<'_> {
    Box::pin(async move {
        #[derive(Deserialize)]
        struct Args {
            database_id: String,
        }

        let args: Args = parse_args(args)?;
        notion.retrieve_database(&args.database_id).await
    })
}

fn get_page(notion: &dyn NotionApi, args: Value) -> HandlerFuture<'_> {
    Box::pin(async move {
        #[derive(Deserialize)]
        struct Args {
            page_id: String,
        }

        let args: Args = parse_args(args)?;
        notion.retrieve_page(&normalize_id(&args.page_id)).await
    })
}

fn get_block_children(notion: &dyn NotionApi, args: Value) -> HandlerFuture<'_> {
    Box::pin(async move {
        #[derive(Deserialize)]
        struct Args {
            block_id: String,
            start_cursor: Option<String>,
            #[serde(default, deserialize_with = "deserialize_page_size")]
            page_size: Option<u32>,
        }

        let args: Args = parse_args(args)?;

        let query = ListBlockChildrenQuery {
            start_cursor: non_empty(args.start_cursor),
            page_size: page_size_or_default(args.page_size),
        };

        notion
            .list_block_children(&normalize_id(&args.block_id), query)
            .await
    })
}

fn append_block_children(notion: &dyn NotionApi, args: Value) -> HandlerFuture<'_> {
    Box::pin(async move {
        #[derive(Deserialize)]
        struct Args {
            block_id: String,
            children: Vec<Value>,
            after: Option<String>,
        }

        let args: Args = parse_args(args)?;

        let request = AppendBlockChildrenRequest {
            children: args.children,
            after: normalize_optional_id(args.after.as_deref()),
        };

        notion
            .append_block_children(&normalize_id(&args.block_id), request)
            .await
    })
}

fn update_block(notion: &dyn NotionApi, args: Value) -> HandlerFuture<'_> {
    Box::pin(async move {
        #[derive(Deserialize)]
        struct Args {
            block_id: String,
            block_type: String,
            content: Map<String, Value>,
            archived: Option<bool>,
        }

        let args: Args = parse_args(args)?;

        let request = UpdateBlockRequest {
            content: BlockContent::from_parts(&args.block_type, args.content)?,
            archived: args.archived,
        };

        notion
            .update_block(&normalize_id(&args.block_id), request)
            .await
    })
}

fn get_block(notion: &dyn NotionApi, args: Value) -> HandlerFuture<'_> {
    Box::pin(async move {
        #[derive(Deserialize)]
        struct Args {
            block_id: String,
        }

        let args: Args = parse_args(args)?;
        notion.retrieve_block(&normalize_id(&args.block_id)).await
    })
}

fn search(notion: &dyn NotionApi, args: Value) -> HandlerFuture<'_> {
    Box::pin(async move {
        #[derive(Deserialize)]
        struct Args {
            query: Option<String>,
            filter: Option<Value>,
            sort: Option<Value>,
            start_cursor: Option<String>,
            #[serde(default, deserialize_with = "deserialize_page_size")]
            page_size: Option<u32>,
        }

        let args: Args = parse_args(args)?;

        let request = SearchRequest {
            query: Some(args.query.unwrap_or_default()),
            filter: args.filter,
            sort: args.sort,
            start_cursor: non_empty(args.start_cursor),
            page_size: page_size_or_default(args.page_size),
        };

        notion.search(request).await
    })
}

// ==================== Tool Schemas ====================

fn empty_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

fn query_database_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "database_id": {
                "type": "string",
                "description": "ID of the database to query"
            },
            "filter": {
                "type": "object",
                "description": "Optional filter criteria"
            },
            "sorts": {
                "type": "array",
                "description": "Optional sort criteria"
            },
            "start_cursor": {
                "type": "string",
                "description": "Optional cursor for pagination"
            },
            "page_size": {
                "type": "number",
                "description": "Number of results per page",
                "default": 100
            }
        },
        "required": ["database_id"]
    })
}

fn create_page_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "parent_id": {
                "type": "string",
                "description": "ID of the parent database"
            },
            "properties": {
                "type": "object",
                "description": "Page properties"
            },
            "children": {
                "type": "array",
                "description": "Optional content blocks"
            }
        },
        "required": ["parent_id", "properties"]
    })
}

fn update_page_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "page_id": {
                "type": "string",
                "description": "ID of the page to update"
            },
            "properties": {
                "type": "object",
                "description": "Updated page properties"
            },
            "archived": {
                "type": "boolean",
                "description": "Whether to archive the page"
            }
        },
        "required": ["page_id", "properties"]
    })
}

fn create_database_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "parent_id": {
                "type": "string",
                "description": "ID of the parent page"
            },
            "title": {
                "type": "array",
                "description": "Database title as rich text array"
            },
            "properties": {
                "type": "object",
                "description": "Database properties schema"
            },
            "icon": {
                "type": "object",
                "description": "Optional icon for the database"
            },
            "cover": {
                "type": "object",
                "description": "Optional cover for the database"
            }
        },
        "required": ["parent_id", "title", "properties"]
    })
}

fn update_database_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "database_id": {
                "type": "string",
                "description": "ID of the database to update"
            },
            "title": {
                "type": "array",
                "description": "Optional new title as rich text array"
            },
            "description": {
                "type": "array",
                "description": "Optional new description as rich text array"
            },
            "properties": {
                "type": "object",
                "description": "Optional updated properties schema"
            }
        },
        "required": ["database_id"]
    })
}

fn get_database_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "database_id": {
                "type": "string",
                "description": "ID of the database to retrieve"
            }
        },
        "required": ["database_id"]
    })
}

fn get_page_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "page_id": {
                "type": "string",
                "description": "ID of the page to retrieve"
            }
        },
        "required": ["page_id"]
    })
}

fn get_block_children_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "block_id": {
                "type": "string",
                "description": "ID of the block (page or block)"
            },
            "start_cursor": {
                "type": "string",
                "description": "Cursor for pagination"
            },
            "page_size": {
                "type": "number",
                "description": "Number of results per page",
                "default": 100
            }
        },
        "required": ["block_id"]
    })
}

fn append_block_children_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "block_id": {
                "type": "string",
                "description": "ID of the parent block (page or block)"
            },
            "children": {
                "type": "array",
                "description": "List of block objects to append"
            },
            "after": {
                "type": "string",
                "description": "Optional ID of an existing block to append after"
            }
        },
        "required": ["block_id", "children"]
    })
}

fn update_block_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "block_id": {
                "type": "string",
                "description": "ID of the block to update"
            },
            "block_type": {
                "type": "string",
                "description": "The type of block (paragraph, heading_1, to_do, etc.)"
            },
            "content": {
                "type": "object",
                "description": "The content for the block based on its type"
            },
            "archived": {
                "type": "boolean",
                "description": "Whether to archive (true) or restore (false) the block"
            }
        },
        "required": ["block_id", "block_type", "content"]
    })
}

fn get_block_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "block_id": {
                "type": "string",
                "description": "ID of the block to retrieve"
            }
        },
        "required": ["block_id"]
    })
}

fn search_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "Search query string",
                "default": ""
            },
            "filter": {
                "type": "object",
                "description": "Optional filter criteria"
            },
            "sort": {
                "type": "object",
                "description": "Optional sort criteria"
            },
            "start_cursor": {
                "type": "string",
                "description": "Cursor for pagination"
            },
            "page_size": {
                "type": "number",
                "description": "Number of results per page",
                "default": 100
            }
        }
    })
}
