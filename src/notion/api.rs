//! Backend abstraction
//!
//! One method per Notion endpoint the tools use. [`NotionClient`] talks to the
//! real API; tests substitute a recording fake.
//!
//! [`NotionClient`]: crate::notion::client::NotionClient

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::notion::types::*;

/// Notion API operations
#[async_trait]
pub trait NotionApi: Send + Sync {
    /// `POST /search`
    async fn search(&self, request: SearchRequest) -> Result<Value>;

    /// `POST /databases/{database_id}/query`
    async fn query_database(&self, database_id: &str, request: QueryDatabaseRequest)
        -> Result<Value>;

    /// `GET /databases/{database_id}`
    async fn retrieve_database(&self, database_id: &str) -> Result<Value>;

    /// `POST /databases`
    async fn create_database(&self, request: CreateDatabaseRequest) -> Result<Value>;

    /// `PATCH /databases/{database_id}`
    async fn update_database(&self, database_id: &str, request: UpdateDatabaseRequest)
        -> Result<Value>;

    /// `GET /pages/{page_id}`
    async fn retrieve_page(&self, page_id: &str) -> Result<Value>;

    /// `POST /pages`
    async fn create_page(&self, request: CreatePageRequest) -> Result<Value>;

    /// `PATCH /pages/{page_id}`
    async fn update_page(&self, page_id: &str, request: UpdatePageRequest) -> Result<Value>;

    /// `GET /blocks/{block_id}`
    async fn retrieve_block(&self, block_id: &str) -> Result<Value>;

    /// `PATCH /blocks/{block_id}`
    async fn update_block(&self, block_id: &str, request: UpdateBlockRequest) -> Result<Value>;

    /// `GET /blocks/{block_id}/children`
    async fn list_block_children(&self, block_id: &str, query: ListBlockChildrenQuery)
        -> Result<Value>;

    /// `PATCH /blocks/{block_id}/children`
    async fn append_block_children(
        &self,
        block_id: &str,
        request: AppendBlockChildrenRequest,
    ) -> Result<Value>;
}
