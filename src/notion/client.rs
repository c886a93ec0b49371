//! Notion API client
//!
//! HTTPS implementation of [`NotionApi`].

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{NotionApiError, NotionMcpError, Result};
use crate::notion::api::NotionApi;
use crate::notion::types::*;

const NOTION_VERSION_HEADER: &str = "Notion-Version";

/// Notion API client
pub struct NotionClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// API root, without trailing slash
    base_url: String,

    /// Integration token
    api_key: String,

    /// `Notion-Version` header value
    notion_version: String,
}

/// Error object returned by the API on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl NotionClient {
    /// Create a new Notion client
    pub fn new(config: &Config) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            notion_version: config.notion_version.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!("Notion API request: {} {}", method, path);
        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header(NOTION_VERSION_HEADER, &self.notion_version)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(NotionMcpError::Notion(api_error(status.as_u16(), &text)))
        }
    }
}

/// Map a failed response onto [`NotionApiError`]
fn api_error(status: u16, body: &str) -> NotionApiError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => NotionApiError::Api {
            status,
            code: err.code,
            message: err.message,
        },
        Err(_) => NotionApiError::RequestFailed {
            message: format!("Request failed with status {}: {}", status, body),
        },
    }
}

fn encode(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[async_trait]
impl NotionApi for NotionClient {
    async fn search(&self, request: SearchRequest) -> Result<Value> {
        self.execute(self.request(Method::POST, "/search").json(&request))
            .await
    }

    async fn query_database(
        &self,
        database_id: &str,
        request: QueryDatabaseRequest,
    ) -> Result<Value> {
        let path = format!("/databases/{}/query", encode(database_id));
        self.execute(self.request(Method::POST, &path).json(&request))
            .await
    }

    async fn retrieve_database(&self, database_id: &str) -> Result<Value> {
        let path = format!("/databases/{}", encode(database_id));
        self.execute(self.request(Method::GET, &path)).await
    }

    async fn create_database(&self, request: CreateDatabaseRequest) -> Result<Value> {
        self.execute(self.request(Method::POST, "/databases").json(&request))
            .await
    }

    async fn update_database(
        &self,
        database_id: &str,
        request: UpdateDatabaseRequest,
    ) -> Result<Value> {
        let path = format!("/databases/{}", encode(database_id));
        self.execute(self.request(Method::PATCH, &path).json(&request))
            .await
    }

    async fn retrieve_page(&self, page_id: &str) -> Result<Value> {
        let path = format!("/pages/{}", encode(page_id));
        self.execute(self.request(Method::GET, &path)).await
    }

    async fn create_page(&self, request: CreatePageRequest) -> Result<Value> {
        self.execute(self.request(Method::POST, "/pages").json(&request))
            .await
    }

    async fn update_page(&self, page_id: &str, request: UpdatePageRequest) -> Result<Value> {
        let path = format!("/pages/{}", encode(page_id));
        self.execute(self.request(Method::PATCH, &path).json(&request))
            .await
    }

    async fn retrieve_block(&self, block_id: &str) -> Result<Value> {
        let path = format!("/blocks/{}", encode(block_id));
        self.execute(self.request(Method::GET, &path)).await
    }

    async fn update_block(&self, block_id: &str, request: UpdateBlockRequest) -> Result<Value> {
        let path = format!("/blocks/{}", encode(block_id));
        self.execute(self.request(Method::PATCH, &path).json(&request))
            .await
    }

    async fn list_block_children(
        &self,
        block_id: &str,
        query: ListBlockChildrenQuery,
    ) -> Result<Value> {
        let path = format!("/blocks/{}/children", encode(block_id));
        self.execute(self.request(Method::GET, &path).query(&query))
            .await
    }

    async fn append_block_children(
        &self,
        block_id: &str,
        request: AppendBlockChildrenRequest,
    ) -> Result<Value> {
        let path = format!("/blocks/{}/children", encode(block_id));
        self.execute(self.request(Method::PATCH, &path).json(&request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::notion::API_VERSION;
    use crate::notion::blocks::{BlockContent, ToDoBlock};
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;
    use serde_json::json;

    fn client_for(server: &MockServer) -> NotionClient {
        let config = Config::new("secret_test", server.base_url(), API_VERSION).unwrap();
        NotionClient::new(&config)
    }

    #[tokio::test]
    async fn test_retrieve_page_sends_auth_and_version() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/pages/abcd1234")
                    .header("Authorization", "Bearer secret_test")
                    .header("Notion-Version", API_VERSION);
                then.status(200)
                    .json_body(json!({"object": "page", "id": "abcd1234"}));
            })
            .await;

        let page = client_for(&server).retrieve_page("abcd1234").await.unwrap();
        m.assert_async().await;
        assert_eq!(page["object"], "page");
    }

    #[tokio::test]
    async fn test_query_database_posts_body() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/databases/db1/query")
                    .json_body(json!({
                        "filter": {"property": "Done", "checkbox": {"equals": false}},
                        "page_size": 100
                    }));
                then.status(200)
                    .json_body(json!({"object": "list", "results": []}));
            })
            .await;

        let request = QueryDatabaseRequest {
            filter: Some(json!({"property": "Done", "checkbox": {"equals": false}})),
            sorts: None,
            start_cursor: None,
            page_size: 100,
        };
        let result = client_for(&server)
            .query_database("db1", request)
            .await
            .unwrap();
        m.assert_async().await;
        assert_eq!(result["object"], "list");
    }

    #[tokio::test]
    async fn test_list_block_children_uses_query_string() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/blocks/b1/children")
                    .query_param("page_size", "50")
                    .query_param("start_cursor", "cur");
                then.status(200).json_body(json!({"results": []}));
            })
            .await;

        let query = ListBlockChildrenQuery {
            start_cursor: Some("cur".to_string()),
            page_size: 50,
        };
        client_for(&server)
            .list_block_children("b1", query)
            .await
            .unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_block_body_is_keyed_by_type() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/blocks/b1")
                    .json_body(json!({"to_do": {"checked": true}, "archived": false}));
                then.status(200).json_body(json!({"object": "block"}));
            })
            .await;

        let request = UpdateBlockRequest {
            content: BlockContent::ToDo(ToDoBlock {
                checked: Some(true),
                ..Default::default()
            }),
            archived: Some(false),
        };
        client_for(&server).update_block("b1", request).await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_object_is_decoded() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/blocks/missing");
                then.status(404).json_body(json!({
                    "object": "error",
                    "status": 404,
                    "code": "object_not_found",
                    "message": "Could not find block with ID: missing."
                }));
            })
            .await;

        let err = client_for(&server)
            .retrieve_block("missing")
            .await
            .unwrap_err();
        match err {
            NotionMcpError::Notion(NotionApiError::Api {
                status,
                code,
                message,
            }) => {
                assert_eq!(status, 404);
                assert_eq!(code, "object_not_found");
                assert_eq!(message, "Could not find block with ID: missing.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/search");
                then.status(502).body("bad gateway");
            })
            .await;

        let err = client_for(&server)
            .search(SearchRequest::databases())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 502: bad gateway");
    }

    #[test]
    fn test_path_ids_are_encoded() {
        assert_eq!(encode("a/b"), "a%2Fb");
        assert_eq!(encode("abcd1234"), "abcd1234");
    }
}
