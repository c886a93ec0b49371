//! Integration tests for Notion MCP Server
//!
//! These tests drive the JSON-RPC loop end to end over in-memory I/O.
//! The Notion API is either a recording fake or an httpmock server; no real
//! API calls are made.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use notion_mcp_server_rust::error::{NotionApiError, Result};
use notion_mcp_server_rust::mcp::server::McpServer;
use notion_mcp_server_rust::mcp::tools::ToolHandler;
use notion_mcp_server_rust::notion::api::NotionApi;
use notion_mcp_server_rust::notion::types::*;

/// Helper to create a JSON-RPC request line
fn make_request(id: i64, method: &str, params: Option<Value>) -> String {
    let mut request = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
    });
    if let Some(p) = params {
        request["params"] = p;
    }
    request.to_string()
}

fn call(id: i64, name: &str, arguments: Value) -> String {
    make_request(
        id,
        "tools/call",
        Some(json!({"name": name, "arguments": arguments})),
    )
}

/// Run the server over `lines` and return responses keyed by position of id
async fn exchange(server: McpServer, lines: &[String]) -> Vec<Value> {
    let input = lines.join("\n") + "\n";
    let output = server.run(input.as_bytes(), Vec::new()).await.unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).expect("Failed to parse JSON response"))
        .collect()
}

fn response_for(responses: &[Value], id: i64) -> &Value {
    responses
        .iter()
        .find(|r| r["id"] == id)
        .unwrap_or_else(|| panic!("no response for id {}", id))
}

/// Records the path id of every call; pages fail slowly, everything else succeeds
#[derive(Default)]
struct FakeNotion {
    ids: Mutex<Vec<String>>,
}

impl FakeNotion {
    fn ok(&self, id: &str) -> Result<Value> {
        self.ids.lock().unwrap().push(id.to_string());
        Ok(json!({"object": "block", "id": id}))
    }
}

#[async_trait]
impl NotionApi for FakeNotion {
    async fn search(&self, request: SearchRequest) -> Result<Value> {
        Ok(json!({"object": "list", "results": [], "query": request.query}))
    }
    async fn query_database(&self, id: &str, _: QueryDatabaseRequest) -> Result<Value> {
        self.ok(id)
    }
    async fn retrieve_database(&self, id: &str) -> Result<Value> {
        self.ok(id)
    }
    async fn create_database(&self, request: CreateDatabaseRequest) -> Result<Value> {
        Ok(serde_json::to_value(request)?)
    }
    async fn update_database(&self, id: &str, _: UpdateDatabaseRequest) -> Result<Value> {
        self.ok(id)
    }
    async fn retrieve_page(&self, id: &str) -> Result<Value> {
        self.ids.lock().unwrap().push(id.to_string());
        tokio::time::sleep(Duration::from_millis(50)).await;
        Err(NotionApiError::Api {
            status: 403,
            code: "restricted_resource".to_string(),
            message: "permission denied".to_string(),
        }
        .into())
    }
    async fn create_page(&self, _: CreatePageRequest) -> Result<Value> {
        self.ok("new")
    }
    async fn update_page(&self, id: &str, _: UpdatePageRequest) -> Result<Value> {
        self.ok(id)
    }
    async fn retrieve_block(&self, id: &str) -> Result<Value> {
        self.ok(id)
    }
    async fn update_block(&self, id: &str, _: UpdateBlockRequest) -> Result<Value> {
        self.ok(id)
    }
    async fn list_block_children(&self, id: &str, _: ListBlockChildrenQuery) -> Result<Value> {
        self.ok(id)
    }
    async fn append_block_children(
        &self,
        id: &str,
        _: AppendBlockChildrenRequest,
    ) -> Result<Value> {
        self.ok(id)
    }
}

fn fake_server() -> (McpServer, Arc<FakeNotion>) {
    let fake = Arc::new(FakeNotion::default());
    let handler = ToolHandler::new(fake.clone()).unwrap();
    (McpServer::new(handler), fake)
}

mod mcp_protocol_tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_then_list_tools() {
        let (server, _) = fake_server();
        let responses = exchange(
            server,
            &[
                make_request(
                    1,
                    "initialize",
                    Some(json!({
                        "protocolVersion": "2024-11-05",
                        "clientInfo": {"name": "test-client", "version": "1.0.0"},
                        "capabilities": {}
                    })),
                ),
                json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
                make_request(2, "tools/list", None),
            ],
        )
        .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(response_for(&responses, 1)["result"]["serverInfo"]["name"], "notion-mcp");

        let tools = response_for(&responses, 2)["result"]["tools"]
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(tools.len(), 13);
        assert_eq!(tools[0]["name"], "list-databases");
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_a_protocol_fault() {
        let (server, _) = fake_server();
        let responses = exchange(server, &[call(7, "delete-everything", json!({}))]).await;

        let response = response_for(&responses, 7);
        assert!(response["error"].is_null());
        assert_eq!(
            response["result"],
            json!({
                "isError": true,
                "content": [{"type": "text", "text": "Unknown tool: delete-everything"}]
            })
        );
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_stop_the_server() {
        let (server, _) = fake_server();

        let mut input = call(1, "get-page", json!({"page_id": "slow"})).into_bytes();
        input.extend_from_slice(b"\n\xff\xfe garbage\n");
        input.extend_from_slice(make_request(2, "ping", None).as_bytes());
        input.push(b'\n');

        let output = server.run(input.as_slice(), Vec::new()).await.unwrap();
        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(responses.len(), 3);
        let rejected = responses.iter().find(|r| r["id"].is_null()).unwrap();
        assert_eq!(rejected["error"]["code"], -32700);
        assert_eq!(response_for(&responses, 2)["result"], json!({}));
        assert_eq!(
            response_for(&responses, 1)["result"]["content"][0]["text"],
            "Error executing get-page: permission denied"
        );
    }

    #[tokio::test]
    async fn test_malformed_line_gets_parse_error() {
        let (server, _) = fake_server();
        let responses = exchange(server, &["not json".to_string()]).await;

        assert_eq!(responses.len(), 1);
        assert!(responses[0]["id"].is_null());
        assert_eq!(responses[0]["error"]["code"], -32700);
    }
}

mod tool_call_tests {
    use super::*;

    #[tokio::test]
    async fn test_permission_denied_envelope() {
        let (server, _) = fake_server();
        let responses = exchange(server, &[call(1, "get-page", json!({"page_id": "p1"}))]).await;

        assert_eq!(
            response_for(&responses, 1)["result"],
            json!({
                "isError": true,
                "content": [{"type": "text", "text": "Error executing get-page: permission denied"}]
            })
        );
    }

    #[tokio::test]
    async fn test_concurrent_invocations_are_independent() {
        let (server, fake) = fake_server();
        let responses = exchange(
            server,
            &[
                call(1, "get-page", json!({"page_id": "slow-page"})),
                call(2, "get-block", json!({"block_id": "fast-block"})),
            ],
        )
        .await;

        assert_eq!(responses.len(), 2);
        // The slow page call does not hold up the block call
        assert_eq!(responses[0]["id"], 2);

        assert_eq!(response_for(&responses, 1)["result"]["isError"], true);
        let block = response_for(&responses, 2);
        assert_eq!(block["result"]["isError"], false);
        let text = block["result"]["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["id"], "fastblock");

        let mut ids = fake.ids.lock().unwrap().clone();
        ids.sort();
        assert_eq!(ids, vec!["fastblock", "slowpage"]);
    }

    #[tokio::test]
    async fn test_create_database_round_trip() {
        let (server, _) = fake_server();
        let responses = exchange(
            server,
            &[call(
                3,
                "create-database",
                json!({
                    "parent_id": "abcd-1234",
                    "title": [{"type": "text", "text": {"content": "Reading list"}}],
                    "properties": {"Name": {"title": {}}},
                    "icon": {"type": "emoji", "emoji": ""}
                }),
            )],
        )
        .await;

        let text = response_for(&responses, 3)["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .to_string();
        let sent: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(sent["parent"]["page_id"], "abcd1234");
        assert_eq!(sent["icon"]["emoji"], "📄");
    }

    #[tokio::test]
    async fn test_call_without_arguments() {
        let (server, _) = fake_server();
        let responses = exchange(
            server,
            &[
                make_request(1, "tools/call", Some(json!({"name": "search"}))),
                make_request(2, "tools/call", Some(json!({"name": "get-block"}))),
            ],
        )
        .await;

        let search = response_for(&responses, 1);
        assert_eq!(search["result"]["isError"], false);

        let get_block = response_for(&responses, 2);
        assert_eq!(get_block["result"]["isError"], true);
        let text = get_block["result"]["content"][0]["text"].as_str().unwrap();
        assert_eq!(
            text,
            "Error executing get-block: Invalid arguments: missing field `block_id`"
        );
    }
}

mod http_backend_tests {
    use super::*;
    use httpmock::prelude::*;
    use notion_mcp_server_rust::config::{notion::API_VERSION, Config};
    use notion_mcp_server_rust::notion::client::NotionClient;

    #[tokio::test]
    async fn test_get_page_through_real_client() {
        let mock = MockServer::start_async().await;
        let m = mock
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/pages/59833787f4fd4bde87d3cd7a1c4c2f1b")
                    .header("Authorization", "Bearer secret_it");
                then.status(403).json_body(json!({
                    "object": "error",
                    "status": 403,
                    "code": "restricted_resource",
                    "message": "permission denied"
                }));
            })
            .await;

        let config = Config::new("secret_it", mock.base_url(), API_VERSION).unwrap();
        let handler = ToolHandler::new(Arc::new(NotionClient::new(&config))).unwrap();
        let server = McpServer::new(handler);

        let responses = exchange(
            server,
            &[call(
                1,
                "get-page",
                json!({"page_id": "59833787-f4fd-4bde-87d3-cd7a1c4c2f1b"}),
            )],
        )
        .await;

        m.assert_async().await;
        assert_eq!(
            response_for(&responses, 1)["result"]["content"][0]["text"],
            "Error executing get-page: permission denied"
        );
    }

    #[tokio::test]
    async fn test_search_through_real_client() {
        let mock = MockServer::start_async().await;
        let m = mock
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/search")
                    .header("Notion-Version", API_VERSION)
                    .json_body(json!({"query": "roadmap", "page_size": 100}));
                then.status(200).json_body(json!({
                    "object": "list",
                    "results": [{"object": "page", "id": "p1"}],
                    "has_more": false,
                    "next_cursor": null
                }));
            })
            .await;

        let config = Config::new("secret_it", mock.base_url(), API_VERSION).unwrap();
        let handler = ToolHandler::new(Arc::new(NotionClient::new(&config))).unwrap();

        let result = handler
            .call_tool("search", json!({"query": "roadmap"}))
            .await;

        m.assert_async().await;
        tokio_test::assert_ok!(serde_json::from_str::<Value>(result.first_text().unwrap()));
        assert!(!result.is_error);
    }
}
