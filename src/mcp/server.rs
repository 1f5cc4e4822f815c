//! MCP JSON-RPC 2.0 server: reads requests from stdin and writes responses to stdout.
//!
//! The MCP protocol uses newline-delimited JSON over STDIO.
//! Tracing output goes to stderr so it doesn't interfere with the protocol.

use anyhow::Result;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use super::tools;
use super::types::*;
use crate::transcribe::CaptionProvider;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "youtube-transcript-mcp";

/// Consecutive read failures after which the input is considered dead
const MAX_CONSECUTIVE_READ_ERRORS: usize = 16;

/// Stateless MCP server; every request is handled on its own.
pub struct McpServer<P> {
    provider: P,
}

impl<P: CaptionProvider> McpServer<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Serve requests from `reader` until end of stream.
    ///
    /// Lines are handled strictly one at a time and each response is flushed before the
    /// next line is read.
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("MCP server starting");

        let mut buf = Vec::new();
        let mut read_errors = 0;

        loop {
            buf.clear();
            let response = match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    read_errors = 0;
                    match std::str::from_utf8(&buf) {
                        Ok(line) => self.handle_line(line).await,
                        Err(e) => {
                            warn!(error = %e, "request line is not valid UTF-8");
                            Some(JsonRpcResponse::error(Value::Null, INTERNAL_ERROR, e.to_string()))
                        }
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    read_errors += 1;
                    error!(error = %e, "failed to read stdin");
                    if read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        return Err(anyhow::Error::new(e).context("stdin keeps failing"));
                    }
                    Some(JsonRpcResponse::error(Value::Null, INTERNAL_ERROR, e.to_string()))
                }
            };

            if let Some(response) = response {
                write_response(&mut writer, &response).await?;
            }
        }

        info!("MCP server shutting down");
        Ok(())
    }

    /// Handle one raw input line and return a response (or None for notifications).
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let trimmed = line.trim();
        debug!(request = %trimmed, "received request");

        let value: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "invalid JSON-RPC request");
                return Some(JsonRpcResponse::error(Value::Null, INTERNAL_ERROR, e.to_string()));
            }
        };

        let recovered_id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "malformed JSON-RPC request");
                return Some(JsonRpcResponse::error(
                    recovered_id,
                    INTERNAL_ERROR,
                    format!("Invalid request: {}", e),
                ));
            }
        };

        self.handle_request(request).await
    }

    /// Handle a single JSON-RPC request and return a response (or None for notifications).
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        info!(method = %request.method, "received request");
        let method = Method::from(request.method.as_str());

        let Some(id) = request.id else {
            // Notifications don't get responses
            match method {
                Method::Initialized => info!("client initialized"),
                _ => debug!(method = %request.method, "ignoring notification"),
            }
            return None;
        };

        match method {
            Method::Initialize => {
                info!("client initializing");
                Some(JsonRpcResponse::from_result(id, &initialize_result()))
            }

            Method::Initialized => {
                info!("client initialized");
                None
            }

            Method::ToolsList => {
                debug!("listing tools");
                let result = ToolsListResult {
                    tools: tools::list_tools(),
                };
                Some(JsonRpcResponse::from_result(id, &result))
            }

            Method::ToolsCall => {
                let params: ToolsCallParams = if request.params.is_null() {
                    ToolsCallParams {
                        name: None,
                        arguments: Value::Null,
                    }
                } else {
                    match serde_json::from_value(request.params) {
                        Ok(p) => p,
                        Err(e) => {
                            warn!(error = %e, "invalid tools/call params");
                            return Some(JsonRpcResponse::error(
                                id,
                                INTERNAL_ERROR,
                                format!("Invalid params: {}", e),
                            ));
                        }
                    }
                };

                let name = params.name.unwrap_or_default();
                debug!(tool = %name, "calling tool");

                let result = tools::call_tool(&self.provider, &name, &params.arguments).await;
                Some(JsonRpcResponse::from_result(id, &result))
            }

            Method::Unknown(method) => {
                warn!(method = %method, "unknown method");
                Some(JsonRpcResponse::error(id, METHOD_NOT_FOUND, "Method not found"))
            }
        }
    }
}

fn initialize_result() -> InitializeResult {
    InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: ToolCapability {},
        },
        server_info: ServerInfo {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    }
}

/// Write a JSON-RPC response (newline-delimited) and flush it.
async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &JsonRpcResponse) -> Result<()> {
    let mut json = serde_json::to_string(response)?;
    debug!(response = %json, "sending response");
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcribe::MockCaptionProvider;
    use serde_json::json;
    use tokio::io::BufReader;

    fn server() -> McpServer<MockCaptionProvider> {
        let mut provider = MockCaptionProvider::new();
        provider.expect_fetch().never();
        McpServer::new(provider)
    }

    async fn respond(server: &McpServer<MockCaptionProvider>, line: &str) -> Option<Value> {
        server
            .handle_line(line)
            .await
            .map(|response| serde_json::to_value(response).unwrap())
    }

    async fn run_lines(input: &[u8]) -> Vec<Value> {
        let reader = tokio_test::io::Builder::new().read(input).build();
        let mut output = Vec::new();
        server().run(BufReader::new(reader), &mut output).await.unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = respond(&server(), r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(response["result"]["capabilities"], json!({"tools": {}}));
        assert_eq!(response["result"]["serverInfo"]["name"], "youtube-transcript-mcp");
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let server = server();
        assert!(respond(&server, r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).await.is_none());
        assert!(respond(&server, r#"{"jsonrpc":"2.0","method":"tools/list"}"#).await.is_none());
        assert!(respond(&server, r#"{"jsonrpc":"2.0","method":"foo/bar"}"#).await.is_none());
        assert!(respond(&server, r#"{"jsonrpc":"2.0","method":"tools/call","params":{"name":"get_video_transcript"}}"#)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = respond(&server(), r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#)
            .await
            .unwrap();
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "extract_video_id");
        assert!(tools[1]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_tools_call_wraps_tool_result() {
        let response = respond(
            &server(),
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"get_video_transcript","arguments":{}}}"#,
        )
        .await
        .unwrap();

        assert_eq!(response["id"], 3);
        assert!(response.get("error").is_none());
        assert_eq!(
            response["result"],
            json!({"content": [{"type": "text", "text": "Error: video_id is required"}], "isError": true})
        );
    }

    #[tokio::test]
    async fn test_null_id_is_answered() {
        let server = server();

        let response = respond(&server, r#"{"jsonrpc":"2.0","id":null,"method":"tools/list"}"#)
            .await
            .unwrap();
        assert!(response["id"].is_null());
        assert_eq!(response["result"]["tools"].as_array().unwrap().len(), 2);

        let response = respond(&server, r#"{"jsonrpc":"2.0","id":null,"method":"foo/bar"}"#)
            .await
            .unwrap();
        assert_eq!(
            response,
            json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32601, "message": "Method not found"}})
        );
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = respond(&server(), r#"{"jsonrpc":"2.0","id":42,"method":"foo/bar"}"#)
            .await
            .unwrap();
        assert_eq!(
            response,
            json!({"jsonrpc": "2.0", "id": 42, "error": {"code": -32601, "message": "Method not found"}})
        );
    }

    #[tokio::test]
    async fn test_malformed_lines() {
        let server = server();

        let response = respond(&server, "{not json").await.unwrap();
        assert_eq!(response["error"]["code"], -32603);
        assert!(response["id"].is_null());

        // id is recovered when the object parses but is not a request
        let response = respond(&server, r#"{"id":9,"method":12}"#).await.unwrap();
        assert_eq!(response["error"]["code"], -32603);
        assert_eq!(response["id"], 9);

        let response = respond(&server, r#"{"id":10,"method":"tools/call","params":"oops"}"#).await.unwrap();
        assert_eq!(response["error"]["code"], -32603);
        assert_eq!(response["id"], 10);
    }

    #[tokio::test]
    async fn test_run_continues_after_bad_lines() {
        let input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\"}\n\
                      {\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n\
                      this is not json\n\
                      \xff\xfe\n\
                      {\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n";

        let responses = run_lines(input).await;
        assert_eq!(responses.len(), 4);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["error"]["code"], -32603);
        assert_eq!(responses[2]["error"]["code"], -32603);
        assert_eq!(responses[3]["id"], 2);
        assert_eq!(responses[3]["result"]["tools"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_run_handles_final_line_without_newline() {
        let responses = run_lines(br#"{"jsonrpc":"2.0","id":"last","method":"initialize"}"#).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], "last");
    }
}
