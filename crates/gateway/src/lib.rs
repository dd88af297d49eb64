//! Transport adapter for mcremote.
//!
//! Speaks newline-delimited JSON-RPC 2.0 with the orchestrator: one request
//! per line in, one response per line out. Supports the MCP handshake
//! (`initialize`, `notifications/initialized`), `ping`, `tools/list` and
//! `tools/call`. Requests are served one at a time in arrival order.
//!
//! stdout carries protocol frames only; all diagnostics go through `tracing`.

pub mod protocol;

use mcremote_config::ServerConfig;
use mcremote_core::{ToolCall, ToolError, ToolRegistry, ToolResponse};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::protocol::{CallParams, INTERNAL_ERROR, JsonRpcError, JsonRpcRequest, JsonRpcResponse};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("I/O error on the protocol stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The JSON-RPC front of the tool registry.
pub struct McpServer {
    registry: ToolRegistry,
    info: ServerConfig,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, info: ServerConfig) -> Self {
        Self { registry, info }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve process stdin/stdout until stdin closes.
    pub async fn serve_stdio(&self) -> Result<(), GatewayError> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve requests read from `reader`, writing responses to `writer`,
    /// until the reader reaches EOF.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<(), GatewayError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        // Raw bytes: a line that is not UTF-8 is a parse error, not an I/O error.
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = buf.trim_ascii();
            if line.is_empty() {
                continue;
            }
            let Some(response) = self.handle_frame(line).await else {
                continue;
            };
            let mut frame = serde_json::to_string(&response)?;
            frame.push('\n');
            writer.write_all(frame.as_bytes()).await?;
            writer.flush().await?;
        }
        info!("Input stream closed, stopping");
        Ok(())
    }

    /// Handle one request line. Notifications produce no response.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        self.handle_frame(line.as_bytes()).await
    }

    async fn handle_frame(&self, frame: &[u8]) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_slice(frame) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Unparseable request line");
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::parse_error(e),
                ));
            }
        };
        let id = value.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Malformed request");
                return Some(JsonRpcResponse::failure(
                    id.unwrap_or(Value::Null),
                    JsonRpcError::invalid_request(e),
                ));
            }
        };

        debug!(method = %request.method, id = ?request.id, "Request");
        let notification = request.is_notification();
        let result = self.handle_method(&request.method, request.params).await;
        if notification {
            if let Err(e) = result {
                debug!(code = e.code, message = %e.message, "Notification not handled");
            }
            return None;
        }

        let id = request.id.unwrap_or(Value::Null);
        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    async fn handle_method(&self, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": self.info.name,
                    "version": self.info.version
                }
            })),
            "notifications/initialized" => {
                info!("Client initialized");
                Ok(json!({}))
            }
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.registry.definitions() })),
            "tools/call" => {
                let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
                let params: CallParams = serde_json::from_value(params)
                    .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {e}")))?;
                let response = self.call_tool(params).await;
                serde_json::to_value(response)
                    .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("Serialization error: {e}")))
            }
            _ => Err(JsonRpcError::method_not_found(method)),
        }
    }

    async fn call_tool(&self, params: CallParams) -> ToolResponse {
        let call = ToolCall {
            name: params.name,
            arguments: params.arguments,
        };
        match self.registry.execute(&call).await {
            Ok(outcome) => {
                debug!(tool = %call.name, is_error = outcome.is_error(), "Tool finished");
                outcome.into_response()
            }
            Err(e) => {
                match &e {
                    ToolError::NotFound(_) => warn!(tool = %call.name, "Unknown tool"),
                    _ => warn!(tool = %call.name, error = %e, "Tool call rejected"),
                }
                ToolResponse::error(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mcremote_core::tool::parse_args;
    use mcremote_core::{Tool, ToolOutcome};
    use serde::Deserialize;
    use tokio::io::AsyncReadExt;

    struct GreetTool;

    #[derive(Deserialize)]
    struct GreetArgs {
        name: String,
    }

    #[async_trait]
    impl Tool for GreetTool {
        fn name(&self) -> &str {
            "greet"
        }
        fn description(&self) -> &str {
            "Says hello"
        }
        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": { "name": { "type": "string" } },
                "required": ["name"]
            })
        }
        async fn execute(&self, arguments: Value) -> Result<ToolOutcome, ToolError> {
            let args: GreetArgs = parse_args(self.name(), arguments)?;
            if args.name == "boom" {
                return Ok(ToolOutcome::failed("it exploded"));
            }
            Ok(ToolOutcome::ok(format!("Hello, {}", args.name)))
        }
    }

    struct AlphaTool;

    #[async_trait]
    impl Tool for AlphaTool {
        fn name(&self) -> &str {
            "alpha"
        }
        fn description(&self) -> &str {
            "First in line"
        }
        fn parameters_schema(&self) -> Value {
            json!({ "type": "object", "properties": {} })
        }
        async fn execute(&self, _arguments: Value) -> Result<ToolOutcome, ToolError> {
            Ok(ToolOutcome::NotConnected)
        }
    }

    fn server() -> McpServer {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(GreetTool));
        registry.register(Box::new(AlphaTool));
        McpServer::new(registry, ServerConfig::default())
    }

    async fn call(server: &McpServer, request: Value) -> JsonRpcResponse {
        server
            .handle_line(&request.to_string())
            .await
            .expect("request should be answered")
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let resp = call(&server(), json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}})).await;
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "MinecraftRemote");
        assert_eq!(result["serverInfo"]["version"], "0.1.0");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let server = server();
        let line = json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string();
        assert!(server.handle_line(&line).await.is_none());
        let unknown = json!({"jsonrpc": "2.0", "method": "notifications/cancelled"}).to_string();
        assert!(server.handle_line(&unknown).await.is_none());
    }

    #[tokio::test]
    async fn ping_answers_empty_object() {
        let resp = call(&server(), json!({"jsonrpc": "2.0", "id": "p", "method": "ping"})).await;
        assert_eq!(resp.id, json!("p"));
        assert_eq!(resp.result, Some(json!({})));
    }

    #[tokio::test]
    async fn tools_are_listed_by_name() {
        let resp = call(&server(), json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
        let tools = resp.result.unwrap()["tools"].clone();
        assert_eq!(tools[0]["name"], "alpha");
        assert_eq!(tools[1]["name"], "greet");
        assert_eq!(tools[1]["inputSchema"]["required"][0], "name");
    }

    #[tokio::test]
    async fn successful_call_has_no_error_flag() {
        let resp = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                   "params": {"name": "greet", "arguments": {"name": "Alex"}}}),
        )
        .await;
        assert_eq!(
            resp.result,
            Some(json!({"content": [{"type": "text", "text": "Hello, Alex"}]}))
        );
    }

    #[tokio::test]
    async fn failed_outcome_sets_is_error() {
        let resp = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
                   "params": {"name": "greet", "arguments": {"name": "boom"}}}),
        )
        .await;
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Error: it exploded");
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_envelope() {
        let resp = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call",
                   "params": {"name": "fly", "arguments": {}}}),
        )
        .await;
        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Error: Tool not found: fly");
    }

    #[tokio::test]
    async fn schema_violation_is_an_error_envelope() {
        let resp = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call",
                   "params": {"name": "greet", "arguments": {"name": 7}}}),
        )
        .await;
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("Error: Invalid arguments for greet"));
    }

    #[tokio::test]
    async fn missing_arguments_default_to_empty() {
        let resp = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {"name": "alpha"}}),
        )
        .await;
        assert_eq!(
            resp.result.unwrap()["content"][0]["text"],
            "Not connected to any server. Connect first."
        );
    }

    #[tokio::test]
    async fn protocol_errors() {
        let server = server();

        let resp = server.handle_line("{not json").await.unwrap();
        assert_eq!(resp.error.unwrap().code, protocol::PARSE_ERROR);
        assert_eq!(resp.id, Value::Null);

        // Well-formed JSON, but not a request object.
        let resp = call(&server, json!({"jsonrpc": "2.0", "id": 10})).await;
        assert_eq!(resp.error.unwrap().code, protocol::INVALID_REQUEST);
        assert_eq!(resp.id, json!(10));

        let resp = call(&server, json!([1, 2, 3])).await;
        assert_eq!(resp.error.unwrap().code, protocol::INVALID_REQUEST);
        assert_eq!(resp.id, Value::Null);

        let resp = call(&server, json!({"jsonrpc": "2.0", "id": 8, "method": "resources/list"})).await;
        assert_eq!(resp.error.unwrap().code, protocol::METHOD_NOT_FOUND);

        let resp = call(&server, json!({"jsonrpc": "2.0", "id": 9, "method": "tools/call"})).await;
        assert_eq!(resp.error.unwrap().code, protocol::INVALID_PARAMS);
        assert_eq!(resp.id, json!(9));
    }

    #[tokio::test]
    async fn serve_answers_line_by_line_until_eof() {
        let server = server();
        let input = [
            json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}).to_string(),
            String::new(),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                   "params": {"name": "greet", "arguments": {"name": "Steve"}}})
            .to_string(),
        ]
        .join("\n");

        let (mut client, transport) = tokio::io::duplex(64 * 1024);
        let (read_half, write_half) = tokio::io::split(transport);
        client.write_all(input.as_bytes()).await.unwrap();
        client.shutdown().await.unwrap();

        server
            .serve(BufReader::new(read_half), write_half)
            .await
            .unwrap();

        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        let frames: Vec<JsonRpcResponse> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].id, json!(1));
        assert_eq!(frames[1].result.as_ref().unwrap()["content"][0]["text"], "Hello, Steve");
    }

    #[tokio::test]
    async fn serve_survives_a_line_that_is_not_utf8() {
        let server = server();
        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}).to_string().as_bytes());
        input.push(b'\n');

        let (mut client, transport) = tokio::io::duplex(64 * 1024);
        let (read_half, write_half) = tokio::io::split(transport);
        client.write_all(&input).await.unwrap();
        client.shutdown().await.unwrap();

        server
            .serve(BufReader::new(read_half), write_half)
            .await
            .unwrap();

        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        let frames: Vec<JsonRpcResponse> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].error.as_ref().unwrap().code, protocol::PARSE_ERROR);
        assert_eq!(frames[0].id, Value::Null);
        assert_eq!(frames[1].id, json!(1));
        assert_eq!(frames[1].result, Some(json!({})));
    }
}
