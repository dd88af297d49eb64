//! Tool trait: the abstraction over remotely callable game actions.
//!
//! Each action (connect, moveTo, openContainer, ...) implements this trait.
//! Tools are registered in the [`ToolRegistry`] once at startup and looked up
//! by name for every incoming call.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ToolError;
use crate::outcome::ToolOutcome;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// A tool definition advertised to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,

    pub description: String,

    /// JSON Schema describing the tool's input
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique wire name of this tool (e.g., "moveTo").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the orchestrator).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError>;

    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

/// Deserialize tool arguments into a typed struct.
///
/// A missing or `null` argument object is treated as `{}` so that tools with
/// only optional fields can be called bare.
pub fn parse_args<T: DeserializeOwned>(tool_name: &str, arguments: serde_json::Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool_name: tool_name.to_string(),
        reason: e.to_string(),
    })
}

/// The dispatch table of available tools, ordered by name.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All tool definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool call.
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutcome, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        tracing::debug!(tool = %call.name, "Dispatching tool call");
        tool.execute(call.arguments.clone()).await
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[derive(Deserialize)]
    struct EchoArgs {
        text: String,
        #[serde(default = "default_times")]
        times: usize,
    }

    fn default_times() -> usize {
        1
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" },
                    "times": { "type": "number", "default": 1 }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
            let args: EchoArgs = parse_args(self.name(), arguments)?;
            Ok(ToolOutcome::ok(args.text.repeat(args.times)))
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn definitions_use_input_schema_key() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let json = serde_json::to_value(&registry.definitions()[0]).unwrap();
        assert_eq!(json["name"], "echo");
        assert_eq!(json["inputSchema"]["required"][0], "text");
    }

    #[tokio::test]
    async fn registry_execute_applies_defaults() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let call = ToolCall {
            name: "echo".into(),
            arguments: serde_json::json!({"text": "hello"}),
        };
        let outcome = registry.execute(&call).await.unwrap();
        assert_eq!(outcome, ToolOutcome::ok("hello"));
    }

    #[tokio::test]
    async fn registry_execute_missing_tool() {
        let registry = ToolRegistry::new();
        let call = ToolCall {
            name: "nonexistent".into(),
            arguments: serde_json::json!({}),
        };
        let err = registry.execute(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn schema_violation_is_invalid_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let call = ToolCall {
            name: "echo".into(),
            arguments: serde_json::json!({"text": 42}),
        };
        let err = registry.execute(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[test]
    fn null_arguments_parse_as_empty_object() {
        #[derive(Deserialize)]
        struct NoArgs {}
        let parsed: Result<NoArgs, _> = parse_args("noop", serde_json::Value::Null);
        assert!(parsed.is_ok());
    }
}
