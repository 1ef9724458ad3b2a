//! Tool registry: the named capabilities a model may invoke.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors a tool can signal.
///
/// These never cross the dispatch boundary as errors: the loop captures
/// them as error-shaped result payloads and feeds them back to the model.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum ToolError {
    /// The argument object did not match the shape this tool expects.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool's upstream call (HTTP API, etc.) failed.
    #[error("upstream error: {0}")]
    Upstream(String),
}

/// A named capability invokable by the model.
///
/// Implementations validate and coerce their own argument shapes (the
/// dispatch loop does not check arity) and must be safe for concurrent
/// invocation, since one registry can serve independent loop runs.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The action name the model uses to request this tool.
    fn name(&self) -> &str;

    /// One-line description, for instruction text and diagnostics.
    fn description(&self) -> &str;

    /// Invoke with the directive's argument object, returning a
    /// JSON-serializable result.
    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError>;
}

/// Mapping from tool name to capability.
///
/// Built once by the caller and borrowed immutably for the duration of a
/// dispatch run.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, keyed by its own name. Replaces any previous tool with
    /// the same name.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Whether a tool with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the arguments back"
        }

        async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
            Ok(Value::Object(args))
        }
    }

    #[test]
    fn register_and_look_up() {
        let registry = ToolRegistry::new().with_tool(Arc::new(EchoTool));
        assert!(registry.contains("echo"));
        assert!(!registry.contains("shout"));
        assert_eq!(registry.names(), vec!["echo"]);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn call_through_registry() {
        let registry = ToolRegistry::new().with_tool(Arc::new(EchoTool));
        let mut args = Map::new();
        args.insert("a".into(), json!(1));

        let tool = registry.get("echo").unwrap();
        let result = tool.call(args).await.unwrap();
        assert_eq!(result, json!({"a": 1}));
    }

    #[test]
    fn tool_error_display() {
        let err = ToolError::InvalidArguments("missing 'lat'".into());
        assert_eq!(err.to_string(), "invalid arguments: missing 'lat'");

        let err = ToolError::Upstream("503 from forecast API".into());
        assert_eq!(err.to_string(), "upstream error: 503 from forecast API");
    }
}
