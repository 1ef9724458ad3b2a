//! Quick offline test of the dispatch loop with toy tools.
//!
//! Run with: cargo run --example toy_tools

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dispatch::{Dispatcher, LanguageModel, Tool, ToolError, ToolRegistry};
use serde_json::{Map, Value, json};

/// Stand-in model that replays a fixed script, so the example runs without
/// an API key.
struct ScriptedModel {
    replies: Vec<&'static str>,
    next: Mutex<usize>,
}

impl LanguageModel for ScriptedModel {
    async fn generate(&self, _transcript: &str) -> dispatch::Result<String> {
        let mut next = self.next.lock().unwrap();
        let reply = self.replies[(*next).min(self.replies.len() - 1)];
        *next += 1;
        Ok(reply.to_string())
    }
}

struct AddTool;

#[async_trait]
impl Tool for AddTool {
    fn name(&self) -> &str {
        "add"
    }

    fn description(&self) -> &str {
        "Add two integers"
    }

    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let a = args
            .get("a")
            .and_then(Value::as_i64)
            .ok_or_else(|| ToolError::InvalidArguments("missing 'a'".into()))?;
        let b = args
            .get("b")
            .and_then(Value::as_i64)
            .ok_or_else(|| ToolError::InvalidArguments("missing 'b'".into()))?;
        Ok(json!({"sum": a + b}))
    }
}

struct GreetTool;

#[async_trait]
impl Tool for GreetTool {
    fn name(&self) -> &str {
        "greet"
    }

    fn description(&self) -> &str {
        "Greet someone by name"
    }

    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let name = args
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("missing 'name'".into()))?;
        Ok(json!({"message": format!("Hello, {name}!")}))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Testing the dispatch loop with toy tools...\n");

    let model = ScriptedModel {
        replies: vec![
            r#"{"action": "greet", "args": {"name": "Haron"}}"#,
            r#"{"action": "add", "args": {"a": 5, "b": 7}}"#,
            r#"{"action": "done", "result": "Greeted Haron; 5 + 7 = 12."}"#,
        ],
        next: Mutex::new(0),
    };

    let tools = ToolRegistry::new()
        .with_tool(Arc::new(AddTool))
        .with_tool(Arc::new(GreetTool));

    println!("Registered tools:");
    for name in tools.names() {
        println!("  - {name}");
    }

    let dispatcher = Dispatcher::new(model, "Reply ONLY with JSON directives.").with_max_steps(4);

    let outcome = dispatcher
        .run("Can you greet Haron and then add 5+7?", &tools)
        .await?;

    println!("\nFINAL RESULT: {outcome}");
    Ok(())
}
