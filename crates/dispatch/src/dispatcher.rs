//! The bounded tool-calling dispatch loop.

use crate::Result;
use crate::backend::LanguageModel;
use crate::directive::{Step, extract_directive};
use crate::registry::ToolRegistry;
use crate::scrub::scrub_coordinates;
use serde_json::{Value, json};
use storage::{EventKind, SessionLog};
use tracing::{debug, warn};

/// Default number of model turns before a run is abandoned.
pub const DEFAULT_MAX_STEPS: u32 = 4;

/// Conversation transcript: the sole state threaded between iterations.
///
/// An append-only sequence of text segments (instruction, user prompt,
/// each model reply, each tool-result annotation), rendered in full for
/// every model call. Owned by one dispatch run and dropped when it returns.
#[derive(Debug, Clone)]
struct Transcript {
    segments: Vec<String>,
}

impl Transcript {
    fn new(instruction: &str, user_prompt: &str) -> Self {
        Self {
            segments: vec![instruction.to_string(), format!("User: {user_prompt}")],
        }
    }

    fn push_reply(&mut self, reply: &str) {
        self.segments.push(reply.to_string());
    }

    fn push_tool_record(&mut self, name: &str, result: &Value) {
        self.segments.push(format!("ToolResult {name}: {result}"));
    }

    fn render(&self) -> String {
        self.segments.join("\n\n")
    }
}

/// Terminal result of a dispatch run.
///
/// The three error variants are structurally uniform in their JSON
/// projection (`error` discriminant plus diagnostics), so callers branch on
/// one discriminant. Model transport faults are *not* outcomes; they
/// surface as [`crate::Error`] through `Result`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The model signalled completion; `result` is the final text.
    Done { result: String },
    /// The reply contained no recoverable JSON directive. Carries the raw
    /// (untrimmed) reply for diagnosis. Not retried within the run.
    ParseFailed { raw: String },
    /// The directive named an action that is neither `done` nor a
    /// registered tool. Carries the full parsed directive.
    UnknownAction { directive: Value },
    /// The conversation did not converge within the step budget.
    MaxStepsExceeded,
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done { .. })
    }

    /// The JSON projection of this outcome: `{"done": true, "result": ...}`
    /// on success, `{"error": "<kind>", ...}` otherwise.
    pub fn to_value(&self) -> Value {
        match self {
            Outcome::Done { result } => json!({"done": true, "result": result}),
            Outcome::ParseFailed { raw } => json!({"error": "parse_failed", "raw": raw}),
            Outcome::UnknownAction { directive } => {
                json!({"error": "unknown_action", "raw": directive})
            }
            Outcome::MaxStepsExceeded => json!({"error": "max_steps_exceeded"}),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// The bounded dispatch loop.
///
/// Conducts a turn-based exchange with a language model constrained to the
/// JSON directive protocol, executing requested tools and feeding their
/// serialized results back until the model finishes, the protocol breaks,
/// or the step ceiling is hit. One parameterized component serves every
/// call site; only the instruction text, step ceiling, and result
/// scrubbing differ between configurations.
///
/// A run is strictly sequential: each iteration's model call is a blocking
/// request-response exchange, and iteration N's transcript is a strict
/// precondition for iteration N+1. Independent runs share no mutable state.
/// Nothing is retried at any level; callers wanting resilience re-invoke
/// the run.
pub struct Dispatcher<M> {
    model: M,
    instruction: String,
    max_steps: u32,
    scrub_result: bool,
}

impl<M: LanguageModel> Dispatcher<M> {
    /// Create a dispatcher with the given model and instruction text.
    pub fn new(model: M, instruction: impl Into<String>) -> Self {
        Self {
            model,
            instruction: instruction.into(),
            max_steps: DEFAULT_MAX_STEPS,
            scrub_result: false,
        }
    }

    /// Set the step ceiling (model turns per run).
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Scrub coordinate leakage from the final result text.
    pub fn with_result_scrubbing(mut self, scrub: bool) -> Self {
        self.scrub_result = scrub;
        self
    }

    /// Run the loop against a user prompt.
    pub async fn run(&self, user_prompt: &str, tools: &ToolRegistry) -> Result<Outcome> {
        self.run_inner(user_prompt, tools, None).await
    }

    /// Run the loop, recording prompt, replies, tool traffic, and the
    /// terminal outcome to a session log. The log is an observer; it never
    /// alters control flow.
    pub async fn run_logged(
        &self,
        user_prompt: &str,
        tools: &ToolRegistry,
        log: &SessionLog,
    ) -> Result<Outcome> {
        self.run_inner(user_prompt, tools, Some(log)).await
    }

    async fn run_inner(
        &self,
        user_prompt: &str,
        tools: &ToolRegistry,
        log: Option<&SessionLog>,
    ) -> Result<Outcome> {
        let mut transcript = Transcript::new(&self.instruction, user_prompt);
        if let Some(log) = log {
            log.append(EventKind::Prompt {
                content: user_prompt.to_string(),
            })?;
        }

        for step in 0..self.max_steps {
            let reply = self.model.generate(&transcript.render()).await?;
            let trimmed = reply.trim();
            debug!(step, reply_len = trimmed.len(), "model reply received");
            if let Some(log) = log {
                log.append(EventKind::ModelReply {
                    content: trimmed.to_string(),
                })?;
            }

            let directive = match extract_directive(trimmed) {
                Ok(directive) => directive,
                Err(e) => {
                    warn!(step, error = %e, "reply carried no usable directive");
                    return finish(log, Outcome::ParseFailed { raw: reply });
                }
            };
            transcript.push_reply(trimmed);

            match directive.step() {
                Some(Step::Done { result }) => {
                    let result = if self.scrub_result {
                        scrub_coordinates(&result)
                    } else {
                        result
                    };
                    debug!(step, "model signalled done");
                    return finish(log, Outcome::Done { result });
                }
                Some(Step::Invoke { name, args }) => {
                    let Some(tool) = tools.get(&name) else {
                        warn!(step, action = %name, "directive named an unregistered action");
                        return finish(
                            log,
                            Outcome::UnknownAction {
                                directive: directive.into_value(),
                            },
                        );
                    };

                    if let Some(log) = log {
                        log.append(EventKind::ToolCall {
                            name: name.clone(),
                            args: Value::Object(args.clone()),
                        })?;
                    }

                    // A failing tool must never abort the run: capture the
                    // error as a result payload and let the model adapt.
                    let result = match tool.call(args).await {
                        Ok(value) => value,
                        Err(e) => {
                            warn!(step, tool = %name, error = %e, "tool invocation failed");
                            json!({"error": e.to_string()})
                        }
                    };

                    if let Some(log) = log {
                        log.append(EventKind::ToolResult {
                            name: name.clone(),
                            output: result.clone(),
                        })?;
                    }
                    transcript.push_tool_record(&name, &result);
                }
                None => {
                    warn!(step, "directive carried no action");
                    return finish(
                        log,
                        Outcome::UnknownAction {
                            directive: directive.into_value(),
                        },
                    );
                }
            }
        }

        warn!(max_steps = self.max_steps, "step budget exhausted");
        finish(log, Outcome::MaxStepsExceeded)
    }
}

fn finish(log: Option<&SessionLog>, outcome: Outcome) -> Result<Outcome> {
    if let Some(log) = log {
        log.append(EventKind::PlanOutcome {
            outcome: outcome.to_value(),
        })?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Tool, ToolError};
    use async_trait::async_trait;
    use serde_json::Map;
    use std::sync::{Arc, Mutex};
    use storage::EventStore;

    /// Replays a fixed reply script and records every prompt it was given.
    struct ScriptedModel {
        replies: Vec<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: replies.iter().map(|r| r.to_string()).collect(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        fn prompt(&self, index: usize) -> String {
            self.prompts.lock().unwrap()[index].clone()
        }
    }

    impl LanguageModel for ScriptedModel {
        async fn generate(&self, transcript: &str) -> Result<String> {
            let mut prompts = self.prompts.lock().unwrap();
            // Past the end of the script, keep replaying the last reply.
            let reply = self
                .replies
                .get(prompts.len())
                .or(self.replies.last())
                .cloned()
                .unwrap_or_default();
            prompts.push(transcript.to_string());
            Ok(reply)
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

        async fn call(&self, args: Map<String, Value>) -> std::result::Result<Value, ToolError> {
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

    struct FlakyTool;

    #[async_trait]
    impl Tool for FlakyTool {
        fn name(&self) -> &str {
            "flaky"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        async fn call(&self, _args: Map<String, Value>) -> std::result::Result<Value, ToolError> {
            Err(ToolError::Upstream("boom".into()))
        }
    }

    fn add_registry() -> ToolRegistry {
        ToolRegistry::new().with_tool(Arc::new(AddTool))
    }

    #[tokio::test]
    async fn tool_call_then_done() {
        let model = ScriptedModel::new(&[
            r#"{"action": "add", "args": {"a": 5, "b": 7}}"#,
            r#"{"action": "done", "result": "12"}"#,
        ]);
        let dispatcher = Dispatcher::new(&model, "Reply ONLY with JSON.");

        let outcome = dispatcher.run("add 5 and 7", &add_registry()).await.unwrap();
        assert!(outcome.is_done());
        assert_eq!(outcome, Outcome::Done { result: "12".into() });

        // The serialized tool result sits in the transcript between the
        // first and second model calls.
        assert_eq!(model.calls(), 2);
        assert!(!model.prompt(0).contains("ToolResult"));
        assert!(model.prompt(1).contains(r#"ToolResult add: {"sum":12}"#));
    }

    #[tokio::test]
    async fn model_replies_accumulate_in_transcript() {
        let model = ScriptedModel::new(&[
            r#"{"action": "add", "args": {"a": 1, "b": 2}}"#,
            r#"{"action": "done", "result": "3"}"#,
        ]);
        let dispatcher = Dispatcher::new(&model, "Reply ONLY with JSON.");

        dispatcher.run("add", &add_registry()).await.unwrap();
        assert!(model.prompt(1).contains(r#"{"action": "add""#));
    }

    #[tokio::test]
    async fn unknown_action_terminates_first_iteration() {
        let model = ScriptedModel::new(&[r#"{"action": "levitate", "args": {}}"#]);
        let dispatcher = Dispatcher::new(&model, "Reply ONLY with JSON.");

        let outcome = dispatcher.run("up please", &add_registry()).await.unwrap();
        match outcome {
            Outcome::UnknownAction { directive } => {
                assert_eq!(directive, json!({"action": "levitate", "args": {}}));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn missing_action_is_unknown_action() {
        let model = ScriptedModel::new(&[r#"{"args": {"a": 1}}"#]);
        let dispatcher = Dispatcher::new(&model, "Reply ONLY with JSON.");

        let outcome = dispatcher.run("hm", &add_registry()).await.unwrap();
        assert!(matches!(outcome, Outcome::UnknownAction { .. }));
    }

    #[tokio::test]
    async fn step_budget_bounds_model_calls() {
        // Never says done; must be cut off after exactly three turns.
        let model = ScriptedModel::new(&[r#"{"action": "add", "args": {"a": 1, "b": 1}}"#]);
        let dispatcher = Dispatcher::new(&model, "Reply ONLY with JSON.").with_max_steps(3);

        let outcome = dispatcher.run("loop forever", &add_registry()).await.unwrap();
        assert_eq!(outcome, Outcome::MaxStepsExceeded);
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn parse_failure_returns_untrimmed_reply() {
        let model = ScriptedModel::new(&["  no directive in sight  "]);
        let dispatcher = Dispatcher::new(&model, "Reply ONLY with JSON.");

        let outcome = dispatcher.run("hello", &add_registry()).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::ParseFailed {
                raw: "  no directive in sight  ".into()
            }
        );
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn failing_tool_does_not_abort_the_run() {
        let model = ScriptedModel::new(&[
            r#"{"action": "flaky", "args": {}}"#,
            r#"{"action": "done", "result": "recovered"}"#,
        ]);
        let tools = ToolRegistry::new().with_tool(Arc::new(FlakyTool));
        let dispatcher = Dispatcher::new(&model, "Reply ONLY with JSON.");

        let outcome = dispatcher.run("try it", &tools).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Done {
                result: "recovered".into()
            }
        );
        assert!(
            model
                .prompt(1)
                .contains(r#"ToolResult flaky: {"error":"upstream error: boom"}"#)
        );
    }

    #[tokio::test]
    async fn done_without_result_yields_empty_string() {
        let model = ScriptedModel::new(&[r#"{"action": "done"}"#]);
        let dispatcher = Dispatcher::new(&model, "Reply ONLY with JSON.");

        let outcome = dispatcher.run("quick", &add_registry()).await.unwrap();
        assert_eq!(outcome, Outcome::Done { result: String::new() });
    }

    #[tokio::test]
    async fn scrubbing_applies_only_when_configured() {
        let reply = r#"{"action": "done", "result": "Visit the Forum (Lat: 41.89, Lng: 12.48) at dawn."}"#;

        let model = ScriptedModel::new(&[reply]);
        let plain = Dispatcher::new(&model, "i");
        let outcome = plain.run("go", &add_registry()).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Done {
                result: "Visit the Forum (Lat: 41.89, Lng: 12.48) at dawn.".into()
            }
        );

        let model = ScriptedModel::new(&[reply]);
        let scrubbed = Dispatcher::new(&model, "i").with_result_scrubbing(true);
        let outcome = scrubbed.run("go", &add_registry()).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Done {
                result: "Visit the Forum  at dawn.".into()
            }
        );
    }

    #[tokio::test]
    async fn logged_run_records_the_exchange() {
        let model = ScriptedModel::new(&[
            r#"{"action": "add", "args": {"a": 5, "b": 7}}"#,
            r#"{"action": "done", "result": "12"}"#,
        ]);
        let dispatcher = Dispatcher::new(&model, "Reply ONLY with JSON.");
        let log = SessionLog::begin(EventStore::in_memory().unwrap()).unwrap();
        let id = log.id();

        dispatcher
            .run_logged("add 5 and 7", &add_registry(), &log)
            .await
            .unwrap();

        let store = log.end().unwrap();
        let kinds: Vec<&str> = store
            .load_session(id)
            .unwrap()
            .iter()
            .map(|e| match &e.kind {
                EventKind::SessionStart => "start",
                EventKind::Prompt { .. } => "prompt",
                EventKind::ModelReply { .. } => "reply",
                EventKind::ToolCall { .. } => "call",
                EventKind::ToolResult { .. } => "result",
                EventKind::PlanOutcome { .. } => "outcome",
                EventKind::SessionEnd => "end",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["start", "prompt", "reply", "call", "result", "reply", "outcome", "end"]
        );
    }

    #[test]
    fn outcome_projections() {
        assert_eq!(
            Outcome::Done { result: "ok".into() }.to_value(),
            json!({"done": true, "result": "ok"})
        );
        assert_eq!(
            Outcome::MaxStepsExceeded.to_value(),
            json!({"error": "max_steps_exceeded"})
        );
        assert_eq!(
            Outcome::ParseFailed { raw: "???".into() }.to_value(),
            json!({"error": "parse_failed", "raw": "???"})
        );
    }
}
