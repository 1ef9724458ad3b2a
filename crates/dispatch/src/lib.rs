//! Dragoman dispatch core — the bounded tool-calling loop.
//!
//! This crate conducts a turn-based exchange with a language model that must
//! reply in a constrained JSON protocol: each reply either requests a named
//! tool invocation or signals completion. The loop executes the requested
//! tool, feeds the serialized result back into the conversation transcript,
//! and iterates until the model finishes, an unrecoverable protocol error
//! occurs, or the step budget runs out.
//!
//! # Overview
//!
//! - **[`Dispatcher`]**: the loop itself. One parameterized component serves
//!   every call site; instruction text, step ceiling, and result scrubbing
//!   vary per configuration.
//! - **[`LanguageModel`]**: a hosted model behind a text-in/text-out trait.
//!   [`GeminiBackend`] is the production implementation.
//! - **[`ToolRegistry`]**: named capabilities the model may invoke, each
//!   validating its own argument shapes.
//! - **[`Outcome`]**: the loop's sole return value, either completion with
//!   final text or one of three uniform protocol errors.
//!
//! # Example
//!
//! ```ignore
//! use dispatch::{Dispatcher, GeminiBackend, ToolRegistry};
//!
//! # async fn example() -> dispatch::Result<()> {
//! let model = GeminiBackend::from_env()?;
//! let tools = ToolRegistry::new(); // populate with Arc<dyn Tool> entries
//!
//! let dispatcher = Dispatcher::new(model, "Reply ONLY with JSON directives.")
//!     .with_max_steps(4);
//!
//! let outcome = dispatcher.run("Plan a 3-day trip to Rome", &tools).await?;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

mod backend;
mod directive;
mod dispatcher;
mod error;
mod registry;
mod scrub;

pub use backend::{GeminiBackend, GeminiBackendBuilder, LanguageModel};
pub use directive::{DONE_ACTION, Directive, MalformedResponse, Step, extract_directive};
pub use dispatcher::{DEFAULT_MAX_STEPS, Dispatcher, Outcome};
pub use error::{Error, Result};
pub use registry::{Tool, ToolError, ToolRegistry};
pub use scrub::scrub_coordinates;
