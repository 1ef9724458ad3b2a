//! SQLite-backed event storage for Dragoman planning sessions.
//!
//! Every planning session leaves an append-only trail: the prompt that
//! started it, each model reply, each tool call and its result, the geocoded
//! destination, and the terminal outcome. The trail answers "why did the
//! planner suggest that?" after the fact and backs the `dragoman sessions` /
//! `dragoman logs` commands.
//!
//! # Core Concepts
//!
//! ## EventStore
//!
//! The [`EventStore`] wraps a SQLite database and provides methods to append
//! events and query session history.
//!
//! ## Event
//!
//! An [`Event`] is one thing that happened during a session: a unique id,
//! the owning [`SessionId`], a timestamp, and an [`EventKind`] payload.
//!
//! ## SessionLog
//!
//! A [`SessionLog`] couples a store with a freshly minted session id and
//! takes care of the start/end lifecycle events, so callers only append
//! domain events.
//!
//! # Example
//!
//! ```no_run
//! use storage::{EventKind, EventStore, SessionLog};
//!
//! let store = EventStore::open("events.db")?;
//! let log = SessionLog::begin(store)?;
//!
//! log.append(EventKind::Prompt {
//!     content: "Plan a 3-day trip to Rome".into(),
//! })?;
//! log.append(EventKind::Geocoded {
//!     place: "Rome".into(),
//!     lat: 41.8902,
//!     lng: 12.4922,
//! })?;
//!
//! let id = log.id();
//! let store = log.end()?;
//! let events = store.load_session(id)?;
//! for event in events {
//!     println!("{}: {:?}", event.timestamp, event.kind);
//! }
//! # Ok::<(), storage::Error>(())
//! ```

mod error;
mod event;
mod log;
mod store;

pub use error::{Error, Result};
pub use event::{Event, EventKind, SessionId};
pub use log::SessionLog;
pub use store::{EventStore, SessionSummary};
