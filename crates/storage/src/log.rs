//! Session lifecycle wrapper over the event store.

use crate::{Event, EventKind, EventStore, Result, SessionId};

/// A live session log: an event store paired with the session it is
/// recording. Created with [`SessionLog::begin`], which writes the
/// session-start event; [`SessionLog::end`] writes session-end and hands
/// the store back.
pub struct SessionLog {
    store: EventStore,
    id: SessionId,
}

impl SessionLog {
    /// Start a new session in the given store.
    pub fn begin(store: EventStore) -> Result<Self> {
        let id = SessionId::new();
        store.append(&Event::new(id, EventKind::SessionStart))?;
        Ok(Self { store, id })
    }

    /// The id of the session being recorded.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Append a domain event to this session.
    pub fn append(&self, kind: EventKind) -> Result<()> {
        self.store.append(&Event::new(self.id, kind))
    }

    /// End the session and return the underlying store.
    pub fn end(self) -> Result<EventStore> {
        self.store
            .append(&Event::new(self.id, EventKind::SessionEnd))?;
        Ok(self.store)
    }
}
