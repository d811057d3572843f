//! Session numbering derived from on-disk frames
//!
//! There is no counter file: the frame listing is the ledger. Session ids
//! therefore survive process restarts and crashes without any separate
//! state that could drift from the frames actually present.

use crate::store::FrameStore;

#[derive(Debug, Clone)]
pub struct SessionLedger {
    store: FrameStore,
}

impl SessionLedger {
    pub fn new(store: FrameStore) -> Self {
        Self { store }
    }

    /// One past the highest session id on disk, or 1 for an empty store.
    /// Gaps left by rendered-and-cleaned sessions are never reused.
    pub fn next_session_id(&self) -> u64 {
        self.store
            .list_sessions()
            .last()
            .map(|last| last + 1)
            .unwrap_or(1)
    }

    /// Session ids with at least one frame on disk, ascending.
    pub fn existing_sessions(&self) -> Vec<u64> {
        self.store.list_sessions()
    }
}
