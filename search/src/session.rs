//! Per-requester session state.
//!
//! Each requester has two independent state machines:
//!
//! - batch: `Idle -> AwaitingAction -> Idle`, driven by received media and
//!   the chosen action
//! - browsing: `Idle -> Browsing(0) -> Browsing(k)* -> Closed`, driven by
//!   search, navigation and `done`
//!
//! State lives in a map keyed by requester, so one requester's operations
//! never observe another's. The store is not synchronised; callers that
//! process requesters concurrently must serialise access per key.

use std::collections::HashMap;

use mediadex_core::MediaRecord;

use crate::index::SearchIndex;

/// Identity of whoever is talking to the library (e.g. a chat id).
pub type RequesterId = i64;

/// Media received but not yet dispositioned, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingBatch {
    records: Vec<MediaRecord>,
}

impl PendingBatch {
    pub fn push(&mut self, record: MediaRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[MediaRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<MediaRecord> {
        self.records
    }
}

/// An open search and the page last shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Browsing {
    pub index: SearchIndex,
    pub page: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub pending: Option<PendingBatch>,
    pub browsing: Option<Browsing>,
}

impl Session {
    fn is_idle(&self) -> bool {
        self.pending.is_none() && self.browsing.is_none()
    }
}

/// All live sessions, keyed by requester.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: HashMap<RequesterId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, requester: RequesterId) -> Option<&Session> {
        self.sessions.get(&requester)
    }

    /// Appends to the requester's batch, opening one if needed. Returns the
    /// batch size afterwards.
    pub fn push_pending(&mut self, requester: RequesterId, record: MediaRecord) -> usize {
        let batch = self
            .sessions
            .entry(requester)
            .or_default()
            .pending
            .get_or_insert_with(PendingBatch::default);
        batch.push(record);
        batch.len()
    }

    /// Removes and returns the requester's batch.
    pub fn take_pending(&mut self, requester: RequesterId) -> Option<PendingBatch> {
        let batch = self.sessions.get_mut(&requester)?.pending.take();
        self.prune(requester);
        batch
    }

    /// Opens (or replaces) the requester's search at page 0.
    pub fn start_browsing(&mut self, requester: RequesterId, index: SearchIndex) -> &Browsing {
        self.sessions
            .entry(requester)
            .or_default()
            .browsing
            .insert(Browsing { index, page: 0 })
    }

    pub fn browsing_mut(&mut self, requester: RequesterId) -> Option<&mut Browsing> {
        self.sessions.get_mut(&requester)?.browsing.as_mut()
    }

    /// Drops everything held for the requester.
    pub fn close(&mut self, requester: RequesterId) -> Option<Session> {
        self.sessions.remove(&requester)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn prune(&mut self, requester: RequesterId) {
        if self.sessions.get(&requester).is_some_and(Session::is_idle) {
            self.sessions.remove(&requester);
        }
    }
}
