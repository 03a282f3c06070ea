//! Entry point for the outer messaging layer.
//!
//! [`MediaLibrary`] consumes two kinds of events, received media and
//! requester input (search text or callback tokens), and answers each with
//! a [`Reply`] that the UI only has to render.

use mediadex_core::MediaRecord;
use mediadex_store::{MediaStore, SaveOutcome};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{LibraryError, Result};
use crate::filter::{SEARCH_COMMAND, SearchQuery};
use crate::index::SearchIndex;
use crate::page::PageView;
use crate::session::{RequesterId, SessionStore};
use crate::token::CallbackAction;

/// Ask for a decision on the pending batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    /// Records waiting in the batch, including this one.
    pub pending: usize,
    /// What happened when the latest record was persisted.
    pub saved: SaveOutcome,
    /// Replays the batch (`ftr_btn`).
    pub strip: String,
    /// Discards the batch (`done`).
    pub done: String,
}

/// What to show the requester.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reply", content = "body", rename_all = "snake_case")]
pub enum Reply {
    /// The search text had no terms.
    Usage(String),
    Prompt(Prompt),
    Page(PageView),
    /// Send this one record.
    Deliver(MediaRecord),
    /// Send these records again, in arrival order.
    Replay(Vec<MediaRecord>),
    /// The session was closed; remove the UI.
    Closed,
}

/// Store plus per-requester sessions.
#[derive(Debug)]
pub struct MediaLibrary {
    store: MediaStore,
    sessions: SessionStore,
}

impl MediaLibrary {
    pub fn new(store: MediaStore) -> Self {
        Self {
            store,
            sessions: SessionStore::new(),
        }
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Persists `record` (unless already known) and adds it to the
    /// requester's pending batch.
    pub fn receive_media(&mut self, requester: RequesterId, record: MediaRecord) -> Result<Reply> {
        let saved = self.store.save(&record)?;
        let pending = self.sessions.push_pending(requester, record);
        debug!(requester, pending, ?saved, "media received");
        Ok(Reply::Prompt(Prompt {
            pending,
            saved,
            strip: CallbackAction::StripForwardTag.to_string(),
            done: CallbackAction::Done.to_string(),
        }))
    }

    /// Runs a search and opens a browsing session at page 0.
    ///
    /// A query without terms yields [`Reply::Usage`] and leaves any open
    /// search untouched.
    pub fn search(&mut self, requester: RequesterId, text: &str) -> Result<Reply> {
        let query = SearchQuery::parse(text);
        if query.is_empty() {
            return Ok(Reply::Usage(format!("usage: {SEARCH_COMMAND} <media name>")));
        }

        let records = self.store.all()?;
        let index = SearchIndex::build(&records, &query);
        info!(requester, terms = query.terms().len(), matches = index.len(), "search");
        let browsing = self.sessions.start_browsing(requester, index);
        Ok(Reply::Page(browsing.index.page(0)))
    }

    /// Parses and dispatches one callback token.
    ///
    /// # Errors
    ///
    /// Unknown or malformed tokens are rejected before any state changes.
    /// Navigation without an open search fails with
    /// [`LibraryError::NoActiveSearch`]; `ftr_btn` without a batch with
    /// [`LibraryError::NoPendingBatch`].
    pub fn handle_callback(&mut self, requester: RequesterId, token: &str) -> Result<Reply> {
        let action: CallbackAction = token.parse()?;
        match action {
            CallbackAction::Search(unique_id) => self.deliver(&unique_id),
            CallbackAction::Next(_) | CallbackAction::Back(_) => {
                let target = action.target_page().unwrap_or(0);
                self.navigate(requester, target)
            }
            CallbackAction::StripForwardTag => self.replay(requester),
            CallbackAction::Done => Ok(self.close(requester)),
        }
    }

    fn deliver(&self, unique_id: &str) -> Result<Reply> {
        let record = self.store.find(unique_id)?;
        Ok(Reply::Deliver(record))
    }

    fn navigate(&mut self, requester: RequesterId, target: i64) -> Result<Reply> {
        let browsing = self
            .sessions
            .browsing_mut(requester)
            .ok_or(LibraryError::NoActiveSearch(requester))?;
        let view = browsing.index.page(target);
        browsing.page = view.page;
        Ok(Reply::Page(view))
    }

    fn replay(&mut self, requester: RequesterId) -> Result<Reply> {
        let batch = self
            .sessions
            .take_pending(requester)
            .ok_or(LibraryError::NoPendingBatch(requester))?;
        info!(requester, records = batch.len(), "replaying batch");
        Ok(Reply::Replay(batch.into_records()))
    }

    fn close(&mut self, requester: RequesterId) -> Reply {
        if let Some(session) = self.sessions.close(requester) {
            debug!(
                requester,
                had_batch = session.pending.is_some(),
                had_search = session.browsing.is_some(),
                "session closed"
            );
        }
        Reply::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediadex_config::DatabaseConfig;
    use mediadex_core::ContentKind;

    fn library() -> (tempfile::TempDir, MediaLibrary) {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::open(&DatabaseConfig::sqlite(dir.path().join("lib.db"))).unwrap();
        store.ensure_schema().unwrap();
        (dir, MediaLibrary::new(store))
    }

    fn video(name: &str, uid: &str) -> MediaRecord {
        MediaRecord::new(name, format!("file-{uid}"), uid, ContentKind::Video)
    }

    #[test]
    fn test_empty_search_is_usage() {
        let (_dir, mut lib) = library();
        assert!(matches!(lib.search(1, "/search").unwrap(), Reply::Usage(_)));
        assert!(lib.sessions().is_empty());
    }

    #[test]
    fn test_prompt_counts_batch() {
        let (_dir, mut lib) = library();
        lib.receive_media(1, video("a.mkv", "u1")).unwrap();
        let reply = lib.receive_media(1, video("a.mkv", "u1")).unwrap();
        match reply {
            Reply::Prompt(prompt) => {
                assert_eq!(prompt.pending, 2);
                assert_eq!(prompt.saved, SaveOutcome::AlreadyKnown);
                assert_eq!(prompt.strip, "ftr_btn");
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_navigation_without_search() {
        let (_dir, mut lib) = library();
        assert!(matches!(
            lib.handle_callback(1, "next#0"),
            Err(LibraryError::NoActiveSearch(1))
        ));
    }

    #[test]
    fn test_replay_without_batch() {
        let (_dir, mut lib) = library();
        assert!(matches!(
            lib.handle_callback(1, "ftr_btn"),
            Err(LibraryError::NoPendingBatch(1))
        ));
    }
}
