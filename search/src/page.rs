//! Fixed-size pages over a [`SearchIndex`].
//!
//! Page numbers are zero-based. Any requested number is clamped into
//! `0..page_count`, so stepping past either end re-renders the edge page.
//! An empty index still has one (empty) page.

use serde::Serialize;

use crate::index::SearchIndex;
use crate::token::CallbackAction;

/// Entries per page.
pub const PAGE_SIZE: usize = 10;

/// Number of pages needed for `len` entries; never zero.
pub fn page_count(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE).max(1)
}

/// Clamps `requested` into `0..page_count(len)`.
pub fn clamp_page(requested: i64, len: usize) -> usize {
    let last = page_count(len) - 1;
    usize::try_from(requested.max(0)).map_or(last, |page| page.min(last))
}

/// Whether any result matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchIndicator {
    MatchFound,
    NoMatch,
}

impl MatchIndicator {
    pub fn label(self) -> &'static str {
        match self {
            Self::MatchFound => "MATCH FOUND",
            Self::NoMatch => "MATCH NOT FOUND",
        }
    }
}

/// One selectable result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageEntry {
    pub name: String,
    pub unique_id: String,
    /// `search#<unique_id>`.
    pub token: String,
}

/// Back/next tokens, both carrying the current page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub back: String,
    pub next: String,
}

/// Everything the UI needs to draw one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub entries: Vec<PageEntry>,
    pub page: usize,
    pub page_count: usize,
    pub indicator: MatchIndicator,
    /// Present only when the index spans more than one page.
    pub navigation: Option<Navigation>,
    /// Closes the session.
    pub done: String,
}

impl PageView {
    pub fn shows_navigation(&self) -> bool {
        self.navigation.is_some()
    }
}

impl SearchIndex {
    /// Renders page `requested`, clamped into range.
    pub fn page(&self, requested: i64) -> PageView {
        let page = clamp_page(requested, self.len());
        let start = page * PAGE_SIZE;
        let end = (start + PAGE_SIZE).min(self.len());

        let entries = self.entries()[start.min(end)..end]
            .iter()
            .map(|(name, uid)| PageEntry {
                name: name.clone(),
                unique_id: uid.clone(),
                token: CallbackAction::Search(uid.clone()).to_string(),
            })
            .collect();

        let current = page as i64;
        let navigation = (self.len() > PAGE_SIZE).then(|| Navigation {
            back: CallbackAction::Back(current).to_string(),
            next: CallbackAction::Next(current).to_string(),
        });

        PageView {
            entries,
            page,
            page_count: page_count(self.len()),
            indicator: if self.is_empty() {
                MatchIndicator::NoMatch
            } else {
                MatchIndicator::MatchFound
            },
            navigation,
            done: CallbackAction::Done.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(n: usize) -> SearchIndex {
        (0..n).map(|i| (format!("name{i}"), format!("uid{i}"))).collect()
    }

    #[test]
    fn test_twenty_five_entries() {
        let idx = index(25);
        assert_eq!(page_count(idx.len()), 3);
        assert_eq!(idx.page(0).entries.len(), 10);
        assert_eq!(idx.page(1).entries.len(), 10);
        assert_eq!(idx.page(2).entries.len(), 5);
        assert_eq!(idx.page(2).entries[0].name, "name20");
    }

    #[test]
    fn test_clamping() {
        let idx = index(25);
        assert_eq!(idx.page(-1), idx.page(0));
        assert_eq!(idx.page(99), idx.page(2));
        assert_eq!(idx.page(i64::MIN).page, 0);
        assert_eq!(idx.page(i64::MAX).page, 2);
    }

    #[test]
    fn test_empty_index_has_one_empty_page() {
        let view = SearchIndex::new().page(0);
        assert!(view.entries.is_empty());
        assert_eq!(view.page_count, 1);
        assert_eq!(view.indicator, MatchIndicator::NoMatch);
        assert!(!view.shows_navigation());
        assert_eq!(view.done, "done");
    }

    #[test]
    fn test_single_page_hides_navigation() {
        let view = index(10).page(0);
        assert_eq!(view.entries.len(), 10);
        assert_eq!(view.indicator, MatchIndicator::MatchFound);
        assert!(!view.shows_navigation());
    }

    #[test]
    fn test_navigation_tokens_carry_current_page() {
        let view = index(11).page(1);
        assert_eq!(
            view.navigation,
            Some(Navigation {
                back: "back#1".into(),
                next: "next#1".into(),
            })
        );
        assert_eq!(view.entries[0].token, "search#uid10");
    }

    #[test]
    fn test_page_count_boundaries() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(10), 1);
        assert_eq!(page_count(11), 2);
        assert_eq!(page_count(20), 2);
    }
}
