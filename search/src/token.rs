//! Callback tokens exchanged with the UI.
//!
//! A token is `action` or `action#payload`. The action is the text before
//! the first `#`; the payload is everything after it.
//!
//! | Token | Action |
//! |---|---|
//! | `search#<unique_id>` | deliver one record |
//! | `next#<page>` / `back#<page>` | move one page from `<page>` |
//! | `ftr_btn` | replay the pending batch |
//! | `done` | close the requester's session |

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::LibraryError;

const SEARCH: &str = "search";
const NEXT: &str = "next";
const BACK: &str = "back";
const STRIP_FORWARD_TAG: &str = "ftr_btn";
const DONE: &str = "done";

/// One parsed callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Deliver the record with this unique id.
    Search(String),
    /// Show the page after the given one.
    Next(i64),
    /// Show the page before the given one.
    Back(i64),
    /// Replay the pending batch without its forward tag.
    StripForwardTag,
    /// Drop the requester's batch and search.
    Done,
}

impl CallbackAction {
    /// Page a navigation token resolves to, before clamping.
    pub fn target_page(&self) -> Option<i64> {
        match self {
            Self::Next(page) => Some(page.saturating_add(1)),
            Self::Back(page) => Some(page.saturating_sub(1)),
            _ => None,
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search(uid) => write!(f, "{SEARCH}#{uid}"),
            Self::Next(page) => write!(f, "{NEXT}#{page}"),
            Self::Back(page) => write!(f, "{BACK}#{page}"),
            Self::StripForwardTag => f.write_str(STRIP_FORWARD_TAG),
            Self::Done => f.write_str(DONE),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = LibraryError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (action, payload) = match token.split_once('#') {
            Some((action, payload)) => (action, Some(payload)),
            None => (token, None),
        };
        let malformed = |reason: &str| LibraryError::MalformedToken {
            token: token.to_string(),
            reason: reason.to_string(),
        };
        let page = |payload: Option<&str>| -> Result<i64, LibraryError> {
            let raw = payload.ok_or_else(|| malformed("missing page number"))?;
            raw.trim()
                .parse::<i64>()
                .map_err(|e| malformed(&format!("bad page number: {e}")))
        };

        let parsed = match action {
            SEARCH => match payload {
                Some(uid) if !uid.is_empty() => Ok(Self::Search(uid.to_string())),
                _ => Err(malformed("missing unique id")),
            },
            NEXT => page(payload).map(Self::Next),
            BACK => page(payload).map(Self::Back),
            STRIP_FORWARD_TAG | DONE if payload.is_some() => {
                Err(malformed("action takes no payload"))
            }
            STRIP_FORWARD_TAG => Ok(Self::StripForwardTag),
            DONE => Ok(Self::Done),
            other => Err(LibraryError::UnknownAction(other.to_string())),
        };
        if let Err(err) = &parsed {
            warn!(%token, error = %err, "rejected callback token");
        }
        parsed
    }
}
