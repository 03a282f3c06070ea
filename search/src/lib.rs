//! Search, pagination and callback dispatch for mediadex.
//!
//! The flow for one requester:
//!
//! 1. Media arrives: [`MediaLibrary::receive_media`] stores it and adds it
//!    to the requester's pending batch.
//! 2. The requester searches: [`MediaLibrary::search`] scans the store,
//!    builds a [`SearchIndex`] of matching names and shows page 0.
//! 3. Buttons come back as callback tokens:
//!    [`MediaLibrary::handle_callback`] parses them into a
//!    [`CallbackAction`] and navigates, delivers, replays or closes.
//!
//! # Examples
//!
//! ```
//! use mediadex_search::{CallbackAction, SearchIndex};
//!
//! let index: SearchIndex = (0..25).map(|i| (format!("ep{i}.mkv"), format!("u{i}"))).collect();
//! let page = index.page(CallbackAction::Next(1).target_page().unwrap());
//! assert_eq!(page.page, 2);
//! assert_eq!(page.entries.len(), 5);
//! ```

mod error;
mod filter;
mod index;
mod library;
mod page;
mod session;
mod token;

pub use error::{LibraryError, Result};
pub use filter::{SEARCH_COMMAND, SearchQuery};
pub use index::SearchIndex;
pub use library::{MediaLibrary, Prompt, Reply};
pub use page::{
    MatchIndicator, Navigation, PAGE_SIZE, PageEntry, PageView, clamp_page, page_count,
};
pub use session::{Browsing, PendingBatch, RequesterId, Session, SessionStore};
pub use token::CallbackAction;
