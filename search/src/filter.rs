//! Search query parsing and name matching.
//!
//! A query is a list of lowercase terms. A media name matches when every
//! term equals some segment of the lowercased name, where segments are the
//! pieces produced by cutting at dots, at underscores, or at spaces. Each
//! separator cuts the name on its own; a term wedged between two different
//! separators does not match.
//!
//! # Examples
//!
//! ```
//! use mediadex_search::SearchQuery;
//!
//! let query = SearchQuery::parse("/search Dune 2021");
//! assert!(query.matches("Dune.2021.mkv"));
//! assert!(!query.matches("Dune.Part.Two.mkv"));
//! ```

use std::collections::HashSet;

/// Command prefix accepted in front of search terms.
pub const SEARCH_COMMAND: &str = "/search";

const SEPARATORS: [char; 3] = ['.', '_', ' '];

/// Parsed search terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<String>,
}

impl SearchQuery {
    /// Parses `"/search <terms>"` or bare terms.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let rest = match text.strip_prefix(SEARCH_COMMAND) {
            Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest,
            _ => text,
        };
        Self::from_terms(rest.split_whitespace())
    }

    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether every term appears as a segment of `name`.
    ///
    /// An empty query matches nothing.
    pub fn matches(&self, name: &str) -> bool {
        if self.terms.is_empty() {
            return false;
        }
        let lowered = name.to_lowercase();
        let segments = segments(&lowered);
        self.terms.iter().all(|term| segments.contains(term.as_str()))
    }
}

fn segments(name: &str) -> HashSet<&str> {
    SEPARATORS
        .iter()
        .flat_map(|sep| name.split(*sep))
        .collect()
}
