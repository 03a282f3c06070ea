//! Name to unique-id index built per search.

use mediadex_core::MediaRecord;
use serde::Serialize;

use crate::filter::SearchQuery;

/// Ordered `media_name -> unique_id` mapping.
///
/// Entries keep the order in which names were first inserted. Inserting a
/// name that is already present replaces its id but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchIndex {
    entries: Vec<(String, String)>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every record whose name matches `query`, in record order.
    pub fn build<'a>(records: impl IntoIterator<Item = &'a MediaRecord>, query: &SearchQuery) -> Self {
        let mut index = Self::new();
        for record in records {
            if query.matches(&record.media_name) {
                index.insert(&record.media_name, &record.unique_id);
            }
        }
        index
    }

    pub fn insert(&mut self, name: impl Into<String>, unique_id: impl Into<String>) {
        let name = name.into();
        let unique_id = unique_id.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = unique_id,
            None => self.entries.push((name, unique_id)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, uid)| uid.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

impl<N: Into<String>, U: Into<String>> FromIterator<(N, U)> for SearchIndex {
    fn from_iter<T: IntoIterator<Item = (N, U)>>(iter: T) -> Self {
        let mut index = Self::new();
        for (name, uid) in iter {
            index.insert(name, uid);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediadex_core::ContentKind;

    #[test]
    fn test_build_keeps_scan_order() {
        let records = [
            MediaRecord::new("Dune.2021.mkv", "f1", "u1", ContentKind::Video),
            MediaRecord::new("Dune.Part.Two.mkv", "f2", "u2", ContentKind::Video),
            MediaRecord::new("dune_2021_extras.zip", "f3", "u3", ContentKind::Document),
        ];
        let query = SearchQuery::from_terms(["dune", "2021"]);
        let index = SearchIndex::build(&records, &query);
        assert_eq!(
            index.entries(),
            [
                ("Dune.2021.mkv".to_string(), "u1".to_string()),
                ("dune_2021_extras.zip".to_string(), "u3".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_name_replaces_id_in_place() {
        let index: SearchIndex = [("a", "1"), ("b", "2"), ("a", "3")].into_iter().collect();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("a"), Some("3"));
        assert_eq!(index.entries()[0].0, "a");
    }
}
