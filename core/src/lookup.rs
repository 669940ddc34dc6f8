//! Typed lookup tables. Ids and titles live in separate types so an id can
//! never be used where a title is expected.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Dense corpus position in `[0, N)`.
pub type DocIndex = usize;

/// Read-only view of which matrix indices carry a label. The similarity
/// engine treats every index without a label as incomparable.
pub trait IndexLabels {
    fn label(&self, index: DocIndex) -> Option<&str>;

    /// Largest labelled index, if any.
    fn max_index(&self) -> Option<DocIndex>;

    fn contains_index(&self, index: DocIndex) -> bool {
        self.label(index).is_some()
    }
}

/// `id ↔ index`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdIndex {
    by_id: HashMap<String, DocIndex>,
    by_index: BTreeMap<DocIndex, String>,
}

impl IdIndex {
    pub fn new() -> Self { Self::default() }

    pub(crate) fn insert(&mut self, id: &str, index: DocIndex) {
        self.by_id.insert(id.to_string(), index);
        self.by_index.insert(index, id.to_string());
    }

    pub fn index_of(&self, id: &str) -> Option<DocIndex> {
        self.by_id.get(id).copied()
    }

    pub fn id_at(&self, index: DocIndex) -> Option<&str> {
        self.by_index.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.by_index.len() }
    pub fn is_empty(&self) -> bool { self.by_index.is_empty() }

    /// Entries in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (DocIndex, &str)> {
        self.by_index.iter().map(|(i, id)| (*i, id.as_str()))
    }
}

impl IndexLabels for IdIndex {
    fn label(&self, index: DocIndex) -> Option<&str> { self.id_at(index) }
    fn max_index(&self) -> Option<DocIndex> { self.by_index.keys().next_back().copied() }
}

/// `title ↔ index`, holding canonical titles only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleIndex {
    by_title: HashMap<String, DocIndex>,
    by_index: BTreeMap<DocIndex, String>,
}

impl TitleIndex {
    pub fn new() -> Self { Self::default() }

    pub(crate) fn insert(&mut self, title: &str, index: DocIndex) {
        self.by_title.insert(title.to_string(), index);
        self.by_index.insert(index, title.to_string());
    }

    pub fn index_of(&self, title: &str) -> Option<DocIndex> {
        self.by_title.get(title).copied()
    }

    pub fn title_at(&self, index: DocIndex) -> Option<&str> {
        self.by_index.get(&index).map(String::as_str)
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.by_title.contains_key(title)
    }

    pub fn len(&self) -> usize { self.by_index.len() }
    pub fn is_empty(&self) -> bool { self.by_index.is_empty() }

    /// Entries in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (DocIndex, &str)> {
        self.by_index.iter().map(|(i, t)| (*i, t.as_str()))
    }
}

impl IndexLabels for TitleIndex {
    fn label(&self, index: DocIndex) -> Option<&str> { self.title_at(index) }
    fn max_index(&self) -> Option<DocIndex> { self.by_index.keys().next_back().copied() }
}
