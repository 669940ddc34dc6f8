//! Corpus normalization: assigns dense indices to raw records and resolves
//! duplicate titles to a single canonical id.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::lookup::{DocIndex, IdIndex, TitleIndex};

/// One input document as supplied by an extractor or scraper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub text: String,
    /// Average reader rating, surfaced as the auxiliary score of a match.
    #[serde(default)]
    pub rating: Option<f32>,
}

/// How to pick the canonical id when several records share a title.
///
/// Ids are compared by the part after their last `-` ("158-1" → "1"); an id
/// without a dash has no suffix and sorts before every suffixed id. The lower
/// id wins, ties keep the record seen first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalOrder {
    /// Suffixes compared as strings, so "10" sorts before "9".
    #[default]
    SuffixLexicographic,
    /// Suffixes compared as integers; non-numeric suffixes sort after
    /// numeric ones, lexicographically among themselves.
    SuffixNumeric,
    /// The first record with a title is canonical.
    FirstSeen,
}

fn id_suffix(id: &str) -> Option<&str> {
    id.rsplit_once('-').map(|(_, suffix)| suffix)
}

fn numeric_key(id: &str) -> (u8, u64, &str) {
    match id_suffix(id) {
        None => (0, 0, ""),
        Some(s) => match s.parse::<u64>() {
            Ok(n) => (1, n, ""),
            Err(_) => (2, 0, s),
        },
    }
}

impl CanonicalOrder {
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            CanonicalOrder::SuffixLexicographic => id_suffix(a).cmp(&id_suffix(b)),
            CanonicalOrder::SuffixNumeric => numeric_key(a).cmp(&numeric_key(b)),
            CanonicalOrder::FirstSeen => Ordering::Equal,
        }
    }

    /// Whether `candidate` should replace `incumbent` as canonical id.
    pub fn prefers(self, candidate: &str, incumbent: &str) -> bool {
        self.compare(candidate, incumbent) == Ordering::Less
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub canonical_order: CanonicalOrder,
}

/// Records in input order plus the lookup tables derived from them.
///
/// Every record keeps its position as its index, including the ones dropped
/// as duplicates, so downstream matrices stay `N` wide. Dropped indices never
/// appear in `ids` or `titles`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    records: Vec<DocRecord>,
    ids: IdIndex,
    titles: TitleIndex,
    title_to_id: HashMap<String, String>,
    id_to_title: HashMap<String, String>,
}

impl Corpus {
    pub fn normalize(records: Vec<DocRecord>, config: &NormalizeConfig) -> Self {
        let order = config.canonical_order;
        let mut first_of_id: HashMap<&str, DocIndex> = HashMap::new();
        let mut canonical: HashMap<&str, DocIndex> = HashMap::new();

        for (index, record) in records.iter().enumerate() {
            match first_of_id.entry(record.id.as_str()) {
                Entry::Occupied(e) => {
                    warn!(id = %record.id, index, first = *e.get(), "duplicate id, keeping first occurrence");
                    continue;
                }
                Entry::Vacant(e) => {
                    e.insert(index);
                }
            }
            if record.title.is_empty() {
                continue;
            }
            match canonical.entry(record.title.as_str()) {
                Entry::Vacant(e) => {
                    e.insert(index);
                }
                Entry::Occupied(mut e) => {
                    if order.prefers(&record.id, &records[*e.get()].id) {
                        e.insert(index);
                    }
                }
            }
        }

        let mut ids = IdIndex::new();
        let mut titles = TitleIndex::new();
        let mut title_to_id = HashMap::new();
        let mut id_to_title = HashMap::new();
        let mut dropped = 0usize;

        for (index, record) in records.iter().enumerate() {
            if first_of_id.get(record.id.as_str()) != Some(&index) {
                dropped += 1;
                continue;
            }
            if record.title.is_empty() {
                // Retained by id, unreachable by title.
                ids.insert(&record.id, index);
                continue;
            }
            if canonical.get(record.title.as_str()) != Some(&index) {
                debug!(id = %record.id, title = %record.title, index, "dropping non-canonical duplicate");
                dropped += 1;
                continue;
            }
            ids.insert(&record.id, index);
            titles.insert(&record.title, index);
            title_to_id.insert(record.title.clone(), record.id.clone());
            id_to_title.insert(record.id.clone(), record.title.clone());
        }

        info!(records = records.len(), titles = titles.len(), dropped, "normalized corpus");

        Self { records, ids, titles, title_to_id, id_to_title }
    }

    pub fn len(&self) -> usize { self.records.len() }
    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn records(&self) -> &[DocRecord] { &self.records }
    pub fn record(&self, index: DocIndex) -> Option<&DocRecord> { self.records.get(index) }

    pub fn ids(&self) -> &IdIndex { &self.ids }
    pub fn titles(&self) -> &TitleIndex { &self.titles }

    pub fn canonical_id(&self, title: &str) -> Option<&str> {
        self.title_to_id.get(title).map(String::as_str)
    }

    pub fn title_of(&self, id: &str) -> Option<&str> {
        self.id_to_title.get(id).map(String::as_str)
    }

    /// Per-document text in index order.
    pub fn texts(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.text.as_str()).collect()
    }

    /// Indices that no title resolves to.
    pub fn untitled_indices(&self) -> Vec<DocIndex> {
        (0..self.records.len()).filter(|i| self.titles.title_at(*i).is_none()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, title: &str) -> DocRecord {
        DocRecord {
            id: id.into(),
            title: title.into(),
            author: String::new(),
            year: None,
            text: String::new(),
            rating: None,
        }
    }

    #[test]
    fn empty_input_gives_empty_tables() {
        let corpus = Corpus::normalize(vec![], &NormalizeConfig::default());
        assert!(corpus.is_empty());
        assert!(corpus.ids().is_empty());
        assert!(corpus.titles().is_empty());
    }

    #[test]
    fn duplicate_title_prefers_lower_suffix() {
        let corpus = Corpus::normalize(
            vec![rec("158-1", "Emma"), rec("158-0", "Emma"), rec("161", "Sense and Sensibility")],
            &NormalizeConfig::default(),
        );
        assert_eq!(corpus.canonical_id("Emma"), Some("158-0"));
        assert_eq!(corpus.titles().index_of("Emma"), Some(1));
        assert_eq!(corpus.titles().title_at(0), None);
        assert_eq!(corpus.ids().index_of("158-1"), None);
        assert_eq!(corpus.ids().index_of("158-0"), Some(1));
        assert_eq!(corpus.title_of("158-0"), Some("Emma"));
        assert_eq!(corpus.untitled_indices(), vec![0]);
    }

    #[test]
    fn lexicographic_and_numeric_orders_disagree_on_digit_count() {
        let records = vec![rec("100-9", "Dracula"), rec("100-10", "Dracula")];

        let lexical = Corpus::normalize(records.clone(), &NormalizeConfig::default());
        assert_eq!(lexical.canonical_id("Dracula"), Some("100-10"));

        let numeric = Corpus::normalize(
            records,
            &NormalizeConfig { canonical_order: CanonicalOrder::SuffixNumeric },
        );
        assert_eq!(numeric.canonical_id("Dracula"), Some("100-9"));
    }

    #[test]
    fn unsuffixed_id_wins_and_ties_keep_first() {
        let corpus = Corpus::normalize(
            vec![rec("84-0", "Frankenstein"), rec("84", "Frankenstein")],
            &NormalizeConfig::default(),
        );
        assert_eq!(corpus.canonical_id("Frankenstein"), Some("84"));

        let first_seen = Corpus::normalize(
            vec![rec("84-0", "Frankenstein"), rec("84", "Frankenstein")],
            &NormalizeConfig { canonical_order: CanonicalOrder::FirstSeen },
        );
        assert_eq!(first_seen.canonical_id("Frankenstein"), Some("84-0"));
    }

    #[test]
    fn empty_title_is_kept_by_id_only() {
        let corpus = Corpus::normalize(vec![rec("1", ""), rec("2", "Ulysses")], &NormalizeConfig::default());
        assert_eq!(corpus.ids().index_of("1"), Some(0));
        assert_eq!(corpus.titles().title_at(0), None);
        assert_eq!(corpus.titles().len(), 1);
    }

    #[test]
    fn repeated_id_keeps_first_record() {
        let corpus = Corpus::normalize(vec![rec("7", "Walden"), rec("7", "Walden")], &NormalizeConfig::default());
        assert_eq!(corpus.ids().index_of("7"), Some(0));
        assert_eq!(corpus.titles().index_of("Walden"), Some(0));
        assert_eq!(corpus.untitled_indices(), vec![1]);
    }
}
