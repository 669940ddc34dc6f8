//! Author profiles: one averaged, normalized vector per author, compared
//! with the same similarity engine as books.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

use crate::corpus::Corpus;
use crate::error::Result;
use crate::lookup::{DocIndex, IndexLabels, TitleIndex};
use crate::matrix::DenseMatrix;
use crate::similarity::SimilarityMatrix;
use crate::vector;

/// `author ↔ row` in the author-vector matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorIndex {
    by_author: HashMap<String, usize>,
    by_index: Vec<String>,
}

impl AuthorIndex {
    fn push(&mut self, author: &str) -> usize {
        let index = self.by_index.len();
        self.by_author.insert(author.to_string(), index);
        self.by_index.push(author.to_string());
        index
    }

    pub fn index_of(&self, author: &str) -> Option<usize> {
        self.by_author.get(author).copied()
    }

    pub fn author_at(&self, index: usize) -> Option<&str> {
        self.by_index.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.by_index.len() }
    pub fn is_empty(&self) -> bool { self.by_index.is_empty() }

    pub fn authors(&self) -> &[String] { &self.by_index }
}

impl IndexLabels for AuthorIndex {
    fn label(&self, index: DocIndex) -> Option<&str> { self.author_at(index) }
    fn max_index(&self) -> Option<DocIndex> { self.by_index.len().checked_sub(1) }
}

/// Title → authors from the records themselves, canonical titles only.
pub fn authors_from_corpus(corpus: &Corpus) -> BTreeMap<String, Vec<String>> {
    corpus
        .titles()
        .iter()
        .filter_map(|(index, title)| {
            let author = corpus.record(index)?.author.trim();
            (!author.is_empty()).then(|| (title.to_string(), vec![author.to_string()]))
        })
        .collect()
}

/// Drop titles that have no title index entry. Returns how many were dropped.
pub fn retain_indexed_titles(title_to_authors: &mut BTreeMap<String, Vec<String>>, titles: &TitleIndex) -> usize {
    let before = title_to_authors.len();
    title_to_authors.retain(|title, _| titles.contains_title(title));
    before - title_to_authors.len()
}

/// Invert title → authors into author → titles.
pub fn group_by_author(title_to_authors: &BTreeMap<String, Vec<String>>) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (title, authors) in title_to_authors {
        for author in authors {
            let titles = grouped.entry(author.clone()).or_default();
            if !titles.contains(title) {
                titles.push(title.clone());
            }
        }
    }
    grouped
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorProfiles {
    pub index: AuthorIndex,
    pub vectors: DenseMatrix,
    pub author_to_titles: BTreeMap<String, Vec<String>>,
    pub similarities: SimilarityMatrix,
}

impl AuthorProfiles {
    /// Average the document rows of each author's titles and normalize.
    /// Authors whose average is all zeros get no row.
    pub fn build(
        mut title_to_authors: BTreeMap<String, Vec<String>>,
        titles: &TitleIndex,
        documents: &DenseMatrix,
    ) -> Result<Self> {
        let dropped = retain_indexed_titles(&mut title_to_authors, titles);
        if dropped > 0 {
            warn!(dropped, "titles without a document vector left out of author profiles");
        }
        let author_to_titles = group_by_author(&title_to_authors);

        let width = documents.n_cols();
        let mut index = AuthorIndex::default();
        let mut rows = Vec::new();
        for (author, author_titles) in &author_to_titles {
            let mut sum = vec![0.0f32; width];
            for title in author_titles {
                if let Some(i) = titles.index_of(title) {
                    vector::add_scaled(&mut sum, documents.row(i), 1.0)?;
                }
            }
            let scale = 1.0 / author_titles.len() as f32;
            for x in sum.iter_mut() {
                *x *= scale;
            }
            if vector::normalize(&mut sum) {
                index.push(author);
                rows.push(sum);
            }
        }

        let vectors = if rows.is_empty() { DenseMatrix::zeros(0, width) } else { DenseMatrix::from_rows(rows)? };
        let similarities = SimilarityMatrix::build(&vectors, &index)?;
        info!(authors = index.len(), grouped = author_to_titles.len(), "built author profiles");
        Ok(Self { index, vectors, author_to_titles, similarities })
    }

    pub fn vector(&self, author: &str) -> Option<&[f32]> {
        self.index.index_of(author).map(|i| self.vectors.row(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (TitleIndex, DenseMatrix) {
        let mut titles = TitleIndex::new();
        titles.insert("Emma", 0);
        titles.insert("Persuasion", 1);
        titles.insert("Dracula", 2);
        titles.insert("Blank", 3);
        let docs = DenseMatrix::from_rows(vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.6, 0.8],
            vec![0.0, 0.0],
        ])
        .unwrap();
        (titles, docs)
    }

    #[test]
    fn averages_and_normalizes_per_author() {
        let (titles, docs) = setup();
        let mut map = BTreeMap::new();
        map.insert("Emma".to_string(), vec!["Austen".to_string()]);
        map.insert("Persuasion".to_string(), vec!["Austen".to_string()]);
        map.insert("Dracula".to_string(), vec!["Stoker".to_string()]);
        map.insert("Unindexed".to_string(), vec!["Nobody".to_string()]);
        map.insert("Blank".to_string(), vec!["Ghost".to_string()]);

        let profiles = AuthorProfiles::build(map, &titles, &docs).unwrap();
        assert_eq!(profiles.index.authors(), &["Austen", "Stoker"]);
        let austen = profiles.vector("Austen").unwrap();
        assert!((austen[0] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!((vector::l2_norm(austen) - 1.0).abs() < 1e-6);
        assert!(profiles.vector("Ghost").is_none());
        assert!(!profiles.author_to_titles.contains_key("Nobody"));
        assert_eq!(profiles.similarities.len(), 2);
        assert_eq!(profiles.similarities.get(0, 0), 0.0);
        assert!(profiles.similarities.get(0, 1) > 0.9);
    }

    #[test]
    fn group_by_author_inverts_mapping() {
        let mut map = BTreeMap::new();
        map.insert("Good Omens".to_string(), vec!["Gaiman".to_string(), "Pratchett".to_string()]);
        map.insert("Mort".to_string(), vec!["Pratchett".to_string()]);
        let grouped = group_by_author(&map);
        assert_eq!(grouped["Pratchett"], vec!["Good Omens".to_string(), "Mort".to_string()]);
        assert_eq!(grouped["Gaiman"], vec!["Good Omens".to_string()]);
    }
}
