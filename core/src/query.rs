//! Online query path over a built [`BookIndex`]: top/bottom-k lookups, full
//! rankings and Rocchio re-ranking. Everything here is read-only.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::index::BookIndex;
use crate::lookup::DocIndex;
use crate::rocchio::{self, RankedQuery, RocchioWeights};
use crate::similarity::sort_descending;

/// Scores are reported to four decimal places.
pub fn round_score(score: f32) -> f32 {
    (score * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub index: DocIndex,
    pub title: String,
    pub similarity: f32,
    /// Auxiliary score carried alongside the similarity (the average rating).
    pub auxiliary: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub query: String,
    pub most_similar: Vec<Match>,
    pub least_similar: Vec<Match>,
}

/// A Rocchio evaluation case: a query title with titles judged relevant and
/// irrelevant to it. When `text` is set the starting query is that text
/// instead of the title's document, and `title` (if it resolves) is only
/// left out of the results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackQuery {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub relevant: Vec<String>,
    #[serde(default)]
    pub irrelevant: Vec<String>,
}

impl BookIndex {
    fn to_match(&self, index: DocIndex, score: f32) -> Option<Match> {
        let title = self.titles.title_at(index)?;
        Some(Match {
            index,
            title: title.to_string(),
            similarity: round_score(score),
            auxiliary: self.rating(index),
        })
    }

    fn to_matches(&self, entries: Vec<(DocIndex, f32)>) -> Vec<Match> {
        entries.into_iter().filter_map(|(i, s)| self.to_match(i, s)).collect()
    }

    /// The `x` most and `x` least similar titles to `title`.
    pub fn recommend(&self, title: &str, x: usize) -> Result<Recommendations> {
        let index = self.resolve_title(title)?;
        let (top, bottom) = self.similarities.extremes(index, &self.titles, x);
        Ok(Recommendations {
            query: title.to_string(),
            most_similar: self.to_matches(top),
            least_similar: self.to_matches(bottom),
        })
    }

    /// Every other titled document, most similar first.
    pub fn ranking(&self, title: &str) -> Result<Vec<Match>> {
        let index = self.resolve_title(title)?;
        Ok(self.to_matches(self.similarities.ranked(index, &self.titles)))
    }

    /// The `x` most and `x` least similar authors to `author`.
    pub fn similar_authors(&self, author: &str, x: usize) -> Result<(Vec<(String, f32)>, Vec<(String, f32)>)> {
        let unknown = || PipelineError::UnknownAuthor { author: author.to_string() };
        let profiles = self.authors.as_ref().ok_or_else(unknown)?;
        let index = profiles.index.index_of(author).ok_or_else(unknown)?;
        let (top, bottom) = profiles.similarities.extremes(index, &profiles.index, x);
        let named = |entries: Vec<(DocIndex, f32)>| {
            entries
                .into_iter()
                .filter_map(|(i, s)| Some((profiles.index.author_at(i)?.to_string(), round_score(s))))
                .collect::<Vec<_>>()
        };
        Ok((named(top), named(bottom)))
    }

    /// Rocchio-adjusted copy of `title`'s document vector.
    pub fn adjusted_query(
        &self,
        title: &str,
        relevant: &[String],
        irrelevant: &[String],
        weights: RocchioWeights,
        clip: bool,
    ) -> Result<Vec<f32>> {
        self.adjust_vector(self.document_vector(title)?, relevant, irrelevant, weights, clip)
    }

    /// Rocchio-adjusted copy of an arbitrary query vector.
    pub fn adjust_vector(
        &self,
        q0: &[f32],
        relevant: &[String],
        irrelevant: &[String],
        weights: RocchioWeights,
        clip: bool,
    ) -> Result<Vec<f32>> {
        let rel = relevant.iter().map(|t| self.document_vector(t)).collect::<Result<Vec<_>>>()?;
        let irr = irrelevant.iter().map(|t| self.document_vector(t)).collect::<Result<Vec<_>>>()?;
        rocchio::rocchio(q0, &rel, &irr, weights, clip)
    }

    /// Score every titled document against `vector`, most similar first,
    /// leaving out `exclude`.
    pub fn rank_by_vector(&self, vector: &[f32], exclude: Option<DocIndex>) -> Result<Vec<(DocIndex, f32)>> {
        let scores = self.documents.mul_vec(vector)?;
        let mut entries: Vec<(DocIndex, f32)> = self
            .titles
            .iter()
            .filter(|(i, _)| Some(*i) != exclude)
            .map(|(i, _)| (i, scores[i]))
            .collect();
        sort_descending(&mut entries);
        Ok(entries)
    }

    /// Adjusted query vector for `query` and the document to leave out of
    /// its results.
    fn feedback_vector(&self, query: &FeedbackQuery, weights: RocchioWeights, clip: bool) -> Result<(Vec<f32>, Option<DocIndex>)> {
        let (q0, exclude) = match &query.text {
            Some(text) => (self.vectorize_text(text), self.titles.index_of(&query.title)),
            None => {
                let index = self.resolve_title(&query.title)?;
                (self.documents.row(index).to_vec(), Some(index))
            }
        };
        let adjusted = self.adjust_vector(&q0, &query.relevant, &query.irrelevant, weights, clip)?;
        Ok((adjusted, exclude))
    }

    /// Re-rank with relevance feedback and return the `x` best matches.
    pub fn feedback_matches(&self, query: &FeedbackQuery, weights: RocchioWeights, clip: bool, x: usize) -> Result<Vec<Match>> {
        let (adjusted, exclude) = self.feedback_vector(query, weights, clip)?;
        let mut ranked = self.rank_by_vector(&adjusted, exclude)?;
        ranked.truncate(x);
        Ok(self.to_matches(ranked))
    }

    /// Mean average precision of Rocchio-adjusted rankings against the
    /// relevant titles of each query.
    pub fn evaluate_feedback(&self, queries: &[FeedbackQuery], weights: RocchioWeights, clip: bool) -> Result<f64> {
        let mut ranked = Vec::with_capacity(queries.len());
        for query in queries {
            let (adjusted, exclude) = self.feedback_vector(query, weights, clip)?;
            let ranking = self
                .rank_by_vector(&adjusted, exclude)?
                .into_iter()
                .filter_map(|(i, _)| self.titles.title_at(i).map(str::to_string))
                .collect();
            ranked.push(RankedQuery { ranking, relevant: query.relevant.clone() });
        }
        rocchio::mean_average_precision(&ranked)
    }
}
