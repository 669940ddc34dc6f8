use serde::{Deserialize, Serialize};

use crate::author::AuthorProfiles;
use crate::corpus::DocRecord;
use crate::error::{PipelineError, Result};
use crate::lookup::{DocIndex, IdIndex, TitleIndex};
use crate::matrix::DenseMatrix;
use crate::similarity::SimilarityMatrix;
use crate::tokenizer::{Tokenizer, TokenizerConfig};
use crate::vectorizer::{Vectorizer, VectorizerConfig, Vocabulary};

/// Per-document metadata kept after the text itself is discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMeta {
    pub external_id: String,
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    pub rating: Option<f32>,
}

impl From<&DocRecord> for DocMeta {
    fn from(r: &DocRecord) -> Self {
        Self {
            external_id: r.id.clone(),
            title: r.title.clone(),
            author: r.author.clone(),
            year: r.year,
            rating: r.rating,
        }
    }
}

/// Output of one batch build. Immutable once built; every query reads it
/// through a shared reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookIndex {
    pub docs: Vec<DocMeta>,
    pub ids: IdIndex,
    pub titles: TitleIndex,
    pub vocabulary: Vocabulary,
    pub documents: DenseMatrix,
    pub similarities: SimilarityMatrix,
    pub authors: Option<AuthorProfiles>,
    /// Tokenizer settings the vocabulary was built with; free-text queries
    /// must be tokenized the same way.
    pub tokenizer: TokenizerConfig,
}

impl BookIndex {
    pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn resolve_title(&self, title: &str) -> Result<DocIndex> {
        self.titles
            .index_of(title)
            .ok_or_else(|| PipelineError::UnknownTitle { title: title.to_string() })
    }

    pub fn document_vector(&self, title: &str) -> Result<&[f32]> {
        Ok(self.documents.row(self.resolve_title(title)?))
    }

    /// Vectorize unseen text against the fitted vocabulary. Terms outside
    /// the vocabulary are ignored, so the result may be all zeros.
    pub fn vectorize_text(&self, text: &str) -> Vec<f32> {
        Vectorizer::new(Tokenizer::new(self.tokenizer.clone()), VectorizerConfig::default())
            .transform(&self.vocabulary, text)
    }

    pub fn rating(&self, index: DocIndex) -> Option<f32> {
        self.docs.get(index).and_then(|d| d.rating)
    }
}
