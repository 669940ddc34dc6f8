//! The offline batch build: normalize → vectorize → similarity → authors.

use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::author::{authors_from_corpus, AuthorProfiles};
use crate::config::PipelineConfig;
use crate::corpus::{Corpus, DocRecord};
use crate::error::{PipelineError, Result};
use crate::index::{BookIndex, DocMeta};
use crate::similarity::SimilarityMatrix;
use crate::tokenizer::Tokenizer;
use crate::vectorizer::Vectorizer;

/// Build every artifact from `records`. Fails on the first error rather than
/// returning a partially valid index.
///
/// `title_authors` overrides the record `author` fields when present.
pub fn build_index(
    records: Vec<DocRecord>,
    title_authors: Option<BTreeMap<String, Vec<String>>>,
    config: &PipelineConfig,
) -> Result<BookIndex> {
    let corpus = Corpus::normalize(records, &config.normalize);
    if corpus.titles().is_empty() {
        return Err(PipelineError::EmptyCorpus);
    }
    let untitled = corpus.untitled_indices();
    if !untitled.is_empty() {
        warn!(count = untitled.len(), first = untitled[0], "documents without a title are excluded from comparisons");
    }

    let vectorizer = Vectorizer::new(Tokenizer::new(config.tokenizer.clone()), config.vectorizer.clone());
    let (vocabulary, documents) = vectorizer.fit_transform(&corpus.texts())?;
    let similarities = SimilarityMatrix::build(&documents, corpus.titles())?;

    let title_authors = title_authors.unwrap_or_else(|| authors_from_corpus(&corpus));
    let authors = if title_authors.is_empty() {
        None
    } else {
        Some(AuthorProfiles::build(title_authors, corpus.titles(), &documents)?)
    };

    info!(
        documents = corpus.len(),
        titles = corpus.titles().len(),
        vocabulary = vocabulary.len(),
        authors = authors.as_ref().map_or(0, |a| a.index.len()),
        "index build complete"
    );

    Ok(BookIndex {
        docs: corpus.records().iter().map(DocMeta::from).collect(),
        ids: corpus.ids().clone(),
        titles: corpus.titles().clone(),
        vocabulary,
        documents,
        similarities,
        authors,
        tokenizer: config.tokenizer.clone(),
    })
}
