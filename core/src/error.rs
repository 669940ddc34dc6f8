use thiserror::Error;

/// Errors raised by the batch pipeline and the query path.
///
/// Everything here is deterministic: retrying the same call with the same
/// inputs produces the same error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("corpus contains no usable documents")]
    EmptyCorpus,

    #[error("no term survived document-frequency filtering")]
    EmptyVocabulary,

    #[error("unknown title: {title}")]
    UnknownTitle { title: String },

    #[error("unknown author: {author}")]
    UnknownAuthor { author: String },

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("query {query} has an empty relevant set")]
    DegenerateRelevanceSet { query: usize },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
