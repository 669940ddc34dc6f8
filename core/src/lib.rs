//! Book similarity engine: corpus normalization, TF-IDF vectorization,
//! all-pairs cosine similarity and Rocchio relevance feedback.

pub mod author;
pub mod config;
pub mod corpus;
pub mod error;
pub mod gutenberg;
pub mod index;
pub mod lookup;
pub mod matrix;
pub mod persist;
pub mod pipeline;
pub mod query;
pub mod rocchio;
pub mod similarity;
pub mod tokenizer;
pub mod vector;
pub mod vectorizer;

pub use author::{AuthorIndex, AuthorProfiles};
pub use config::PipelineConfig;
pub use corpus::{CanonicalOrder, Corpus, DocRecord, NormalizeConfig};
pub use error::PipelineError;
pub use index::{BookIndex, DocMeta};
pub use lookup::{DocIndex, IdIndex, IndexLabels, TitleIndex};
pub use matrix::DenseMatrix;
pub use pipeline::build_index;
pub use query::{FeedbackQuery, Match, Recommendations};
pub use rocchio::RocchioWeights;
pub use similarity::{SimilarityMatrix, SENTINEL};
pub use tokenizer::{Tokenizer, TokenizerConfig};
pub use vectorizer::{Vectorizer, VectorizerConfig, Vocabulary};
