use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could",
            "did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Leftover HTML tag names found in scraped book descriptions.
pub const MARKUP_REMNANTS: &[&str] = &["b", "br", "i", "em", "p"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub lowercase: bool,
    /// Reduce tokens to their English stem.
    pub stem: bool,
    /// Drop common English function words.
    pub english_stopwords: bool,
    /// Extra tokens to discard, matched after lowercasing.
    pub stoplist: Vec<String>,
    pub min_token_len: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            stem: false,
            english_stopwords: false,
            stoplist: MARKUP_REMNANTS.iter().map(|s| s.to_string()).collect(),
            min_token_len: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    config: TokenizerConfig,
    stoplist: HashSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self { Self::new(TokenizerConfig::default()) }
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        let stoplist = config.stoplist.iter().map(|s| s.to_lowercase()).collect();
        Self { config, stoplist }
    }

    pub fn config(&self) -> &TokenizerConfig { &self.config }

    /// Split NFKC-normalized text into alphanumeric runs, then apply case
    /// folding, stop lists and optional stemming.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut normalized = text.nfkc().collect::<String>();
        if self.config.lowercase {
            normalized = normalized.to_lowercase();
        }
        let mut tokens = Vec::new();
        for mat in RE.find_iter(&normalized) {
            let token = mat.as_str();
            if token.chars().count() < self.config.min_token_len { continue; }
            let folded = token.to_lowercase();
            if self.stoplist.contains(&folded) { continue; }
            if self.config.english_stopwords && STOPWORDS.contains(folded.as_str()) { continue; }
            if self.config.stem {
                tokens.push(STEMMER.stem(token).into_owned());
            } else {
                tokens.push(token.to_string());
            }
        }
        tokens
    }
}

/// Tokenize with the default configuration.
pub fn tokenize(text: &str) -> Vec<String> {
    Tokenizer::default().tokenize(text)
}
