use booksim_core::tokenizer::{tokenize, Tokenizer, TokenizerConfig};

#[test]
fn it_normalizes_and_lowercases() {
    let words = tokenize("The ﬁrst CHAPTER, 1814.");
    // NFKC folds the ligature before splitting
    assert_eq!(words, vec!["the", "first", "chapter", "1814"]);
}

#[test]
fn it_drops_markup_remnants() {
    let words = tokenize("A <b>bold</b> claim<br/><p>and <em>more</em></p>");
    assert!(!words.iter().any(|w| w == "b" || w == "br" || w == "p" || w == "em"));
    assert!(words.contains(&"bold".to_string()));
    assert!(words.contains(&"a".to_string()));
}

#[test]
fn it_filters_stopwords_when_asked() {
    let tok = Tokenizer::new(TokenizerConfig { english_stopwords: true, ..TokenizerConfig::default() });
    let words = tok.tokenize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert!(words.contains(&"fox".to_string()));
}

#[test]
fn empty_stoplist_keeps_everything() {
    let tok = Tokenizer::new(TokenizerConfig { stoplist: vec![], ..TokenizerConfig::default() });
    assert_eq!(tok.tokenize("<i>x</i>"), vec!["i", "x", "i"]);
}
