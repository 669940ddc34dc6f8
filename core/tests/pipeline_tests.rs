use booksim_core::persist::{load_index, save_index, save_similarities, IndexPaths};
use booksim_core::{
    build_index, CanonicalOrder, DocRecord, FeedbackQuery, IndexLabels, NormalizeConfig, PipelineConfig,
    PipelineError, RocchioWeights, SENTINEL,
};
use std::collections::BTreeMap;

fn rec(id: &str, title: &str, author: &str, text: &str) -> DocRecord {
    DocRecord {
        id: id.into(),
        title: title.into(),
        author: author.into(),
        year: None,
        text: text.into(),
        rating: None,
    }
}

fn library() -> Vec<DocRecord> {
    vec![
        rec("158-1", "Emma", "Jane Austen", "matchmaking village marriage ball"),
        rec("158-0", "Emma", "Jane Austen", "matchmaking village marriage ball gossip"),
        rec("105", "Persuasion", "Jane Austen", "navy marriage letter bath"),
        rec("345", "Dracula", "Bram Stoker", "vampire castle blood letter"),
        rec("84", "Frankenstein", "Mary Shelley", "monster creature science blood"),
        rec("2701", "Moby Dick", "Herman Melville", "whale sea ship captain"),
        rec("999", "", "", "untitled stray text whale"),
    ]
}

fn built() -> booksim_core::BookIndex {
    let mut records = library();
    records[5].rating = Some(3.5);
    build_index(records, None, &PipelineConfig::default()).unwrap()
}

#[test]
fn duplicate_title_resolves_to_canonical_edition() {
    let index = built();
    assert_eq!(index.ids.index_of("158-0"), Some(1));
    assert_eq!(index.ids.index_of("158-1"), None);
    assert_eq!(index.titles.index_of("Emma"), Some(1));
    assert_eq!(index.titles.title_at(0), None);
}

#[test]
fn similarity_matrix_invariants() {
    let index = built();
    let sims = &index.similarities;
    let n = index.num_docs();
    assert_eq!(sims.len(), n);
    for i in 0..n {
        for j in 0..n {
            let valid = index.titles.contains_index(i) && index.titles.contains_index(j);
            if !valid {
                assert_eq!(sims.get(i, j), SENTINEL, "({i}, {j}) should be sentinel");
            } else if i == j {
                assert_eq!(sims.get(i, j), 0.0);
            } else {
                assert!((sims.get(i, j) - sims.get(j, i)).abs() < 1e-6);
                assert!(sims.get(i, j) >= 0.0 && sims.get(i, j) <= 1.0 + 1e-6);
            }
        }
    }
    // dropped duplicate and untitled record
    assert!(sims.row(0).iter().all(|s| *s == SENTINEL));
    assert!(sims.row(6).iter().all(|s| *s == SENTINEL));
}

#[test]
fn document_rows_are_normalized() {
    let index = built();
    for row in index.documents.rows() {
        let norm: f32 = row.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!(norm == 0.0 || (norm - 1.0).abs() < 1e-6);
    }
}

#[test]
fn rebuild_is_identical() {
    let a = build_index(library(), None, &PipelineConfig::default()).unwrap();
    let b = build_index(library(), None, &PipelineConfig::default()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn recommendations_rank_and_filter() {
    let index = built();
    let recs = index.recommend("Dracula", 2).unwrap();
    assert_eq!(recs.most_similar.len(), 2);
    assert!(recs.most_similar[0].similarity >= recs.most_similar[1].similarity);
    assert!(recs.most_similar.iter().all(|m| m.title != "Dracula"));
    let top_titles: Vec<_> = recs.most_similar.iter().map(|m| m.title.as_str()).collect();
    assert!(top_titles.contains(&"Frankenstein"));
    assert!(top_titles.contains(&"Persuasion"));

    let least: Vec<_> = recs.least_similar.iter().map(|m| m.similarity).collect();
    assert!(least.windows(2).all(|w| w[0] <= w[1]));
    assert!(least.iter().all(|s| *s >= 0.0));

    let ranking = index.ranking("Dracula").unwrap();
    assert_eq!(ranking.len(), index.titles.len() - 1);
    let whale = ranking.iter().find(|m| m.title == "Moby Dick").unwrap();
    assert_eq!(whale.auxiliary, Some(3.5));
}

#[test]
fn unknown_title_is_reported() {
    let index = built();
    assert_eq!(
        index.recommend("Ivanhoe", 3).unwrap_err(),
        PipelineError::UnknownTitle { title: "Ivanhoe".into() }
    );
}

#[test]
fn empty_input_fails_fast() {
    assert_eq!(build_index(vec![], None, &PipelineConfig::default()).unwrap_err(), PipelineError::EmptyCorpus);
    let untitled = vec![rec("1", "", "", "some words")];
    assert_eq!(build_index(untitled, None, &PipelineConfig::default()).unwrap_err(), PipelineError::EmptyCorpus);
}

#[test]
fn numeric_canonical_order_is_configurable() {
    let records = vec![rec("100-10", "Ivanhoe", "", "knight castle"), rec("100-9", "Ivanhoe", "", "knight tournament")];
    let mut config = PipelineConfig::default();
    let lexical = build_index(records.clone(), None, &config).unwrap();
    assert_eq!(lexical.titles.index_of("Ivanhoe"), Some(0));

    config.normalize = NormalizeConfig { canonical_order: CanonicalOrder::SuffixNumeric };
    let numeric = build_index(records, None, &config).unwrap();
    assert_eq!(numeric.titles.index_of("Ivanhoe"), Some(1));
}

#[test]
fn author_profiles_come_from_records_or_override() {
    let index = built();
    let authors = index.authors.as_ref().unwrap();
    assert_eq!(authors.author_to_titles["Jane Austen"], vec!["Emma".to_string(), "Persuasion".to_string()]);
    let (top, _) = index.similar_authors("Bram Stoker", 1).unwrap();
    assert_eq!(top[0].0, "Mary Shelley");
    assert_eq!(
        index.similar_authors("Homer", 1).unwrap_err(),
        PipelineError::UnknownAuthor { author: "Homer".into() }
    );

    let mut explicit = BTreeMap::new();
    explicit.insert("Dracula".to_string(), vec!["Stoker".to_string()]);
    explicit.insert("Not In Corpus".to_string(), vec!["Nobody".to_string()]);
    let overridden = build_index(library(), Some(explicit), &PipelineConfig::default()).unwrap();
    let profiles = overridden.authors.unwrap();
    assert_eq!(profiles.index.authors(), &["Stoker"]);
}

#[test]
fn feedback_reranks_toward_relevant_titles() {
    let index = built();
    let query = FeedbackQuery {
        title: "Dracula".into(),
        relevant: vec!["Frankenstein".into()],
        irrelevant: vec!["Persuasion".into()],
        text: None,
    };
    let adjusted = index
        .adjusted_query(&query.title, &query.relevant, &query.irrelevant, RocchioWeights::default(), true)
        .unwrap();
    assert_eq!(adjusted.len(), index.vocabulary.len());
    assert!(adjusted.iter().all(|x| *x >= 0.0));

    let matches = index.feedback_matches(&query, RocchioWeights::default(), true, 3).unwrap();
    assert_eq!(matches[0].title, "Frankenstein");
    assert!(matches.iter().all(|m| m.title != "Dracula"));

    let map = index.evaluate_feedback(&[query], RocchioWeights::default(), true).unwrap();
    assert!((map - 1.0).abs() < 1e-9);
}

#[test]
fn feedback_evaluation_rejects_empty_relevant_set() {
    let index = built();
    let query = FeedbackQuery { title: "Dracula".into(), ..Default::default() };
    assert_eq!(
        index.evaluate_feedback(&[query], RocchioWeights::default(), true).unwrap_err(),
        PipelineError::DegenerateRelevanceSet { query: 0 }
    );
}

#[test]
fn persisted_index_round_trips() {
    let index = built();
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    save_index(&paths, &index).unwrap();
    let loaded = load_index(&paths).unwrap();
    assert_eq!(loaded, index);
}

#[test]
fn free_text_feedback_starts_from_the_text() {
    let index = built();
    let query = FeedbackQuery { text: Some("A vampire in his CASTLE".into()), ..Default::default() };
    let matches = index.feedback_matches(&query, RocchioWeights::default(), true, 2).unwrap();
    assert_eq!(matches[0].title, "Dracula");

    // a resolvable title is only excluded from the results
    let query = FeedbackQuery {
        title: "Dracula".into(),
        text: Some("blood".into()),
        ..Default::default()
    };
    let matches = index.feedback_matches(&query, RocchioWeights::default(), true, 2).unwrap();
    assert_eq!(matches[0].title, "Frankenstein");
    assert!(matches.iter().all(|m| m.title != "Dracula"));

    let unknown = FeedbackQuery { title: "Ulysses".into(), ..Default::default() };
    assert_eq!(
        index.feedback_matches(&unknown, RocchioWeights::default(), true, 2).unwrap_err(),
        PipelineError::UnknownTitle { title: "Ulysses".into() }
    );
}

#[test]
fn loaded_index_keeps_tokenizer_settings() {
    let mut config = PipelineConfig::default();
    config.tokenizer.stem = true;
    let index = build_index(library(), None, &config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    save_index(&paths, &index).unwrap();

    let loaded = load_index(&paths).unwrap();
    assert!(loaded.tokenizer.stem);
    assert_eq!(loaded.vectorize_text("vampires castles"), index.vectorize_text("vampires castles"));
    assert!(loaded.vectorize_text("vampires").iter().any(|w| *w > 0.0));
}

#[test]
fn mismatched_components_fail_to_load() {
    let index = built();
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    save_index(&paths, &index).unwrap();

    let smaller = build_index(library()[2..6].to_vec(), None, &PipelineConfig::default()).unwrap();
    save_similarities(&paths, &smaller.similarities).unwrap();
    assert!(load_index(&paths).is_err());
}
