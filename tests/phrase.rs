use rstest::rstest;
use temp_dir::TempDir;

use helpers::index::collect;
use segment_index::{
    compress::{DeltaVarLenCodec, FixedWidthCodec, PostingCodec},
    Document, IndexError, IndexManager, IndexOptions, NaiveAnalyzer, PunctuationAnalyzer,
};

/// Initialize the logger
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn options(flush_threshold: usize) -> IndexOptions {
    IndexOptions {
        flush_threshold,
        ..Default::default()
    }
}

fn texts(documents: Vec<Document>) -> Vec<String> {
    documents.iter().map(|d| d.text().to_string()).collect()
}

fn positional(dir: &TempDir, codec: Box<dyn PostingCodec>) -> IndexManager {
    let mut manager = IndexManager::create_or_open_positional(
        dir.path(),
        Box::new(NaiveAnalyzer {}),
        codec,
        options(2),
    )
    .unwrap();
    for text in [
        "the quick brown fox",
        "brown quick fox",
        "a quick brown dog and a brown fox",
        "quick quick brown brown fox",
    ] {
        manager.add_document(Document::new(text)).unwrap();
    }
    assert_eq!(manager.num_segments(), 2);
    manager
}

#[rstest]
#[case(Box::new(DeltaVarLenCodec {}))]
#[case(Box::new(FixedWidthCodec {}))]
fn test_phrase_query(#[case] codec: Box<dyn PostingCodec>) {
    init_logger();
    let dir = TempDir::new().expect("Could not create temporary directory");
    let manager = positional(&dir, codec);

    let found = texts(collect(manager.search_phrase_query(&["quick", "brown"]).unwrap()));
    assert_eq!(
        found,
        vec![
            "the quick brown fox",
            "a quick brown dog and a brown fox",
            "quick quick brown brown fox"
        ]
    );

    // Keywords are joined before analysis
    let found = texts(collect(manager.search_phrase_query(&["brown fox"]).unwrap()));
    assert_eq!(
        found,
        vec![
            "the quick brown fox",
            "a quick brown dog and a brown fox",
            "quick quick brown brown fox"
        ]
    );

    let found = texts(collect(
        manager.search_phrase_query(&["quick", "brown", "fox"]).unwrap(),
    ));
    assert_eq!(found, vec!["the quick brown fox"]);

    // Both terms appear, but not next to each other
    assert!(collect(manager.search_phrase_query(&["fox", "quick"]).unwrap()).is_empty());
    assert!(collect(manager.search_phrase_query(&["quick", "dog"]).unwrap()).is_empty());
    assert!(collect(manager.search_phrase_query(&["zebra", "fox"]).unwrap()).is_empty());
}

#[test]
fn test_degenerate_phrases() {
    init_logger();
    let dir = TempDir::new().expect("Could not create temporary directory");
    let manager = positional(&dir, Box::new(DeltaVarLenCodec {}));

    // A single term behaves like a keyword query
    assert_eq!(
        collect(manager.search_phrase_query(&["DOG"]).unwrap()),
        collect(manager.search_query("dog"))
    );
    assert_eq!(
        collect(manager.search_phrase_query(&["  fox "]).unwrap()),
        collect(manager.search_query("fox"))
    );

    assert!(collect(manager.search_phrase_query(&[]).unwrap()).is_empty());
    assert!(collect(manager.search_phrase_query(&["", "  "]).unwrap()).is_empty());
}

#[test]
fn test_phrase_with_stop_words() {
    // Positions are counted after stop words are removed
    init_logger();
    let dir = TempDir::new().expect("Could not create temporary directory");
    let mut manager = IndexManager::create_or_open_positional(
        dir.path(),
        Box::new(PunctuationAnalyzer::default()),
        Box::new(DeltaVarLenCodec {}),
        options(10),
    )
    .unwrap();
    manager
        .add_document(Document::new("Salt and pepper, please."))
        .unwrap();
    manager
        .add_document(Document::new("Pepper. Salt!"))
        .unwrap();
    manager.flush().unwrap();

    let found = texts(collect(manager.search_phrase_query(&["salt", "pepper"]).unwrap()));
    assert_eq!(found, vec!["Salt and pepper, please."]);
    let found = texts(collect(manager.search_phrase_query(&["pepper salt"]).unwrap()));
    assert_eq!(found, vec!["Pepper. Salt!"]);
}

#[test]
fn test_plain_index_unsupported() {
    init_logger();
    let dir = TempDir::new().expect("Could not create temporary directory");
    let mut manager =
        IndexManager::create_or_open(dir.path(), Box::new(NaiveAnalyzer {}), options(1)).unwrap();
    manager.add_document(Document::new("quick brown fox")).unwrap();

    assert!(matches!(
        manager.search_phrase_query(&["quick", "brown"]),
        Err(IndexError::Unsupported(_))
    ));
    assert!(matches!(
        manager.index_segment_positional(0),
        Err(IndexError::Unsupported(_))
    ));
}
