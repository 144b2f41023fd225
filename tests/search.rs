use std::collections::BTreeSet;

use rstest::rstest;
use temp_dir::TempDir;

use helpers::{
    documents::word,
    index::{collect, TestIndex},
};
use segment_index::{Document, IndexManager, IndexOptions, NaiveAnalyzer};

/// Initialize the logger
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn options(flush_threshold: usize, merge_threshold: usize) -> IndexOptions {
    IndexOptions {
        flush_threshold,
        merge_threshold,
        ..Default::default()
    }
}

fn texts(documents: Vec<Document>) -> Vec<String> {
    documents.iter().map(|d| d.text().to_string()).collect()
}

/// A small index with two segments and one buffered document
fn animals(dir: &TempDir) -> IndexManager {
    let mut manager =
        IndexManager::create_or_open(dir.path(), Box::new(NaiveAnalyzer {}), options(2, 8))
            .unwrap();
    for text in [
        "cat dog",
        "cat elephant",
        "wolf dog",
        "Cat wolf",
        "cat dog wolf",
    ] {
        manager.add_document(Document::new(text)).unwrap();
    }
    assert_eq!(manager.num_segments(), 2);
    assert_eq!(manager.num_buffered_documents(), 1);
    manager
}

#[test]
fn test_keyword_query() {
    init_logger();
    let dir = TempDir::new().expect("Could not create temporary directory");
    let manager = animals(&dir);

    // The buffered document is not visible
    assert_eq!(
        texts(collect(manager.search_query("cat"))),
        vec!["cat dog", "cat elephant", "Cat wolf"]
    );
    // Only the first term of the keyword is used
    assert_eq!(
        texts(collect(manager.search_query("WOLF elephant"))),
        vec!["wolf dog", "Cat wolf"]
    );
    assert!(collect(manager.search_query("zebra")).is_empty());
}

#[test]
fn test_boolean_queries() {
    init_logger();
    let dir = TempDir::new().expect("Could not create temporary directory");
    let manager = animals(&dir);

    assert_eq!(
        texts(collect(manager.search_and_query(&["cat", "dog"]))),
        vec!["cat dog"]
    );
    assert_eq!(
        texts(collect(manager.search_and_query(&["wolf", "cat"]))),
        vec!["Cat wolf"]
    );
    assert_eq!(
        texts(collect(manager.search_or_query(&["elephant", "wolf"]))),
        vec!["cat elephant", "wolf dog", "Cat wolf"]
    );
    assert!(collect(manager.search_and_query(&["zzz_nonexistent", "cat"])).is_empty());
    assert_eq!(
        texts(collect(manager.search_or_query(&["zzz_nonexistent", "elephant"]))),
        vec!["cat elephant"]
    );

    // Blank keywords are ignored
    assert_eq!(
        texts(collect(manager.search_and_query(&["", "elephant", "  "]))),
        vec!["cat elephant"]
    );
}

#[rstest]
#[case("")]
#[case("   ")]
fn test_blank_queries(#[case] keyword: &str) {
    init_logger();
    let dir = TempDir::new().expect("Could not create temporary directory");
    let manager = animals(&dir);

    assert!(collect(manager.search_query(keyword)).is_empty());
    assert!(collect(manager.search_and_query(&[keyword])).is_empty());
    assert!(collect(manager.search_or_query(&[keyword, keyword])).is_empty());
    assert!(collect(manager.search_and_query(&[])).is_empty());
    assert!(collect(manager.search_or_query(&[])).is_empty());
}

#[test]
fn test_document_iterator() {
    init_logger();
    let dir = TempDir::new().expect("Could not create temporary directory");
    let mut manager = animals(&dir);

    assert_eq!(
        texts(collect(manager.document_iterator())),
        vec!["cat dog", "cat elephant", "wolf dog", "Cat wolf"]
    );
    manager.flush().unwrap();
    assert_eq!(collect(manager.document_iterator()).len(), 5);
    assert_eq!(
        texts(collect(manager.search_query("wolf"))),
        vec!["wolf dog", "Cat wolf", "cat dog wolf"]
    );
}

#[rstest]
#[case(10, 8, 1)]
#[case(7, 4, 2)]
#[case(100, 8, 3)]
fn test_random_queries(
    #[case] flush_threshold: usize,
    #[case] merge_threshold: usize,
    #[case] seed: u64,
) {
    init_logger();
    let mut data = TestIndex::new(
        30,
        100,
        5.,
        Some(seed),
        options(flush_threshold, merge_threshold),
        None,
    );
    data.manager.flush().unwrap();

    let all = data.texts();
    let select = |ixs: BTreeSet<usize>| -> Vec<String> {
        ixs.into_iter().map(|ix| all[ix].clone()).collect()
    };

    for ix in 0..5 {
        let (a, b) = (2 * ix, 2 * ix + 1);
        let (word_a, word_b) = (word(a), word(b));

        let found = texts(collect(data.manager.search_query(&word_a)));
        assert_eq!(found, select(data.containing(a)), "query {}", word_a);

        let both: BTreeSet<usize> = data
            .containing(a)
            .intersection(&data.containing(b))
            .copied()
            .collect();
        let either: BTreeSet<usize> = data
            .containing(a)
            .union(&data.containing(b))
            .copied()
            .collect();

        let keywords = [word_a.as_str(), word_b.as_str()];
        let and = texts(collect(data.manager.search_and_query(&keywords)));
        let or = texts(collect(data.manager.search_or_query(&keywords)));
        assert_eq!(and, select(both));
        assert_eq!(or, select(either));
        assert!(and.len() <= or.len());
    }
}
