use temp_dir::TempDir;

use helpers::index::collect;
use segment_index::{
    compress::{DeltaVarLenCodec, FixedWidthCodec, PostingCodec},
    utils::paged_file::IoStats,
    Document, IndexManager, IndexOptions, NaiveAnalyzer,
};

/// Initialize the logger
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Indexes a repetitive corpus and returns the page statistics of the
/// indexing and of a phrase query
fn index_corpus(codec: Box<dyn PostingCodec>) -> (IoStats, IoStats) {
    let dir = TempDir::new().expect("Could not create temporary directory");
    let mut manager = IndexManager::create_or_open_positional(
        dir.path(),
        Box::new(NaiveAnalyzer {}),
        codec,
        IndexOptions {
            flush_threshold: 50,
            merge_threshold: 2,
            page_size: 256,
        },
    )
    .unwrap();

    for ix in 0..100 {
        let text = format!("{}end{}", "to be or not to be ".repeat(20), ix % 10);
        manager.add_document(Document::new(text)).unwrap();
    }
    assert_eq!(manager.num_segments(), 1);
    let indexing = manager.io_stats();

    manager.reset_io_stats();
    assert_eq!(manager.io_stats(), IoStats::default());
    let found = collect(manager.search_phrase_query(&["be end3"]).unwrap());
    assert_eq!(found.len(), 10);
    let querying = manager.io_stats();
    assert_eq!(querying.pages_written, 0);

    (indexing, querying)
}

#[test]
fn test_varlen_writes_fewer_pages() {
    init_logger();
    let (varlen, varlen_query) = index_corpus(Box::new(DeltaVarLenCodec {}));
    let (fixed, fixed_query) = index_corpus(Box::new(FixedWidthCodec {}));

    assert!(varlen.pages_written > 0);
    assert!(
        varlen.pages_written < fixed.pages_written,
        "{:?} vs {:?}",
        varlen,
        fixed
    );
    assert!(varlen_query.pages_read > 0);
    assert!(varlen_query.pages_read <= fixed_query.pages_read);
}

#[test]
fn test_io_stats() {
    init_logger();
    let dir = TempDir::new().expect("Could not create temporary directory");
    let mut manager = IndexManager::create_or_open(
        dir.path(),
        Box::new(NaiveAnalyzer {}),
        IndexOptions::default(),
    )
    .unwrap();
    assert_eq!(manager.io_stats(), IoStats::default());

    manager.add_document(Document::new("cat dog")).unwrap();
    assert_eq!(manager.io_stats(), IoStats::default());
    manager.flush().unwrap();
    let stats = manager.io_stats();
    assert!(stats.pages_written > 0);

    assert_eq!(collect(manager.search_query("cat")).len(), 1);
    assert!(manager.io_stats().pages_read > stats.pages_read);

    manager.reset_io_stats();
    assert_eq!(manager.io_stats(), IoStats::default());
}
