use std::collections::{BTreeMap, BTreeSet};

use log::info;
use rand::{rngs::StdRng, SeedableRng};
use temp_dir::TempDir;

use crate::documents::{create_document, word, TestDocument};
use segment_index::{
    compress::PostingCodec, Document, IndexManager, IndexOptions, NaiveAnalyzer, Result,
};

/// A random index along with the documents it was built from
pub struct TestIndex {
    pub dir: TempDir,
    pub vocabulary_size: usize,
    pub manager: IndexManager,
    pub documents: Vec<TestDocument>,
}

impl TestIndex {
    /// Builds an index of `document_count` random documents; the index is
    /// positional when a codec is given
    pub fn new(
        vocabulary_size: usize,
        document_count: usize,
        lambda_words: f32,
        seed: Option<u64>,
        options: IndexOptions,
        codec: Option<Box<dyn PostingCodec>>,
    ) -> Self {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let analyzer = Box::new(NaiveAnalyzer {});
        let mut manager = match codec {
            Some(codec) => {
                IndexManager::create_or_open_positional(dir.path(), analyzer, codec, options)
            }
            None => IndexManager::create_or_open(dir.path(), analyzer, options),
        }
        .expect("Error while creating the index");

        let mut rng = if let Some(seed) = seed {
            StdRng::seed_from_u64(seed)
        } else {
            StdRng::from_entropy()
        };

        let mut documents = Vec::new();
        for _ in 0..document_count {
            let document = create_document(lambda_words, vocabulary_size, &mut rng);
            manager
                .add_document(document.to_document())
                .expect("Error while adding a document");
            documents.push(document);
        }

        info!(
            "Built an index of {} documents ({} segments) in {}",
            document_count,
            manager.num_segments(),
            dir.path().display()
        );

        Self {
            dir,
            vocabulary_size,
            manager,
            documents,
        }
    }

    /// Indices (in insertion order) of the documents containing a word
    pub fn containing(&self, word_ix: usize) -> BTreeSet<usize> {
        self.documents
            .iter()
            .enumerate()
            .filter(|(_, d)| d.words.contains(&word_ix))
            .map(|(ix, _)| ix)
            .collect()
    }

    /// Number of documents containing each word
    pub fn document_frequencies(&self) -> BTreeMap<String, usize> {
        let mut frequencies = BTreeMap::new();
        for ix in 0..self.vocabulary_size {
            let count = self.containing(ix).len();
            if count > 0 {
                frequencies.insert(word(ix), count);
            }
        }
        frequencies
    }

    /// Texts of the documents, in insertion order
    pub fn texts(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.text()).collect()
    }
}

/// Collects the results of a query, failing on the first error
pub fn collect<I: Iterator<Item = Result<Document>>>(iter: I) -> Vec<Document> {
    iter.collect::<Result<Vec<_>>>()
        .expect("Error while iterating over the results")
}
