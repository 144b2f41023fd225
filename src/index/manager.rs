//! The index manager
//!
//! Documents are buffered in memory and flushed as immutable segments
//! (numbered from 0) once the flush threshold is reached. When the number
//! of segments reaches the merge threshold, segments are merged pairwise.
//! Queries only see flushed segments.

use std::{
    cell::Cell,
    collections::BTreeMap,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{
    buffer::SegmentBuffer,
    deletions::{merge_deletions, read_deletions, write_deletions},
    merge::merge_all,
    segment::{commit_segment, PostingValues, SegmentReader, SegmentWriter, TermPostings},
};
use crate::{
    analysis::Analyzer,
    base::{
        segment_path, temporary_path, DocId, Document, Len, Section, SegmentId, Term, INDEX_CBOR,
    },
    compress::PostingCodec,
    error::{IndexError, Result},
    options::{IndexKind, IndexOptions},
    search::{
        boolean::{contains_phrase, intersect_all, union_all},
        tfidf::{query_terms, ScoreAccumulator},
        ScoredDocument, TopScoredDocuments,
    },
    store::{DocumentStore, FileDocumentStore},
    utils::paged_file::IoStats,
};

const FLUSH_NAME: &str = "flush";
const DELETE_NAME: &str = "delete";

/// What is stored in `index.cbor`
#[derive(Serialize, Deserialize)]
struct Manifest {
    options: IndexOptions,
    kind: IndexKind,
    segment_count: usize,
}

/// Inverted lists and documents of one segment
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SegmentSnapshot {
    pub postings: BTreeMap<Term, Vec<DocId>>,
    pub documents: BTreeMap<DocId, Document>,
}

/// A segment snapshot that also holds the position lists
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PositionalSnapshot {
    pub postings: BTreeMap<Term, Vec<DocId>>,
    pub documents: BTreeMap<DocId, Document>,
    pub positions: BTreeMap<(Term, DocId), Vec<u32>>,
}

/// Which documents of a segment a query selects
enum Selection {
    All,
    Term(Term),
    And(Vec<Term>),
    Or(Vec<Term>),
    Phrase(Vec<Term>),
}

pub struct IndexManager {
    folder: PathBuf,
    analyzer: Box<dyn Analyzer>,
    options: IndexOptions,
    kind: IndexKind,
    num_segments: usize,
    buffer: SegmentBuffer,
    stats: Cell<IoStats>,
}

impl IndexManager {
    /// Creates or opens an index storing term frequencies
    pub fn create_or_open(
        folder: &Path,
        analyzer: Box<dyn Analyzer>,
        options: IndexOptions,
    ) -> Result<Self> {
        Self::open(folder, analyzer, IndexKind::Plain, options)
    }

    /// Creates or opens an index storing token positions with the given codec
    pub fn create_or_open_positional(
        folder: &Path,
        analyzer: Box<dyn Analyzer>,
        codec: Box<dyn PostingCodec>,
        options: IndexOptions,
    ) -> Result<Self> {
        Self::open(folder, analyzer, IndexKind::Positional(codec), options)
    }

    fn open(
        folder: &Path,
        analyzer: Box<dyn Analyzer>,
        kind: IndexKind,
        options: IndexOptions,
    ) -> Result<Self> {
        options.validate()?;
        if folder.exists() && !folder.is_dir() {
            return Err(IndexError::precondition(format!(
                "{} is not a directory",
                folder.display()
            )));
        }
        fs::create_dir_all(folder)?;

        let manifest_path = folder.join(INDEX_CBOR);
        let existing = manifest_path.exists();
        let num_segments = if existing {
            let reader = BufReader::new(File::open(&manifest_path)?);
            let manifest: Manifest = ciborium::de::from_reader(reader)?;
            if !manifest.kind.same_as(&kind) {
                return Err(IndexError::precondition(format!(
                    "the index in {} is {} and cannot be opened as {}",
                    folder.display(),
                    manifest.kind,
                    kind
                )));
            }
            if manifest.options.page_size != options.page_size {
                return Err(IndexError::precondition(format!(
                    "the index in {} uses pages of {} bytes (not {})",
                    folder.display(),
                    manifest.options.page_size,
                    options.page_size
                )));
            }
            manifest.segment_count
        } else {
            0
        };

        let manager = Self {
            folder: folder.to_path_buf(),
            analyzer,
            options,
            buffer: SegmentBuffer::new(kind.is_positional()),
            kind,
            num_segments,
            stats: Cell::new(IoStats::default()),
        };
        manager.save_manifest()?;

        info!(
            "Opened {} index in {} ({} segments, analyzer {})",
            manager.kind,
            folder.display(),
            num_segments,
            manager.analyzer.name()
        );
        Ok(manager)
    }

    fn save_manifest(&self) -> Result<()> {
        let manifest = Manifest {
            options: self.options,
            kind: self.kind.clone(),
            segment_count: self.num_segments,
        };

        let path = self.folder.join(INDEX_CBOR);
        let tmp_path = self.folder.join(format!("{}.tmp", INDEX_CBOR));
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        ciborium::ser::into_writer(&manifest, &mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    pub fn kind(&self) -> &IndexKind {
        &self.kind
    }

    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    /// Number of documents not flushed yet
    pub fn num_buffered_documents(&self) -> usize {
        self.buffer.len()
    }

    /// Pages read and written since the index was opened (or the
    /// counters reset)
    pub fn io_stats(&self) -> IoStats {
        self.stats.get()
    }

    pub fn reset_io_stats(&self) {
        self.stats.set(IoStats::default());
    }

    fn add_stats(&self, stats: IoStats) {
        let mut total = self.stats.get();
        total += stats;
        self.stats.set(total);
    }

    /// First term of an analyzed keyword
    fn first_token(&self, keyword: &str) -> Option<Term> {
        self.analyzer
            .analyze(keyword)
            .into_iter()
            .next()
            .filter(|t| !t.is_empty())
    }

    fn first_tokens(&self, keywords: &[&str]) -> Vec<Term> {
        keywords
            .iter()
            .filter_map(|k| self.first_token(k))
            .collect()
    }

    fn open_segment(&self, segment: SegmentId) -> Result<SegmentReader> {
        SegmentReader::open(&self.folder, segment, self.options.page_size, &self.kind)
    }

    fn close_segment(&self, reader: SegmentReader) -> Result<()> {
        self.add_stats(reader.close()?);
        Ok(())
    }

    /// Adds a document to the in-memory buffer, flushing it if the flush
    /// threshold is reached
    pub fn add_document(&mut self, document: Document) -> Result<()> {
        let terms = self.analyzer.analyze(document.text());
        self.buffer.add(&terms, document);

        if self.buffer.len() >= self.options.flush_threshold {
            self.flush()?;
        }
        Ok(())
    }

    /// Writes the buffered documents as a new segment
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let segment = self.num_segments;
        let page_size = self.options.page_size;
        let mut writer = SegmentWriter::create(&self.folder, FLUSH_NAME, page_size, &self.kind)?;

        for (term, buffered) in self.buffer.postings().iter() {
            let docids = buffered.iter().map(|p| p.docid).collect();
            let values = match self.kind.codec() {
                None => {
                    PostingValues::Frequencies(buffered.iter().map(|p| p.frequency).collect())
                }
                Some(codec) => PostingValues::Positions(
                    buffered
                        .iter()
                        .map(|p| codec.encode(&p.positions))
                        .collect::<Result<Vec<_>>>()?,
                ),
            };
            writer.add_term(term, &TermPostings { docids, values })?;
        }

        let num_terms = self.buffer.postings().len();
        let documents = self
            .buffer
            .documents()
            .iter()
            .cloned()
            .enumerate()
            .map(|(ix, document)| (ix as DocId, document));
        self.add_stats(writer.finish(documents, &[])?);
        commit_segment(&self.folder, FLUSH_NAME, segment)?;

        let (_, documents) = self.buffer.take();
        self.num_segments += 1;
        self.save_manifest()?;
        info!(
            "[flush] segment {} written ({} documents, {} terms)",
            segment,
            documents.len(),
            num_terms
        );

        if self.num_segments >= self.options.merge_threshold && self.num_segments % 2 == 0 {
            self.merge_all_segments()?;
        }
        Ok(())
    }

    /// Merges segments 2i and 2i+1 into segment i; the number of segments
    /// must be even
    pub fn merge_all_segments(&mut self) -> Result<()> {
        if self.num_segments % 2 != 0 {
            return Err(IndexError::precondition(format!(
                "cannot merge an odd number of segments ({})",
                self.num_segments
            )));
        }

        let stats = merge_all(
            &self.folder,
            self.num_segments,
            self.options.page_size,
            &self.kind,
        )?;
        self.add_stats(stats);

        self.num_segments /= 2;
        self.save_manifest()?;
        info!("[merge] index now has {} segments", self.num_segments);
        Ok(())
    }

    /// Documents containing the (first term of the) keyword
    pub fn search_query(&self, keyword: &str) -> Documents<'_> {
        match self.first_token(keyword) {
            Some(term) => Documents::new(self, Selection::Term(term)),
            None => Documents::empty(self),
        }
    }

    /// Documents containing all the keywords
    pub fn search_and_query(&self, keywords: &[&str]) -> Documents<'_> {
        let terms = self.first_tokens(keywords);
        if terms.is_empty() {
            return Documents::empty(self);
        }
        Documents::new(self, Selection::And(terms))
    }

    /// Documents containing any of the keywords
    pub fn search_or_query(&self, keywords: &[&str]) -> Documents<'_> {
        let terms = self.first_tokens(keywords);
        if terms.is_empty() {
            return Documents::empty(self);
        }
        Documents::new(self, Selection::Or(terms))
    }

    /// Documents where the analyzed phrase appears as consecutive tokens
    pub fn search_phrase_query(&self, phrase: &[&str]) -> Result<Documents<'_>> {
        if !self.kind.is_positional() {
            return Err(IndexError::unsupported(
                "phrase queries require a positional index",
            ));
        }

        let mut terms = self.analyzer.analyze(&phrase.join(" "));
        Ok(match terms.len() {
            0 => Documents::empty(self),
            1 => Documents::new(self, Selection::Term(terms.remove(0))),
            _ => Documents::new(self, Selection::Phrase(terms)),
        })
    }

    /// All the flushed documents, by segment and document ID
    pub fn document_iterator(&self) -> Documents<'_> {
        Documents::new(self, Selection::All)
    }

    /// Ranks the documents by TF-IDF and returns the `top_k` best (or all
    /// of them), best first
    pub fn search_tf_idf(
        &self,
        keywords: &[&str],
        top_k: Option<usize>,
    ) -> Result<Vec<(Document, f64)>> {
        let terms = self.analyzer.analyze(&keywords.join(" "));
        if terms.is_empty() || top_k == Some(0) {
            return Ok(Vec::new());
        }

        let mut readers = Vec::with_capacity(self.num_segments);
        let mut stores = Vec::with_capacity(self.num_segments);
        for segment in 0..self.num_segments {
            let reader = self.open_segment(segment)?;
            stores.push(reader.open_documents()?);
            readers.push(reader);
        }
        let total_documents: u64 = stores.iter().map(|store| store.len() as u64).sum();

        let weights = query_terms(&terms, total_documents, |term| {
            readers
                .iter()
                .map(|r| r.document_frequency(term) as u64)
                .sum()
        });

        let mut top = TopScoredDocuments::new(top_k);
        for reader in readers.iter_mut() {
            let mut accumulator = ScoreAccumulator::new();
            for weight in weights.iter() {
                for (docid, tf) in reader.frequencies(&weight.term)? {
                    accumulator.add(docid, tf, weight);
                }
            }

            let segment = reader.id();
            for (docid, score) in accumulator.scores() {
                top.add(ScoredDocument {
                    segment,
                    docid,
                    score,
                });
            }
        }
        for reader in readers {
            self.close_segment(reader)?;
        }

        let mut results = Vec::with_capacity(top.len());
        for scored in top.into_sorted_vec() {
            let document = stores[scored.segment]
                .get_document(scored.docid)
                .ok_or_else(|| missing_document(scored.segment, scored.docid))?;
            results.push((document, scored.score));
        }

        debug!("TF-IDF query {:?}: {} results", terms, results.len());
        Ok(results)
    }

    /// Marks the documents containing the (first term of the) keyword as
    /// deleted. Deleted documents are recorded, not filtered out of queries.
    pub fn delete_documents(&mut self, keyword: &str) -> Result<()> {
        let term = match self.first_token(keyword) {
            Some(term) => term,
            None => return Ok(()),
        };

        let mut deleted = 0;
        for segment in 0..self.num_segments {
            let mut reader = self.open_segment(segment)?;
            let docids = reader.docids(&term)?;
            if !docids.is_empty() {
                let all = merge_deletions(&reader.deletions()?, &docids);
                let tmp_path = temporary_path(&self.folder, DELETE_NAME, Section::Deletions);
                self.add_stats(write_deletions(&tmp_path, self.options.page_size, &all)?);
                fs::rename(&tmp_path, segment_path(&self.folder, segment, Section::Deletions))?;
                deleted += docids.len();
            }
            self.close_segment(reader)?;
        }

        info!("[delete] {} documents marked as deleted ({:?})", deleted, term);
        Ok(())
    }

    /// Document IDs marked as deleted in a segment
    pub fn deleted_documents(&self, segment: SegmentId) -> Result<Vec<DocId>> {
        if segment >= self.num_segments {
            return Ok(Vec::new());
        }
        let path = segment_path(&self.folder, segment, Section::Deletions);
        let (docids, stats) = read_deletions(&path, self.options.page_size)?;
        self.add_stats(stats);
        Ok(docids)
    }

    /// Number of documents of a segment containing an (analyzed) term
    pub fn document_frequency(&self, segment: SegmentId, term: &str) -> Result<usize> {
        if segment >= self.num_segments {
            return Ok(0);
        }
        let reader = self.open_segment(segment)?;
        let frequency = reader.document_frequency(term) as usize;
        self.close_segment(reader)?;
        Ok(frequency)
    }

    /// Number of documents of a segment
    pub fn num_documents(&self, segment: SegmentId) -> Result<usize> {
        if segment >= self.num_segments {
            return Ok(0);
        }
        let path = segment_path(&self.folder, segment, Section::Documents);
        Ok(FileDocumentStore::create_or_open(&path)?.len())
    }

    /// Reads the postings and documents of a segment (None if the
    /// segment does not exist)
    pub fn index_segment(&self, segment: SegmentId) -> Result<Option<SegmentSnapshot>> {
        if segment >= self.num_segments {
            return Ok(None);
        }

        let mut reader = self.open_segment(segment)?;
        let entries = reader.dictionary().entries().to_vec();
        let mut postings = BTreeMap::new();
        for entry in entries {
            let term_postings = reader.read_postings(entry.location)?;
            postings.insert(entry.term, term_postings.docids);
        }
        let documents = reader.open_documents()?.into_documents();
        self.close_segment(reader)?;

        Ok(Some(SegmentSnapshot {
            postings,
            documents,
        }))
    }

    /// Like [IndexManager::index_segment], with the decoded positions
    pub fn index_segment_positional(
        &self,
        segment: SegmentId,
    ) -> Result<Option<PositionalSnapshot>> {
        if !self.kind.is_positional() {
            return Err(IndexError::unsupported(
                "positions are only stored by positional indices",
            ));
        }
        if segment >= self.num_segments {
            return Ok(None);
        }

        let mut reader = self.open_segment(segment)?;
        let entries = reader.dictionary().entries().to_vec();
        let mut snapshot = PositionalSnapshot::default();
        for entry in entries {
            let term_postings = reader.read_postings(entry.location)?;
            if let PostingValues::Positions(blocks) = &term_postings.values {
                for (docid, block) in term_postings.docids.iter().zip(blocks.iter()) {
                    snapshot
                        .positions
                        .insert((entry.term.clone(), *docid), reader.decode_positions(block)?);
                }
            }
            snapshot.postings.insert(entry.term, term_postings.docids);
        }
        snapshot.documents = reader.open_documents()?.into_documents();
        self.close_segment(reader)?;

        Ok(Some(snapshot))
    }

    /// Documents of one segment selected by a query
    fn segment_documents(
        &self,
        segment: SegmentId,
        selection: &Selection,
    ) -> Result<Vec<Document>> {
        let mut reader = self.open_segment(segment)?;
        let docids = match selection {
            Selection::All => None,
            Selection::Term(term) => Some(reader.docids(term)?),
            Selection::And(terms) => {
                let mut lists = Vec::with_capacity(terms.len());
                for term in terms.iter() {
                    let list = reader.docids(term)?;
                    if list.is_empty() {
                        lists = vec![list];
                        break;
                    }
                    lists.push(list);
                }
                Some(intersect_all(&lists))
            }
            Selection::Or(terms) => {
                let mut lists = Vec::with_capacity(terms.len());
                for term in terms.iter() {
                    lists.push(reader.docids(term)?);
                }
                Some(union_all(&lists))
            }
            Selection::Phrase(terms) => Some(phrase_docids(&mut reader, terms)?),
        };

        let store = reader.open_documents()?;
        self.close_segment(reader)?;

        match docids {
            None => Ok(store.into_documents().into_values().collect()),
            Some(docids) => {
                debug!("[{}] {} matching documents", segment, docids.len());
                docids
                    .iter()
                    .map(|docid| {
                        store
                            .get_document(*docid)
                            .ok_or_else(|| missing_document(segment, *docid))
                    })
                    .collect()
            }
        }
    }
}

fn missing_document(segment: SegmentId, docid: DocId) -> IndexError {
    IndexError::corrupt(format!(
        "document {} is missing from the store of segment {}",
        docid, segment
    ))
}

/// Documents of a segment where the terms appear consecutively
fn phrase_docids(reader: &mut SegmentReader, terms: &[Term]) -> Result<Vec<DocId>> {
    let mut postings = Vec::with_capacity(terms.len());
    for term in terms.iter() {
        match reader.postings(term)? {
            Some(p) => postings.push(p),
            None => return Ok(Vec::new()),
        }
    }

    let lists: Vec<Vec<DocId>> = postings.iter().map(|p| p.docids.clone()).collect();
    let mut result = Vec::new();
    for docid in intersect_all(&lists) {
        let mut positions = Vec::with_capacity(postings.len());
        for term_postings in postings.iter() {
            let block = match (
                term_postings.docids.binary_search(&docid),
                &term_postings.values,
            ) {
                (Ok(ix), PostingValues::Positions(blocks)) => &blocks[ix],
                _ => {
                    return Err(IndexError::corrupt(format!(
                        "no positions for document {} in segment {}",
                        docid,
                        reader.id()
                    )))
                }
            };
            positions.push(reader.decode_positions(block)?);
        }

        if contains_phrase(&positions) {
            result.push(docid);
        }
    }
    Ok(result)
}

/// Lazy iterator over the documents matching a query, segment by segment
pub struct Documents<'a> {
    manager: &'a IndexManager,
    selection: Selection,
    segment: SegmentId,
    current: std::vec::IntoIter<Document>,
}

impl<'a> Documents<'a> {
    fn new(manager: &'a IndexManager, selection: Selection) -> Self {
        Self {
            manager,
            selection,
            segment: 0,
            current: Vec::new().into_iter(),
        }
    }

    fn empty(manager: &'a IndexManager) -> Self {
        let mut documents = Self::new(manager, Selection::All);
        documents.segment = manager.num_segments;
        documents
    }
}

impl<'a> Iterator for Documents<'a> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(document) = self.current.next() {
                return Some(Ok(document));
            }
            if self.segment >= self.manager.num_segments {
                return None;
            }

            let segment = self.segment;
            self.segment += 1;
            match self.manager.segment_documents(segment, &self.selection) {
                Ok(documents) => self.current = documents.into_iter(),
                Err(e) => {
                    // Stops after the first error
                    self.segment = self.manager.num_segments;
                    return Some(Err(e));
                }
            }
        }
    }
}
