//! In-memory postings of the documents not yet flushed

use std::collections::BTreeMap;

use crate::base::{DocId, Document, Len, Term};

/// Occurrences of a term in one buffered document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferedPosting {
    pub docid: DocId,
    pub frequency: u32,
    /// Token offsets (empty when positions are not tracked)
    pub positions: Vec<u32>,
}

/// Buffer of documents and postings, turned into a segment on flush
pub struct SegmentBuffer {
    track_positions: bool,
    postings: BTreeMap<Term, Vec<BufferedPosting>>,
    documents: Vec<Document>,
}

impl SegmentBuffer {
    pub fn new(track_positions: bool) -> Self {
        Self {
            track_positions,
            postings: BTreeMap::new(),
            documents: Vec::new(),
        }
    }

    /// Adds a document given its analyzed terms, and returns its local ID
    pub fn add(&mut self, terms: &[Term], document: Document) -> DocId {
        let docid = self.documents.len() as DocId;

        for (position, term) in terms.iter().enumerate() {
            let postings = self.postings.entry(term.clone()).or_default();
            let same_document = matches!(postings.last(), Some(p) if p.docid == docid);
            if !same_document {
                postings.push(BufferedPosting {
                    docid,
                    frequency: 0,
                    positions: Vec::new(),
                });
            }

            if let Some(posting) = postings.last_mut() {
                posting.frequency += 1;
                if self.track_positions {
                    posting.positions.push(position as u32);
                }
            }
        }

        self.documents.push(document);
        docid
    }

    /// Postings by ascending term
    pub fn postings(&self) -> &BTreeMap<Term, Vec<BufferedPosting>> {
        &self.postings
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Empties the buffer, returning its postings and documents
    pub fn take(&mut self) -> (BTreeMap<Term, Vec<BufferedPosting>>, Vec<Document>) {
        (
            std::mem::take(&mut self.postings),
            std::mem::take(&mut self.documents),
        )
    }
}

impl Len for SegmentBuffer {
    fn len(&self) -> usize {
        self.documents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(text: &str) -> Vec<Term> {
        text.split(' ').map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_buffer_postings() {
        let mut buffer = SegmentBuffer::new(true);
        assert_eq!(buffer.add(&terms("cat dog cat"), Document::new("cat dog cat")), 0);
        assert_eq!(buffer.add(&terms("dog wolf"), Document::new("dog wolf")), 1);
        assert_eq!(buffer.len(), 2);

        let postings = buffer.postings();
        assert_eq!(
            postings.keys().collect::<Vec<_>>(),
            vec!["cat", "dog", "wolf"]
        );
        assert_eq!(
            postings["cat"],
            vec![BufferedPosting {
                docid: 0,
                frequency: 2,
                positions: vec![0, 2]
            }]
        );
        let dog: Vec<_> = postings["dog"].iter().map(|p| p.docid).collect();
        assert_eq!(dog, vec![0, 1]);

        let (postings, documents) = buffer.take();
        assert_eq!(postings.len(), 3);
        assert_eq!(documents.len(), 2);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_no_positions() {
        let mut buffer = SegmentBuffer::new(false);
        buffer.add(&terms("a a a"), Document::new("a a a"));
        let posting = &buffer.postings()["a"][0];
        assert_eq!(posting.frequency, 3);
        assert!(posting.positions.is_empty());
    }
}
