pub mod boolean;
pub mod tfidf;

use std::{cmp::Ordering, collections::BinaryHeap};

use crate::base::{DocId, SegmentId};

/// A document of a given segment, with its score
#[derive(Clone, Copy, Debug)]
pub struct ScoredDocument {
    pub segment: SegmentId,
    pub docid: DocId,
    pub score: f64,
}

impl std::fmt::Display for ScoredDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}:{},{})", self.segment, self.docid, self.score)
    }
}

impl PartialEq for ScoredDocument {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredDocument {}

impl PartialOrd for ScoredDocument {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Better documents come first: higher scores, then lower
/// (segment, document) pairs
impl Ord for ScoredDocument {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| (self.segment, self.docid).cmp(&(other.segment, other.docid)))
    }
}

/// Keeps the `top_k` best documents (all of them if unbounded); the heap
/// top is the worst kept document
pub struct TopScoredDocuments {
    heap: BinaryHeap<ScoredDocument>,
    top_k: Option<usize>,
}

impl TopScoredDocuments {
    pub fn new(top_k: Option<usize>) -> Self {
        Self {
            heap: BinaryHeap::new(),
            top_k,
        }
    }

    /// Add a new candidate
    pub fn add(&mut self, candidate: ScoredDocument) {
        match self.top_k {
            Some(top_k) if self.heap.len() >= top_k => {
                let replace = matches!(self.heap.peek(), Some(worst) if candidate < *worst);
                if replace {
                    self.heap.pop();
                    self.heap.push(candidate);
                }
            }
            _ => self.heap.push(candidate),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns the documents, best first
    pub fn into_sorted_vec(self) -> Vec<ScoredDocument> {
        self.heap.into_sorted_vec()
    }
}
