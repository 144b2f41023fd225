//! TF-IDF ranking
//!
//! Documents are scored by the cosine between the query and document
//! TF-IDF vectors, where the document norm only accounts for the query
//! terms.

use std::collections::{BTreeMap, HashMap};

use crate::base::{DocId, Term};

/// IDF and query term frequency of one distinct query term
#[derive(Clone, Debug, PartialEq)]
pub struct QueryTerm {
    pub term: Term,
    pub idf: f64,
    pub query_tf: f64,
}

/// Computes the weights of the distinct query terms
///
/// `document_frequency` gives the number of documents containing a term
/// over all segments. A query with a single distinct term gets an IDF and
/// a query frequency of 1. Terms that no document contains are dropped.
pub fn query_terms<F>(terms: &[Term], total_documents: u64, document_frequency: F) -> Vec<QueryTerm>
where
    F: Fn(&str) -> u64,
{
    let mut counts: BTreeMap<&Term, u32> = BTreeMap::new();
    for term in terms.iter() {
        *counts.entry(term).or_default() += 1;
    }

    if counts.len() == 1 {
        return counts
            .into_keys()
            .map(|term| QueryTerm {
                term: term.clone(),
                idf: 1.,
                query_tf: 1.,
            })
            .collect();
    }

    counts
        .into_iter()
        .filter_map(|(term, count)| {
            let df = document_frequency(term);
            if df == 0 {
                return None;
            }
            Some(QueryTerm {
                term: term.clone(),
                idf: (total_documents as f64 / df as f64).ln(),
                query_tf: count as f64,
            })
        })
        .collect()
}

/// Accumulates the dot product and the (restricted) squared norm of the
/// documents of one segment
#[derive(Default)]
pub struct ScoreAccumulator {
    accumulators: HashMap<DocId, (f64, f64)>,
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the contribution of a query term to a document where it
    /// appears `tf` times
    pub fn add(&mut self, docid: DocId, tf: u32, query_term: &QueryTerm) {
        let weight = tf as f64 * query_term.idf;
        let query_weight = query_term.query_tf * query_term.idf;
        let (dot, norm) = self.accumulators.entry(docid).or_insert((0., 0.));
        *dot += weight * query_weight;
        *norm += weight * weight;
    }

    /// Final scores, ignoring documents with a null norm
    pub fn scores(self) -> impl Iterator<Item = (DocId, f64)> {
        self.accumulators
            .into_iter()
            .filter(|(_, (_, norm))| *norm != 0.)
            .map(|(docid, (dot, norm))| (docid, dot / norm.sqrt()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntest::assert_about_eq;

    fn terms(text: &str) -> Vec<Term> {
        text.split(' ').map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_term() {
        let weights = query_terms(&terms("cat cat"), 10, |_| 5);
        assert_eq!(
            weights,
            vec![QueryTerm {
                term: "cat".to_string(),
                idf: 1.,
                query_tf: 1.
            }]
        );
    }

    #[test]
    fn test_idf() {
        let weights = query_terms(&terms("cat dog cat zebra"), 8, |t| match t {
            "cat" => 2,
            "dog" => 8,
            _ => 0,
        });
        assert_eq!(weights.len(), 2);
        assert_eq!(weights[0].term, "cat");
        assert_about_eq!(weights[0].idf, 4f64.ln());
        assert_about_eq!(weights[0].query_tf, 2.);
        assert_about_eq!(weights[1].idf, 0.);
    }

    #[test]
    fn test_scores() {
        let cat = QueryTerm {
            term: "cat".to_string(),
            idf: 2.,
            query_tf: 1.,
        };
        let dog = QueryTerm {
            term: "dog".to_string(),
            idf: 1.,
            query_tf: 2.,
        };

        let mut accumulator = ScoreAccumulator::new();
        accumulator.add(0, 3, &cat);
        accumulator.add(0, 4, &dog);
        accumulator.add(1, 1, &dog);
        accumulator.add(2, 1, &QueryTerm { idf: 0., ..cat.clone() });

        let mut scores: Vec<_> = accumulator.scores().collect();
        scores.sort_by_key(|(docid, _)| *docid);
        assert_eq!(scores.len(), 2);

        // dot = 6 * 2 + 4 * 2, norm = 36 + 16
        assert_about_eq!(scores[0].1, 20. / 52f64.sqrt());
        // dot = 1 * 2, norm = 1
        assert_about_eq!(scores[1].1, 2.);
    }
}
