//! Pairwise segment merge
//!
//! Every pair is first written under its own temporary name; segments are
//! only replaced once all the pairs have been merged.

use std::{cmp::Ordering, path::Path};

use log::{debug, info, warn};

use super::segment::{
    commit_segment, remove_segment, remove_temporaries, SegmentReader, SegmentWriter,
};
use crate::{
    base::{DocId, Len, SegmentId},
    error::Result,
    options::IndexKind,
    utils::paged_file::IoStats,
};

const MERGE_NAME: &str = "merge";

/// Temporary name of the merge output that becomes segment `target`
fn merge_name(target: SegmentId) -> String {
    format!("{}{}", MERGE_NAME, target)
}

/// Merges segments 2i and 2i+1 into segment i, for all the `num_segments`
/// (even) segments of the index
///
/// On error, the partial outputs are removed and the segments are left
/// untouched.
pub fn merge_all(
    folder: &Path,
    num_segments: SegmentId,
    page_size: usize,
    kind: &IndexKind,
) -> Result<IoStats> {
    let targets: Vec<SegmentId> = (0..num_segments / 2).collect();
    let mut stats = IoStats::default();

    for &target in targets.iter() {
        let name = merge_name(target);
        match merge_segments(folder, 2 * target, 2 * target + 1, &name, page_size, kind) {
            Ok(pair_stats) => stats += pair_stats,
            Err(e) => {
                warn!("[merge] failed to merge into {}: {}", target, e);
                for &written in targets.iter().take(target + 1) {
                    remove_temporaries(folder, &merge_name(written))?;
                }
                return Err(e);
            }
        }
    }

    // Segment i is replaced by its merge output; the others are removed
    for &target in targets.iter() {
        commit_segment(folder, &merge_name(target), target)?;
    }
    for segment in targets.len()..num_segments {
        remove_segment(folder, segment)?;
    }
    Ok(stats)
}

/// Merges segments `first` and `second`, writing the output under the
/// temporary name `name`
///
/// The documents of the second segment are renumbered after those of the
/// first one. Dictionaries are merged with a merge-join over their sorted
/// terms.
pub fn merge_segments(
    folder: &Path,
    first: SegmentId,
    second: SegmentId,
    name: &str,
    page_size: usize,
    kind: &IndexKind,
) -> Result<IoStats> {
    let mut a = SegmentReader::open(folder, first, page_size, kind)?;
    let mut b = SegmentReader::open(folder, second, page_size, kind)?;

    let a_documents = a.open_documents()?;
    let b_documents = b.open_documents()?;
    let offset = a_documents.len() as DocId;

    let mut writer = SegmentWriter::create(folder, name, page_size, kind)?;

    let a_entries = a.dictionary().entries().to_vec();
    let b_entries = b.dictionary().entries().to_vec();
    let mut a_iter = a_entries.into_iter().peekable();
    let mut b_iter = b_entries.into_iter().peekable();
    let mut shared_terms = 0;

    loop {
        let order = match (a_iter.peek(), b_iter.peek()) {
            (Some(x), Some(y)) => x.term.cmp(&y.term),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };

        match order {
            Ordering::Less => {
                if let Some(entry) = a_iter.next() {
                    let postings = a.read_postings(entry.location)?;
                    writer.add_term(&entry.term, &postings)?;
                }
            }
            Ordering::Greater => {
                if let Some(entry) = b_iter.next() {
                    let mut postings = b.read_postings(entry.location)?;
                    for docid in postings.docids.iter_mut() {
                        *docid += offset;
                    }
                    writer.add_term(&entry.term, &postings)?;
                }
            }
            Ordering::Equal => {
                if let (Some(x), Some(y)) = (a_iter.next(), b_iter.next()) {
                    let mut postings = a.read_postings(x.location)?;
                    postings.append(b.read_postings(y.location)?, offset)?;
                    writer.add_term(&x.term, &postings)?;
                    shared_terms += 1;
                }
            }
        }
    }

    let mut deletions = a.deletions()?;
    deletions.extend(b.deletions()?.into_iter().map(|docid| docid + offset));

    let num_documents = a_documents.len() + b_documents.len();
    let documents = a_documents
        .into_documents()
        .into_iter()
        .chain(
            b_documents
                .into_documents()
                .into_iter()
                .map(|(docid, document)| (docid + offset, document)),
        );

    let mut stats = writer.finish(documents, &deletions)?;
    stats += a.close()?;
    stats += b.close()?;

    debug!("{} terms shared by segments {} and {}", shared_terms, first, second);
    info!(
        "[merge] segments {} and {} merged as {} ({} documents)",
        first, second, name, num_documents
    );
    Ok(stats)
}
