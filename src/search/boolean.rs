//! Operations over sorted posting lists

use crate::base::DocId;

/// Documents present in both lists
pub fn intersect(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut result = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] < b[j] {
            i += 1;
        } else if a[i] > b[j] {
            j += 1;
        } else {
            result.push(a[i]);
            i += 1;
            j += 1;
        }
    }
    result
}

/// Documents present in either list, without duplicates
pub fn union(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut result = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        let next = if j >= b.len() || (i < a.len() && a[i] < b[j]) {
            i += 1;
            a[i - 1]
        } else if i >= a.len() || b[j] < a[i] {
            j += 1;
            b[j - 1]
        } else {
            i += 1;
            j += 1;
            a[i - 1]
        };
        if result.last() != Some(&next) {
            result.push(next);
        }
    }
    result
}

/// Intersection of all the lists (empty if there is none)
pub fn intersect_all(lists: &[Vec<DocId>]) -> Vec<DocId> {
    let mut iter = lists.iter();
    let mut result = match iter.next() {
        Some(first) => first.clone(),
        None => return Vec::new(),
    };
    for list in iter {
        if result.is_empty() {
            break;
        }
        result = intersect(&result, list);
    }
    result
}

/// Union of all the lists
pub fn union_all(lists: &[Vec<DocId>]) -> Vec<DocId> {
    lists
        .iter()
        .fold(Vec::new(), |result, list| union(&result, list))
}

/// Checks whether the tokens appear consecutively: `positions[k]` holds
/// the (sorted) positions of the k-th token of the phrase
pub fn contains_phrase(positions: &[Vec<u32>]) -> bool {
    let (first, rest) = match positions.split_first() {
        Some(split) => split,
        None => return false,
    };

    first.iter().any(|&start| {
        rest.iter().enumerate().all(|(k, list)| {
            start
                .checked_add(k as u32 + 1)
                .map_or(false, |p| list.binary_search(&p).is_ok())
        })
    })
}
