use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub type DocId = u32;
pub type SegmentId = usize;
pub type Term = String;

pub const INDEX_CBOR: &str = "index.cbor";
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Marks object that have a length
pub trait Len {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A text document, compared by content
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Document {
    text: String,
}

impl Document {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// The logical sections of a segment, each stored in its own paged file
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Section {
    Dictionary,
    Postings,
    Positions,
    Deletions,
    Documents,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Dictionary,
        Section::Postings,
        Section::Positions,
        Section::Deletions,
        Section::Documents,
    ];

    fn extension(&self) -> &'static str {
        match self {
            Section::Dictionary => "dict",
            Section::Postings => "post",
            Section::Positions => "pos",
            Section::Deletions => "del",
            Section::Documents => "docs",
        }
    }
}

/// Path of a section of segment `segment`
pub fn segment_path(folder: &Path, segment: SegmentId, section: Section) -> PathBuf {
    folder.join(format!("segment{}.{}", segment, section.extension()))
}

/// Path of a section being written under `name` (flush or merge output)
pub fn temporary_path(folder: &Path, name: &str, section: Section) -> PathBuf {
    folder.join(format!("{}.{}.tmp", name, section.extension()))
}
