//! On-disk segments
//!
//! A segment is made of a dictionary, a postings file, a positions file
//! (positional indices only), an optional deletion record and a document
//! store. Segments are written under a temporary name and moved in place
//! by [commit_segment] once every file is complete.
//!
//! For a plain index, the postings of a term are `[docid][frequency]`
//! pairs. For a positional index, they are a header
//! `[docid block length][ends block length][positions start]`, followed
//! by the encoded document IDs and the encoded (cumulative) end offsets
//! of the position blocks of each document, relative to the start offset
//! in the positions file.

use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::debug;

use super::{
    deletions::{read_deletions, write_deletions},
    dictionary::{Dictionary, DictionaryEntry, PostingLocation},
};
use crate::{
    base::{segment_path, temporary_path, DocId, Document, Len, Section, SegmentId},
    compress::PostingCodec,
    error::{IndexError, Result},
    options::IndexKind,
    store::FileDocumentStore,
    utils::{
        paged_file::{IoStats, PagedFile},
        pages::{PageCursor, PageWriter},
    },
};

/// The data associated with each document of a posting list
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PostingValues {
    /// Term frequencies
    Frequencies(Vec<u32>),
    /// Encoded position blocks
    Positions(Vec<Vec<u8>>),
}

/// The posting list of one term
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermPostings {
    pub docids: Vec<DocId>,
    pub values: PostingValues,
}

impl TermPostings {
    pub fn len(&self) -> usize {
        self.docids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docids.is_empty()
    }

    /// Appends the postings of a segment whose document IDs start at `offset`
    pub fn append(&mut self, other: TermPostings, offset: DocId) -> Result<()> {
        match (&mut self.values, other.values) {
            (PostingValues::Frequencies(a), PostingValues::Frequencies(b)) => a.extend(b),
            (PostingValues::Positions(a), PostingValues::Positions(b)) => a.extend(b),
            _ => {
                return Err(IndexError::precondition(
                    "cannot concatenate plain and positional postings",
                ))
            }
        }
        self.docids
            .extend(other.docids.into_iter().map(|docid| docid + offset));
        Ok(())
    }
}

/// Offset of the end of a position block, relative to the first block of
/// the term; it must fit in 32 bits
fn block_end(term: &str, end: u64) -> Result<u32> {
    u32::try_from(end).map_err(|_| {
        IndexError::precondition(format!(
            "the positions of {:?} take {} bytes, more than 32-bit offsets allow",
            term, end
        ))
    })
}

/// Writes a new segment under a temporary name
pub struct SegmentWriter {
    folder: PathBuf,
    name: String,
    page_size: usize,
    codec: Option<Box<dyn PostingCodec>>,
    entries: Vec<DictionaryEntry>,
    postings: PageWriter,
    positions: Option<PageWriter>,
}

/// Creates the file of a section, removing any leftover from a failed write
fn create_section(
    folder: &Path,
    name: &str,
    section: Section,
    page_size: usize,
) -> Result<PagedFile> {
    let path = temporary_path(folder, name, section);
    if path.exists() {
        fs::remove_file(&path)?;
    }
    PagedFile::create_or_open(&path, page_size)
}

impl SegmentWriter {
    pub fn create(folder: &Path, name: &str, page_size: usize, kind: &IndexKind) -> Result<Self> {
        let postings = PageWriter::new(create_section(folder, name, Section::Postings, page_size)?);
        let positions = match kind {
            IndexKind::Plain => None,
            IndexKind::Positional(_) => Some(PageWriter::new(create_section(
                folder,
                name,
                Section::Positions,
                page_size,
            )?)),
        };

        Ok(Self {
            folder: folder.to_path_buf(),
            name: name.to_string(),
            page_size,
            codec: kind.codec().map(|c| c.boxed_clone()),
            entries: Vec::new(),
            postings,
            positions,
        })
    }

    /// Adds the postings of a term; terms must be added in ascending order
    pub fn add_term(&mut self, term: &str, postings: &TermPostings) -> Result<()> {
        if let Some(last) = self.entries.last() {
            if last.term.as_str() >= term {
                return Err(IndexError::precondition(format!(
                    "term {:?} added after {:?}",
                    term, last.term
                )));
            }
        }

        let location =
            PostingLocation::at(self.postings.position(), self.page_size, postings.len());

        match (&postings.values, &self.codec, &mut self.positions) {
            (PostingValues::Frequencies(frequencies), None, None) => {
                for (docid, frequency) in postings.docids.iter().zip(frequencies.iter()) {
                    self.postings.write_u32::<BigEndian>(*docid)?;
                    self.postings.write_u32::<BigEndian>(*frequency)?;
                }
            }
            (PostingValues::Positions(blocks), Some(codec), Some(positions)) => {
                let start = positions.position();
                let mut ends = Vec::with_capacity(blocks.len());
                let mut end = 0u64;
                for block in blocks.iter() {
                    positions.write_all(block)?;
                    end += block.len() as u64;
                    ends.push(block_end(term, end)?);
                }

                let docid_block = codec.encode(&postings.docids)?;
                let ends_block = codec.encode(&ends)?;
                self.postings.write_u32::<BigEndian>(docid_block.len() as u32)?;
                self.postings.write_u32::<BigEndian>(ends_block.len() as u32)?;
                self.postings.write_u64::<BigEndian>(start)?;
                self.postings.write_all(&docid_block)?;
                self.postings.write_all(&ends_block)?;
            }
            _ => {
                return Err(IndexError::precondition(format!(
                    "postings of {:?} do not match the kind of the index",
                    term
                )))
            }
        }

        self.entries.push(DictionaryEntry {
            term: term.to_string(),
            location,
        });
        Ok(())
    }

    /// Writes the dictionary, documents and deletions, and closes all the
    /// files of the segment
    pub fn finish<I>(self, documents: I, deletions: &[DocId]) -> Result<IoStats>
    where
        I: IntoIterator<Item = (DocId, Document)>,
    {
        let mut stats = IoStats::default();
        let num_terms = self.entries.len();

        stats += self.postings.finish()?.close()?;
        if let Some(positions) = self.positions {
            stats += positions.finish()?.close()?;
        }

        let mut dictionary_file =
            create_section(&self.folder, &self.name, Section::Dictionary, self.page_size)?;
        Dictionary::new(self.entries)?.write(&mut dictionary_file)?;
        stats += dictionary_file.close()?;

        let store = FileDocumentStore::create_with_bulk_load(
            &temporary_path(&self.folder, &self.name, Section::Documents),
            documents,
        )?;

        let deletions_path = temporary_path(&self.folder, &self.name, Section::Deletions);
        if deletions.is_empty() {
            if deletions_path.exists() {
                fs::remove_file(&deletions_path)?;
            }
        } else {
            stats += write_deletions(&deletions_path, self.page_size, deletions)?;
        }

        debug!(
            "[{}] wrote {} terms and {} documents",
            self.name,
            num_terms,
            store.len()
        );
        Ok(stats)
    }
}

/// Moves the files written under `name` in place as segment `segment`
pub fn commit_segment(folder: &Path, name: &str, segment: SegmentId) -> Result<()> {
    for section in Section::ALL {
        let source = temporary_path(folder, name, section);
        let target = segment_path(folder, segment, section);
        if source.exists() {
            fs::rename(&source, &target)?;
        } else if target.exists() {
            fs::remove_file(&target)?;
        }
    }
    Ok(())
}

/// Removes the files written under `name` by an unfinished writer
pub fn remove_temporaries(folder: &Path, name: &str) -> Result<()> {
    for section in Section::ALL {
        let path = temporary_path(folder, name, section);
        if path.exists() {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Removes all the files of a segment
pub fn remove_segment(folder: &Path, segment: SegmentId) -> Result<()> {
    for section in Section::ALL {
        let path = segment_path(folder, segment, section);
        if path.exists() {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Read access to a flushed segment
pub struct SegmentReader {
    folder: PathBuf,
    id: SegmentId,
    page_size: usize,
    codec: Option<Box<dyn PostingCodec>>,
    dictionary: Dictionary,
    postings: PagedFile,
    positions: Option<PagedFile>,
    stats: IoStats,
}

impl SegmentReader {
    pub fn open(folder: &Path, id: SegmentId, page_size: usize, kind: &IndexKind) -> Result<Self> {
        let dictionary_path = segment_path(folder, id, Section::Dictionary);
        if !dictionary_path.exists() {
            return Err(IndexError::corrupt(format!(
                "segment {} has no dictionary ({})",
                id,
                dictionary_path.display()
            )));
        }

        let mut dictionary_file = PagedFile::create_or_open(&dictionary_path, page_size)?;
        let dictionary = Dictionary::read(&mut dictionary_file)?;
        let stats = dictionary_file.close()?;

        let postings =
            PagedFile::create_or_open(&segment_path(folder, id, Section::Postings), page_size)?;
        let positions = match kind {
            IndexKind::Plain => None,
            IndexKind::Positional(_) => Some(PagedFile::create_or_open(
                &segment_path(folder, id, Section::Positions),
                page_size,
            )?),
        };

        Ok(Self {
            folder: folder.to_path_buf(),
            id,
            page_size,
            codec: kind.codec().map(|c| c.boxed_clone()),
            dictionary,
            postings,
            positions,
            stats,
        })
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Number of documents containing `term`
    pub fn document_frequency(&self, term: &str) -> u32 {
        self.dictionary.get(term).map_or(0, |l| l.count)
    }

    /// Reads the postings at a dictionary location
    pub fn read_postings(&mut self, location: PostingLocation) -> Result<TermPostings> {
        let count = location.count as usize;
        let mut cursor = PageCursor::new(
            &mut self.postings,
            location.page as u64,
            location.offset as usize,
        );

        let (codec, positions) = match (&self.codec, &mut self.positions) {
            (Some(codec), Some(positions)) => (codec, positions),
            _ => {
                let mut docids = Vec::with_capacity(count);
                let mut frequencies = Vec::with_capacity(count);
                for _ in 0..count {
                    docids.push(cursor.read_u32::<BigEndian>()?);
                    frequencies.push(cursor.read_u32::<BigEndian>()?);
                }
                return Ok(TermPostings {
                    docids,
                    values: PostingValues::Frequencies(frequencies),
                });
            }
        };

        let docid_length = cursor.read_u32::<BigEndian>()? as usize;
        let ends_length = cursor.read_u32::<BigEndian>()? as usize;
        let start = cursor.read_u64::<BigEndian>()?;
        let mut blocks = vec![0u8; docid_length + ends_length];
        cursor.read_exact(&mut blocks)?;

        let docids = codec.decode_range(&blocks, 0, docid_length)?;
        let ends = codec.decode_range(&blocks, docid_length, ends_length)?;
        if docids.len() != count || ends.len() != count {
            return Err(IndexError::corrupt(format!(
                "segment {}: expected {} postings, found {} documents and {} position blocks",
                self.id,
                count,
                docids.len(),
                ends.len()
            )));
        }

        let total = ends.last().copied().unwrap_or(0) as usize;
        let bytes = positions.read_bytes(start, total)?;
        let mut position_blocks = Vec::with_capacity(count);
        let mut previous = 0usize;
        for end in ends {
            let end = end as usize;
            if end < previous || end > bytes.len() {
                return Err(IndexError::corrupt(format!(
                    "segment {}: invalid position block end {}",
                    self.id, end
                )));
            }
            position_blocks.push(bytes[previous..end].to_vec());
            previous = end;
        }

        Ok(TermPostings {
            docids,
            values: PostingValues::Positions(position_blocks),
        })
    }

    /// Postings of a term, if present in the segment
    pub fn postings(&mut self, term: &str) -> Result<Option<TermPostings>> {
        match self.dictionary.get(term) {
            Some(location) => Ok(Some(self.read_postings(location)?)),
            None => Ok(None),
        }
    }

    /// Document IDs containing `term` (empty if absent)
    pub fn docids(&mut self, term: &str) -> Result<Vec<DocId>> {
        Ok(self.postings(term)?.map(|p| p.docids).unwrap_or_default())
    }

    /// (document, term frequency) pairs of `term`
    pub fn frequencies(&mut self, term: &str) -> Result<Vec<(DocId, u32)>> {
        let postings = match self.postings(term)? {
            Some(postings) => postings,
            None => return Ok(Vec::new()),
        };

        let frequencies = match postings.values {
            PostingValues::Frequencies(frequencies) => frequencies,
            PostingValues::Positions(blocks) => {
                let mut frequencies = Vec::with_capacity(blocks.len());
                for block in blocks.iter() {
                    frequencies.push(self.decode_positions(block)?.len() as u32);
                }
                frequencies
            }
        };
        Ok(postings.docids.into_iter().zip(frequencies).collect())
    }

    /// Decodes one position block
    pub fn decode_positions(&self, block: &[u8]) -> Result<Vec<u32>> {
        match &self.codec {
            Some(codec) => codec.decode(block),
            None => Err(IndexError::unsupported(
                "positions are only stored by positional indices",
            )),
        }
    }

    /// Reads the deleted document IDs of this segment
    pub fn deletions(&mut self) -> Result<Vec<DocId>> {
        let (docids, stats) = read_deletions(
            &segment_path(&self.folder, self.id, Section::Deletions),
            self.page_size,
        )?;
        self.stats += stats;
        Ok(docids)
    }

    pub fn open_documents(&self) -> Result<FileDocumentStore> {
        FileDocumentStore::create_or_open(&segment_path(&self.folder, self.id, Section::Documents))
    }

    /// Closes the files, returning the number of pages read and written
    pub fn close(self) -> Result<IoStats> {
        let mut stats = self.stats;
        stats += self.postings.close()?;
        if let Some(positions) = self.positions {
            stats += positions.close()?;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_end_bounds() {
        assert_eq!(block_end("cat", 0).unwrap(), 0);
        assert_eq!(block_end("cat", u32::MAX as u64).unwrap(), u32::MAX);
        assert!(matches!(
            block_end("cat", u32::MAX as u64 + 1),
            Err(IndexError::Precondition(_))
        ));
    }
}
