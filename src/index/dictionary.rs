//! Segment dictionary
//!
//! The first page of the dictionary file holds the byte length of the
//! entries, which start on the second page. Each entry is
//! `[term length][term][page][offset][count]` (all integers are 32-bit
//! big-endian), entries being sorted by term.

use std::io::Read;

use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};
use log::debug;

use crate::{
    error::{IndexError, Result},
    utils::{paged_file::PagedFile, pages::PageCursor},
};

/// Where the postings of a term start in the postings file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostingLocation {
    pub page: u32,
    pub offset: u32,
    /// Number of documents in the posting list
    pub count: u32,
}

impl PostingLocation {
    pub fn at(position: u64, page_size: usize, count: usize) -> Self {
        Self {
            page: (position / page_size as u64) as u32,
            offset: (position % page_size as u64) as u32,
            count: count as u32,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub term: String,
    pub location: PostingLocation,
}

/// The sorted term dictionary of one segment
#[derive(Default, Debug)]
pub struct Dictionary {
    entries: Vec<DictionaryEntry>,
}

impl Dictionary {
    /// Builds a dictionary from entries sorted by term
    pub fn new(entries: Vec<DictionaryEntry>) -> Result<Self> {
        for pair in entries.windows(2) {
            if pair[0].term >= pair[1].term {
                return Err(IndexError::precondition(format!(
                    "dictionary terms are not in ascending order ({:?} then {:?})",
                    pair[0].term, pair[1].term
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<PostingLocation> {
        self.entries
            .binary_search_by(|entry| entry.term.as_str().cmp(term))
            .ok()
            .map(|ix| self.entries[ix].location)
    }

    /// Writes the dictionary into an empty paged file
    pub fn write(&self, file: &mut PagedFile) -> Result<()> {
        let mut content = Vec::new();
        for entry in self.entries.iter() {
            let term = entry.term.as_bytes();
            content.write_u32::<BigEndian>(term.len() as u32)?;
            content.extend_from_slice(term);
            content.write_u32::<BigEndian>(entry.location.page)?;
            content.write_u32::<BigEndian>(entry.location.offset)?;
            content.write_u32::<BigEndian>(entry.location.count)?;
        }

        let mut header = Vec::with_capacity(4);
        header.write_u32::<BigEndian>(content.len() as u32)?;
        file.append_page(&header)?;
        file.append_all_bytes(&content)?;
        Ok(())
    }

    /// Reads a dictionary written by [Dictionary::write]
    pub fn read(file: &mut PagedFile) -> Result<Self> {
        if file.is_empty() {
            return Ok(Self::default());
        }

        let header = file.read_page(0)?;
        let length = BigEndian::read_u32(&header[..4]) as u64;
        let end = file.page_size() as u64 + length;
        if end > file.len() {
            return Err(IndexError::corrupt(format!(
                "dictionary {} announces {} bytes but holds {}",
                file.path().display(),
                length,
                file.len() - file.page_size() as u64
            )));
        }

        let mut entries = Vec::new();
        let mut cursor = PageCursor::new(file, 1, 0);
        while cursor.position() < end {
            let term_length = cursor.read_u32::<BigEndian>()? as usize;
            let mut term = vec![0u8; term_length];
            cursor.read_exact(&mut term)?;
            let term = String::from_utf8(term)
                .map_err(|e| IndexError::corrupt(format!("invalid term: {}", e)))?;

            let page = cursor.read_u32::<BigEndian>()?;
            let offset = cursor.read_u32::<BigEndian>()?;
            let count = cursor.read_u32::<BigEndian>()?;
            entries.push(DictionaryEntry {
                term,
                location: PostingLocation {
                    page,
                    offset,
                    count,
                },
            });
        }

        debug!("Read {} dictionary entries", entries.len());
        Self::new(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_dir::TempDir;

    fn entry(term: &str, page: u32, offset: u32, count: u32) -> DictionaryEntry {
        DictionaryEntry {
            term: term.to_string(),
            location: PostingLocation {
                page,
                offset,
                count,
            },
        }
    }

    #[test]
    fn test_dictionary_spanning_pages() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let path = dir.path().join("test.dict");

        // Entries are longer than a page
        let entries: Vec<_> = (0..50u32)
            .map(|ix| entry(&format!("term{:03}", ix), ix / 3, ix * 7, ix + 1))
            .collect();
        let dictionary = Dictionary::new(entries.clone()).unwrap();

        let mut file = PagedFile::create_or_open(&path, 64).unwrap();
        dictionary.write(&mut file).unwrap();
        file.close().unwrap();

        let mut file = PagedFile::create_or_open(&path, 64).unwrap();
        let read = Dictionary::read(&mut file).unwrap();
        assert_eq!(read.entries(), &entries[..]);
        assert_eq!(read.get("term010"), Some(entries[10].location));
        assert_eq!(read.get("term"), None);
        assert_eq!(read.get("zzz"), None);
    }

    #[test]
    fn test_unsorted_entries() {
        assert!(Dictionary::new(vec![entry("b", 0, 0, 1), entry("a", 0, 8, 1)]).is_err());
        assert!(Dictionary::new(vec![entry("a", 0, 0, 1), entry("a", 0, 8, 1)]).is_err());
    }

    #[test]
    fn test_location() {
        let location = PostingLocation::at(4100, 4096, 3);
        assert_eq!((location.page, location.offset, location.count), (1, 4, 3));
    }
}
