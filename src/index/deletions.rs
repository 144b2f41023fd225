//! Deletion records
//!
//! The first page holds the byte length of the record; the following
//! pages hold the ascending IDs of the deleted documents.

use std::{fs, path::Path};

use byteorder::{BigEndian, ByteOrder};

use crate::{
    base::DocId,
    error::{IndexError, Result},
    utils::paged_file::{IoStats, PagedFile},
};

/// Reads the deleted document IDs; a missing file is an empty record
pub fn read_deletions(path: &Path, page_size: usize) -> Result<(Vec<DocId>, IoStats)> {
    if !path.exists() {
        return Ok((Vec::new(), IoStats::default()));
    }

    let mut file = PagedFile::create_or_open(path, page_size)?;
    if file.is_empty() {
        return Ok((Vec::new(), file.close()?));
    }

    let header = file.read_page(0)?;
    let length = BigEndian::read_u32(&header[..4]) as usize;
    if length % 4 != 0 {
        return Err(IndexError::corrupt(format!(
            "deletion record {} has a length of {} bytes",
            path.display(),
            length
        )));
    }

    let bytes = file.read_bytes(page_size as u64, length)?;
    let mut docids = vec![0; length / 4];
    BigEndian::read_u32_into(&bytes, &mut docids);
    Ok((docids, file.close()?))
}

/// Writes a deletion record at `path`, replacing any existing file
pub fn write_deletions(path: &Path, page_size: usize, docids: &[DocId]) -> Result<IoStats> {
    if path.exists() {
        fs::remove_file(path)?;
    }

    let mut content = vec![0u8; docids.len() * 4];
    BigEndian::write_u32_into(docids, &mut content);
    let mut header = [0u8; 4];
    BigEndian::write_u32(&mut header, content.len() as u32);

    let mut file = PagedFile::create_or_open(path, page_size)?;
    file.append_page(&header)?;
    file.append_all_bytes(&content)?;
    file.close()
}

/// Merges two sorted ID lists, without duplicates
pub fn merge_deletions(current: &[DocId], added: &[DocId]) -> Vec<DocId> {
    let mut merged: Vec<DocId> = current.iter().chain(added.iter()).copied().collect();
    merged.sort_unstable();
    merged.dedup();
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_dir::TempDir;

    #[test]
    fn test_deletion_record() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let path = dir.path().join("segment0.del");

        let (docids, _) = read_deletions(&path, 64).unwrap();
        assert!(docids.is_empty());

        // More IDs than a page can hold
        let docids: Vec<DocId> = (0..40).map(|ix| ix * 3).collect();
        let stats = write_deletions(&path, 64, &docids).unwrap();
        assert_eq!(stats.pages_written, 4);

        let (read, stats) = read_deletions(&path, 64).unwrap();
        assert_eq!(read, docids);
        assert_eq!(stats.pages_read, 4);

        write_deletions(&path, 64, &[1, 2]).unwrap();
        assert_eq!(read_deletions(&path, 64).unwrap().0, vec![1, 2]);
    }

    #[test]
    fn test_merge_deletions() {
        assert_eq!(merge_deletions(&[1, 5, 9], &[0, 5, 10]), vec![0, 1, 5, 9, 10]);
        assert_eq!(merge_deletions(&[], &[3]), vec![3]);
    }
}
