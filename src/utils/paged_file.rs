//! Fixed-size page file
//!
//! All the segment sections are stored in files made of pages of
//! `page_size` bytes. Data is only ever appended, one page at a time, and
//! read back page by page.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{IndexError, Result};

/// Number of pages read from and written to disk
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct IoStats {
    pub pages_read: u64,
    pub pages_written: u64,
}

impl AddAssign for IoStats {
    fn add_assign(&mut self, other: Self) {
        self.pages_read += other.pages_read;
        self.pages_written += other.pages_written;
    }
}

pub struct PagedFile {
    path: PathBuf,
    file: File,
    page_size: usize,
    num_pages: u64,
    stats: IoStats,
}

impl PagedFile {
    /// Opens the file at `path`, creating an empty one if needed
    pub fn create_or_open(path: &Path, page_size: usize) -> Result<Self> {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        let length = file.metadata()?.len();
        if length % page_size as u64 != 0 {
            return Err(IndexError::corrupt(format!(
                "{} has {} bytes, which is not a multiple of the page size {}",
                path.display(),
                length,
                page_size
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            page_size,
            num_pages: length / page_size as u64,
            stats: IoStats::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn num_pages(&self) -> u64 {
        self.num_pages
    }

    /// Size of the file in bytes
    pub fn len(&self) -> u64 {
        self.num_pages * self.page_size as u64
    }

    pub fn is_empty(&self) -> bool {
        self.num_pages == 0
    }

    pub fn stats(&self) -> IoStats {
        self.stats
    }

    /// Appends exactly one page; shorter input is padded with zeros
    pub fn append_page(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.page_size {
            return Err(IndexError::precondition(format!(
                "cannot append {} bytes as one page of {} bytes",
                bytes.len(),
                self.page_size
            )));
        }
        self.write_page(bytes)?;
        Ok(())
    }

    /// Appends a buffer of any length, spanning as many pages as needed
    /// (the last one being padded with zeros)
    pub fn append_all_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        for chunk in bytes.chunks(self.page_size) {
            self.write_page(chunk)?;
        }
        Ok(())
    }

    /// Reads the page `page`
    pub fn read_page(&mut self, page: u64) -> Result<Vec<u8>> {
        if page >= self.num_pages {
            return Err(IndexError::corrupt(format!(
                "page {} is out of range for {} ({} pages)",
                page,
                self.path.display(),
                self.num_pages
            )));
        }
        Ok(self.load_page(page)?)
    }

    /// Reads the whole file
    pub fn read_all_pages(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(self.len() as usize);
        for page in 0..self.num_pages {
            data.extend_from_slice(&self.load_page(page)?);
        }
        Ok(data)
    }

    /// Reads `length` bytes starting at byte `start`, loading only
    /// the pages that overlap the range
    pub fn read_bytes(&mut self, start: u64, length: usize) -> Result<Vec<u8>> {
        let end = start + length as u64;
        if end > self.len() {
            return Err(IndexError::corrupt(format!(
                "byte range {}..{} is out of range for {} ({} bytes)",
                start,
                end,
                self.path.display(),
                self.len()
            )));
        }

        let page_size = self.page_size as u64;
        let mut data = Vec::with_capacity(length);
        let mut position = start;
        while position < end {
            let page = position / page_size;
            let offset = (position % page_size) as usize;
            let take = ((end - position) as usize).min(self.page_size - offset);
            let content = self.load_page(page)?;
            data.extend_from_slice(&content[offset..offset + take]);
            position += take as u64;
        }
        Ok(data)
    }

    /// Flushes the file to disk and returns its page counters
    pub fn close(mut self) -> Result<IoStats> {
        self.file.flush()?;
        self.file.sync_all()?;
        debug!(
            "Closed {} ({} pages, {} read, {} written)",
            self.path.display(),
            self.num_pages,
            self.stats.pages_read,
            self.stats.pages_written
        );
        Ok(self.stats)
    }

    pub(crate) fn load_page(&mut self, page: u64) -> io::Result<Vec<u8>> {
        let mut data = vec![0u8; self.page_size];
        self.file
            .seek(SeekFrom::Start(page * self.page_size as u64))?;
        self.file.read_exact(&mut data)?;
        self.stats.pages_read += 1;
        Ok(data)
    }

    pub(crate) fn write_page(&mut self, bytes: &[u8]) -> io::Result<()> {
        debug_assert!(bytes.len() <= self.page_size);
        let mut page = vec![0u8; self.page_size];
        page[..bytes.len()].copy_from_slice(bytes);

        self.file
            .seek(SeekFrom::Start(self.num_pages * self.page_size as u64))?;
        self.file.write_all(&page)?;
        self.num_pages += 1;
        self.stats.pages_written += 1;
        Ok(())
    }
}
