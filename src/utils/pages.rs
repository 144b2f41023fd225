//! Sequential access to records that may straddle page boundaries

use std::io::{self, Read, Write};

use super::paged_file::PagedFile;

/// Reads a paged file sequentially from a given position.
///
/// When the current page is exhausted the next one is loaded, so that
/// fixed-size fields split over two pages are read transparently.
pub struct PageCursor<'a> {
    file: &'a mut PagedFile,
    page: u64,
    data: Vec<u8>,
    offset: usize,
}

impl<'a> PageCursor<'a> {
    /// Creates a cursor at byte `offset` of page `page`
    pub fn new(file: &'a mut PagedFile, page: u64, offset: usize) -> Self {
        Self {
            file,
            page,
            data: Vec::new(),
            offset,
        }
    }

    /// Creates a cursor at an absolute byte position
    pub fn at(file: &'a mut PagedFile, position: u64) -> Self {
        let page_size = file.page_size() as u64;
        Self::new(file, position / page_size, (position % page_size) as usize)
    }

    /// Absolute byte position of the cursor within the file
    pub fn position(&self) -> u64 {
        self.page * self.file.page_size() as u64 + self.offset as u64
    }

    /// Loads the page the cursor points to, moving on to the next page
    /// when the current one is exhausted. Returns false at the end of file.
    fn fill(&mut self) -> io::Result<bool> {
        let page_size = self.file.page_size();
        if self.offset >= page_size {
            self.page += 1;
            self.offset -= page_size;
            self.data.clear();
        }

        if self.data.is_empty() {
            if self.page >= self.file.num_pages() {
                return Ok(false);
            }
            self.data = self.file.load_page(self.page)?;
        }
        Ok(true)
    }
}

impl<'a> Read for PageCursor<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || !self.fill()? {
            return Ok(0);
        }
        let available = &self.data[self.offset..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.offset += n;
        Ok(n)
    }
}

/// Stages bytes in a page-sized buffer and appends every full page to
/// the file; `finish` pads and writes the last partial page.
pub struct PageWriter {
    file: PagedFile,
    buffer: Vec<u8>,
    written: u64,
}

impl PageWriter {
    pub fn new(file: PagedFile) -> Self {
        let capacity = file.page_size();
        Self {
            file,
            buffer: Vec::with_capacity(capacity),
            written: 0,
        }
    }

    /// Number of bytes written through this writer
    pub fn position(&self) -> u64 {
        self.written
    }

    pub fn page_size(&self) -> usize {
        self.file.page_size()
    }

    /// Writes the last (partial) page and gives back the file
    pub fn finish(mut self) -> io::Result<PagedFile> {
        if !self.buffer.is_empty() {
            self.file.write_page(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(self.file)
    }
}

impl Write for PageWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let page_size = self.file.page_size();
        let n = (page_size - self.buffer.len()).min(buf.len());
        self.buffer.extend_from_slice(&buf[..n]);
        self.written += n as u64;

        if self.buffer.len() == page_size {
            self.file.write_page(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
