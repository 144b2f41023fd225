//! Document storage
//!
//! Each segment keeps the text of its documents, keyed by local document
//! ID, in a document store.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use log::debug;

use crate::{
    base::{DocId, Document, Len},
    error::Result,
};

pub trait DocumentStore: Len {
    fn add_document(&mut self, id: DocId, document: Document);

    fn get_document(&self, id: DocId) -> Option<Document>;

    /// Iterates over the documents by ascending ID
    fn iter(&self) -> Box<dyn Iterator<Item = (DocId, &Document)> + '_>;

    /// Iterates over the IDs in ascending order
    fn keys(&self) -> Box<dyn Iterator<Item = DocId> + '_> {
        Box::new(self.iter().map(|(id, _)| id))
    }

    /// Persists pending changes
    fn close(&mut self) -> Result<()>;
}

/// Document store held in memory and saved as a single bincode file
pub struct FileDocumentStore {
    path: PathBuf,
    documents: BTreeMap<DocId, Document>,
    modified: bool,
}

impl FileDocumentStore {
    /// Opens the store at `path`; a missing file is an empty store
    pub fn create_or_open(path: &Path) -> Result<Self> {
        let documents = if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            bincode::deserialize_from(reader)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            documents,
            modified: false,
        })
    }

    /// Creates a store holding `entries` and writes it to disk
    pub fn create_with_bulk_load<I>(path: &Path, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DocId, Document)>,
    {
        let mut store = Self {
            path: path.to_path_buf(),
            documents: entries.into_iter().collect(),
            modified: true,
        };
        store.close()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consumes the store, returning its documents in ascending ID order
    pub fn into_documents(self) -> BTreeMap<DocId, Document> {
        self.documents
    }
}

impl Len for FileDocumentStore {
    fn len(&self) -> usize {
        self.documents.len()
    }
}

impl DocumentStore for FileDocumentStore {
    fn add_document(&mut self, id: DocId, document: Document) {
        self.documents.insert(id, document);
        self.modified = true;
    }

    fn get_document(&self, id: DocId) -> Option<Document> {
        self.documents.get(&id).cloned()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (DocId, &Document)> + '_> {
        Box::new(self.documents.iter().map(|(id, doc)| (*id, doc)))
    }

    fn close(&mut self) -> Result<()> {
        if !self.modified {
            return Ok(());
        }

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, &self.documents)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);

        fs::rename(&tmp_path, &self.path)?;
        self.modified = false;
        debug!(
            "Saved {} documents in {}",
            self.documents.len(),
            self.path.display()
        );
        Ok(())
    }
}
