//! Document catalog
//!
//! The catalog is the forest of root documents a run operates on, grouped
//! by the file they came from. Documents are visited in file order, then
//! document order; that order is the only order the scheduler knows.

use confpatch_tree::{Node, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One source file and the root documents it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFile {
    /// File identifier, e.g. `Squad/Parts/probe.cfg`
    pub url: String,

    /// Containing collection (top-level directory)
    pub collection: String,

    /// Root documents in file order
    pub documents: Vec<Node>,
}

/// Address of a root document: (file index, document index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentRef {
    pub file: usize,
    pub index: usize,
}

/// Where a document came from, for attributing events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    pub url: String,
    pub document: String,
}

impl Origin {
    pub fn new(url: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            document: document.into(),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.url, self.document)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    files: Vec<CatalogFile>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file and return its index.
    pub fn add_file(&mut self, url: impl Into<String>, collection: impl Into<String>) -> usize {
        self.files.push(CatalogFile {
            url: url.into(),
            collection: collection.into(),
            documents: Vec::new(),
        });
        self.files.len() - 1
    }

    /// Builder used by hosts and tests: add a file with its documents.
    pub fn with_file(
        mut self,
        url: impl Into<String>,
        collection: impl Into<String>,
        documents: Vec<Node>,
    ) -> Self {
        let file = self.add_file(url, collection);
        self.files[file].documents = documents;
        self
    }

    pub fn files(&self) -> &[CatalogFile] {
        &self.files
    }

    pub fn file(&self, file: usize) -> Option<&CatalogFile> {
        self.files.get(file)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn document_count(&self) -> usize {
        self.files.iter().map(|f| f.documents.len()).sum()
    }

    /// Number of documents currently in `file`.
    pub fn documents_in(&self, file: usize) -> usize {
        self.files.get(file).map(|f| f.documents.len()).unwrap_or(0)
    }

    pub fn document(&self, at: DocumentRef) -> Option<&Node> {
        self.files.get(at.file)?.documents.get(at.index)
    }

    pub fn document_mut(&mut self, at: DocumentRef) -> Option<&mut Node> {
        self.files.get_mut(at.file)?.documents.get_mut(at.index)
    }

    /// Origin label of a document.
    pub fn origin(&self, at: DocumentRef) -> Option<Origin> {
        let file = self.files.get(at.file)?;
        let node = file.documents.get(at.index)?;
        Some(Origin::new(&file.url, &node.name))
    }

    /// Append a document to `file`.
    pub fn add_document(&mut self, file: usize, node: Node) -> Option<DocumentRef> {
        let entry = self.files.get_mut(file)?;
        entry.documents.push(node);
        Some(DocumentRef {
            file,
            index: entry.documents.len() - 1,
        })
    }

    /// Remove a document. Later documents in the same file shift down.
    pub fn remove_document(&mut self, at: DocumentRef) -> Option<Node> {
        let entry = self.files.get_mut(at.file)?;
        (at.index < entry.documents.len()).then(|| entry.documents.remove(at.index))
    }

    /// Every document with its address, in catalog order.
    pub fn documents(&self) -> impl Iterator<Item = (DocumentRef, &Node)> + '_ {
        self.files.iter().enumerate().flat_map(|(file, entry)| {
            entry
                .documents
                .iter()
                .enumerate()
                .map(move |(index, node)| (DocumentRef { file, index }, node))
        })
    }

    /// Locate a document by identity.
    pub fn find_by_id(&self, id: NodeId) -> Option<DocumentRef> {
        self.documents()
            .find(|(_, node)| node.id() == id)
            .map(|(at, _)| at)
    }

    /// Keep only documents for which `keep` returns true.
    pub fn retain_documents(&mut self, mut keep: impl FnMut(&CatalogFile, &Node) -> bool) -> usize {
        let mut removed = 0;
        for file in &mut self.files {
            let documents = std::mem::take(&mut file.documents);
            let before = documents.len();
            let kept: Vec<Node> = documents.into_iter().filter(|node| keep(file, node)).collect();
            removed += before - kept.len();
            file.documents = kept;
        }
        removed
    }
}
