use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::novel::tracker::error::{Result, TrackerError};
use crate::novel::tracker::store::{DocumentRef, DocumentSource};

/// Document source reading every regular file directly inside a directory.
/// Subdirectories are not descended into.
#[derive(Debug, Clone)]
pub struct FolderSource {
    root: PathBuf,
}

impl FolderSource {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(TrackerError::MissingInput(root));
        }
        Ok(Self { root })
    }
}

impl DocumentSource for FolderSource {
    fn list_documents(&self) -> Result<Vec<DocumentRef>> {
        let mut documents = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            documents.push(DocumentRef::new(
                entry.file_name().to_string_lossy().into_owned(),
            ));
        }
        documents.sort();
        debug!(root = %self.root.display(), count = documents.len(), "listed documents");
        Ok(documents)
    }

    fn read_text(&self, document: &DocumentRef) -> Result<String> {
        Ok(fs::read_to_string(self.root.join(&document.name))?)
    }
}
