//! In-memory record store

use std::collections::HashMap;

use serde_json::Value;

use super::document::{Collection, SourceDocument};
use super::error::{SourceError, SourceResult};
use super::{DocumentIter, RecordSource};

/// Holds documents and attachment bytes in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    collections: HashMap<Collection, Vec<SourceDocument>>,
    attachments: HashMap<(String, String), Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add documents to a collection from JSON objects
    ///
    /// Values that are not objects are skipped.
    pub fn with_documents<I>(mut self, collection: Collection, documents: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let entry = self.collections.entry(collection).or_default();
        for value in documents {
            if let Value::Object(fields) = value {
                entry.push(SourceDocument::new(fields));
            }
        }
        self
    }

    /// Add attachment bytes for a document id
    pub fn with_attachment(
        mut self,
        id: impl Into<String>,
        key: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.attachments
            .insert((id.into(), key.into()), bytes.into());
        self
    }

    /// Append one document
    pub fn push(&mut self, collection: Collection, document: SourceDocument) {
        self.collections.entry(collection).or_default().push(document);
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.collections.get(&collection).map_or(0, Vec::len)
    }
}

impl RecordSource for MemorySource {
    fn enumerate(&self, collection: Collection) -> SourceResult<DocumentIter<'_>> {
        let documents = self
            .collections
            .get(&collection)
            .map(|docs| docs.as_slice())
            .unwrap_or_default();
        Ok(Box::new(documents.iter().cloned().map(Ok)))
    }

    fn fetch_attachment(&self, document: &SourceDocument, key: &str) -> SourceResult<Vec<u8>> {
        let id = document
            .id()
            .ok_or_else(|| SourceError::MissingId(key.to_string()))?;
        self.attachments
            .get(&(id.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| SourceError::AttachmentNotFound {
                id: id.to_string(),
                key: key.to_string(),
            })
    }
}
