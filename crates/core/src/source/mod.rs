//! Access to the v1 record store
//!
//! Exporters only need four things from the store: enumerate a collection,
//! slice it into batches, read attributes by name and fetch attachment
//! bytes. [`RecordSource`] captures exactly that, with [`DumpStore`] reading
//! a directory of CouchDB dumps and [`MemorySource`] holding documents in
//! memory.

mod catalog;
mod document;
mod dump;
mod error;
mod memory;
mod sniff;

pub use catalog::{FieldIndex, FieldKind, FormCatalog, FormField, FormSection, RETIRED_FORMS};
pub use document::{Collection, SourceDocument};
pub use dump::DumpStore;
pub use error::{SourceError, SourceResult};
pub use memory::MemorySource;
pub use sniff::{AttachmentType, detect_attachment_type, detect_mime_type};

/// Lazily evaluated stream of documents
pub type DocumentIter<'a> = Box<dyn Iterator<Item = SourceResult<SourceDocument>> + 'a>;

/// Read access to the v1 store
pub trait RecordSource {
    /// Enumerate every document of a collection in stable order
    fn enumerate(&self, collection: Collection) -> SourceResult<DocumentIter<'_>>;

    /// Fetch the bytes of a binary attachment stored on a document
    fn fetch_attachment(&self, document: &SourceDocument, key: &str) -> SourceResult<Vec<u8>>;
}

/// Slice a document stream into batches of at most `size` documents
///
/// The first fetch error is returned in place of a batch and ends iteration.
pub fn batches<I>(documents: I, size: usize) -> Batches<I>
where
    I: Iterator<Item = SourceResult<SourceDocument>>,
{
    Batches {
        inner: documents,
        size: size.max(1),
        done: false,
    }
}

/// Iterator returned by [`batches`]
pub struct Batches<I> {
    inner: I,
    size: usize,
    done: bool,
}

impl<I> Iterator for Batches<I>
where
    I: Iterator<Item = SourceResult<SourceDocument>>,
{
    type Item = SourceResult<Vec<SourceDocument>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::with_capacity(self.size);
        while batch.len() < self.size {
            match self.inner.next() {
                Some(Ok(document)) => batch.push(document),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(n: usize) -> Vec<SourceResult<SourceDocument>> {
        (0..n)
            .map(|i| SourceDocument::from_value(json!({ "_id": i.to_string() }), Collection::Child, i))
            .collect()
    }

    #[test]
    fn test_batches_sizes() {
        let sizes: Vec<usize> = batches(docs(7).into_iter(), 3)
            .map(|b| b.unwrap().len())
            .collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn test_batches_empty() {
        assert_eq!(batches(docs(0).into_iter(), 3).count(), 0);
    }

    #[test]
    fn test_batches_stop_at_error() {
        let mut items = docs(2);
        items.push(Err(SourceError::MissingId("child".into())));
        items.extend(docs(2));
        let results: Vec<_> = batches(items.into_iter(), 10).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
