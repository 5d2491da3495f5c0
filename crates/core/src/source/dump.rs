//! Directory of CouchDB collection dumps

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use super::document::{Collection, SourceDocument};
use super::error::{SourceError, SourceResult};
use super::{DocumentIter, RecordSource};

/// Reads collections from `<root>/<collection>.jsonl` or `<root>/<collection>.json`
///
/// JSON Lines files are streamed one document at a time. A `.json` file must
/// hold an array and is read whole. Attachment bytes come from
/// `<root>/attachments/<document id>/<key>`, falling back to base64 data
/// inlined in the document's `_attachments` entry.
#[derive(Debug, Clone)]
pub struct DumpStore {
    root: PathBuf,
}

impl DumpStore {
    /// Open a dump directory
    pub fn open(root: impl Into<PathBuf>) -> SourceResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SourceError::Read {
                path: root,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "dump directory does not exist",
                ),
            });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, collection: Collection, extension: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", collection.file_stem(), extension))
    }

    fn read_jsonl(&self, collection: Collection, path: PathBuf) -> SourceResult<DocumentIter<'_>> {
        let file = File::open(&path).map_err(|source| SourceError::Read {
            path: path.clone(),
            source,
        })?;
        let reader = BufReader::new(file);

        let documents = reader
            .lines()
            .enumerate()
            .filter_map(move |(index, line)| {
                let line = match line {
                    Ok(line) => line,
                    Err(source) => {
                        return Some(Err(SourceError::Read {
                            path: path.clone(),
                            source,
                        }));
                    }
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    return None;
                }
                Some(
                    serde_json::from_str::<Value>(trimmed)
                        .map_err(|e| SourceError::JsonParse {
                            path: path.clone(),
                            line: index + 1,
                            error: e.to_string(),
                        })
                        .and_then(|value| SourceDocument::from_value(value, collection, index)),
                )
            });
        Ok(Box::new(documents))
    }

    fn read_json_array(
        &self,
        collection: Collection,
        path: PathBuf,
    ) -> SourceResult<DocumentIter<'_>> {
        let content = fs::read_to_string(&path).map_err(|source| SourceError::Read {
            path: path.clone(),
            source,
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|e| SourceError::JsonParse {
            path: path.clone(),
            line: e.line(),
            error: e.to_string(),
        })?;
        let Value::Array(items) = value else {
            return Err(SourceError::NotAnArray(path));
        };

        Ok(Box::new(
            items
                .into_iter()
                .enumerate()
                .map(move |(index, item)| SourceDocument::from_value(item, collection, index)),
        ))
    }
}

impl RecordSource for DumpStore {
    fn enumerate(&self, collection: Collection) -> SourceResult<DocumentIter<'_>> {
        let jsonl = self.collection_path(collection, "jsonl");
        if jsonl.is_file() {
            return self.read_jsonl(collection, jsonl);
        }

        let json = self.collection_path(collection, "json");
        if json.is_file() {
            return self.read_json_array(collection, json);
        }

        tracing::warn!(
            "No dump found for collection {} in {}, treating it as empty",
            collection,
            self.root.display()
        );
        Ok(Box::new(std::iter::empty()))
    }

    fn fetch_attachment(&self, document: &SourceDocument, key: &str) -> SourceResult<Vec<u8>> {
        let id = document
            .id()
            .ok_or_else(|| SourceError::MissingId(key.to_string()))?;

        let path = self.root.join("attachments").join(id).join(key);
        if path.is_file() {
            return fs::read(&path).map_err(|source| SourceError::Read { path, source });
        }

        let inline = document
            .get("_attachments")
            .and_then(|attachments| attachments.get(key))
            .and_then(|attachment| attachment.get("data"))
            .and_then(Value::as_str);

        match inline {
            Some(data) => STANDARD
                .decode(data)
                .map_err(|e| SourceError::InvalidAttachment {
                    id: id.to_string(),
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            None => Err(SourceError::AttachmentNotFound {
                id: id.to_string(),
                key: key.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_reads_jsonl_lazily_in_order() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("child.jsonl"),
            "{\"_id\":\"a\"}\n\n{\"_id\":\"b\"}\n",
        )
        .unwrap();

        let store = DumpStore::open(dir.path()).unwrap();
        let ids: Vec<String> = store
            .enumerate(Collection::Child)
            .unwrap()
            .map(|d| d.unwrap().id().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_reads_json_array() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("role.json"), "[{\"_id\":\"role-a\"}]").unwrap();

        let store = DumpStore::open(dir.path()).unwrap();
        assert_eq!(store.enumerate(Collection::Role).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_collection_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = DumpStore::open(dir.path()).unwrap();
        assert_eq!(store.enumerate(Collection::Lookup).unwrap().count(), 0);
    }

    #[test]
    fn test_malformed_line_is_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("incident.jsonl"), "{\"_id\":\"a\"}\nnot json\n").unwrap();

        let store = DumpStore::open(dir.path()).unwrap();
        let results: Vec<_> = store.enumerate(Collection::Incident).unwrap().collect();
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(SourceError::JsonParse { line: 2, .. })
        ));
    }

    #[test]
    fn test_fetch_attachment_from_directory_and_inline() {
        let dir = TempDir::new().unwrap();
        let attachment_dir = dir.path().join("attachments").join("doc1");
        fs::create_dir_all(&attachment_dir).unwrap();
        fs::write(attachment_dir.join("photo"), b"bytes").unwrap();

        let store = DumpStore::open(dir.path()).unwrap();
        let doc = SourceDocument::from_value(
            json!({"_id": "doc1", "_attachments": {"inline": {"data": "aGVsbG8="}}}),
            Collection::Child,
            0,
        )
        .unwrap();

        assert_eq!(store.fetch_attachment(&doc, "photo").unwrap(), b"bytes");
        assert_eq!(store.fetch_attachment(&doc, "inline").unwrap(), b"hello");
        assert!(matches!(
            store.fetch_attachment(&doc, "missing"),
            Err(SourceError::AttachmentNotFound { .. })
        ));
    }

    #[test]
    fn test_open_missing_directory() {
        assert!(DumpStore::open("/definitely/not/here").is_err());
    }
}
