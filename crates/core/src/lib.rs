//! Primero migration core
//!
//! Turns a v1 Primero record store into v2 seed scripts and JSON files:
//! - Record value model and canonical identifiers
//! - Ruby literal and JSON serializers
//! - Source store access (CouchDB dumps or memory)
//! - Field normalization and role permission transformation
//! - Batch driver and one exporter per script family

pub mod export;
pub mod model;
pub mod normalize;
pub mod permissions;
pub mod serialize;
pub mod source;

pub use export::{
    BatchDriver, ExportConfig, ExportContext, ExportError, ExportResult, ExportStats, Exporter,
    ExporterKind, OutputFormat,
};
pub use model::{Record, RecordType, RecordValue, canonical_id};
pub use normalize::{NormalizeError, NormalizeResult, RecordNormalizer};
pub use permissions::{RoleRecord, RoleTransformer};
pub use serialize::{RubySerializer, SerializeError, SerializeResult};
pub use source::{
    Collection, DumpStore, FormCatalog, MemorySource, RecordSource, SourceDocument, SourceError,
    SourceResult,
};
