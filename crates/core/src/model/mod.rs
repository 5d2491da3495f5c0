//! Record value model
//!
//! Records are insertion-ordered maps of field name to [`RecordValue`], so
//! generated output follows the field order of the source document.

mod dates;
mod identifier;
mod record_type;
mod value;

pub use dates::{parse_date, parse_datetime};
pub use identifier::{IdentifierError, canonical_id, canonical_or_random};
pub use record_type::RecordType;
pub use value::{RangeValue, Record, RecordValue};
