//! Record serializers
//!
//! Renders [`Record`](crate::model::Record) trees either as Ruby literals that
//! the v2 loader executes, or as plain JSON documents.

mod error;
mod json;
mod ruby;

pub use error::{SerializeError, SerializeResult};
pub use json::{
    JSON_ARRAY_FOOTER, JSON_ARRAY_HEADER, JSON_ARRAY_SEPARATOR, pretty_array_item, record_to_json,
    to_json_value,
};
pub use ruby::{RubySerializer, escape_ruby_string, escape_single_quoted, ruby_key};
