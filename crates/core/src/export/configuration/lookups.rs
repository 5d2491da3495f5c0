//! Built-in lookups

use crate::model::{Record, RecordValue};

/// The PDF header lookup every v2 install expects
pub fn pdf_header_lookup() -> Record {
    let values = (1..=3)
        .map(|n| {
            let mut value = Record::new();
            value.insert("id".to_string(), RecordValue::string(format!("pdf_header_{n}")));
            value.insert(
                "display_text".to_string(),
                RecordValue::string(format!("PDF Header {n}")),
            );
            RecordValue::Map(value)
        })
        .collect();

    let mut lookup = Record::new();
    lookup.insert("unique_id".to_string(), RecordValue::string("lookup-pdf-header"));
    lookup.insert("name_en".to_string(), RecordValue::string("PDF Header"));
    lookup.insert("locked".to_string(), RecordValue::Bool(true));
    lookup.insert("lookup_values_en".to_string(), RecordValue::List(values));
    lookup
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::RubySerializer;

    #[test]
    fn test_pdf_header_lookup() {
        let out = RubySerializer::new(0)
            .constructor("Lookup.create_or_update!", &pdf_header_lookup(), "\n\n")
            .unwrap();
        assert!(out.starts_with(
            "Lookup.create_or_update!(\n  {\n    unique_id: \"lookup-pdf-header\",\n    name_en: \"PDF Header\",\n    locked: true,\n"
        ));
        assert!(out.contains("        id: \"pdf_header_3\",\n        display_text: \"PDF Header 3\"\n"));
    }
}
