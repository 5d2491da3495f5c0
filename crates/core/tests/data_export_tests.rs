//! Integration tests for the record data exporters
//!
//! Dumps are written to a temporary directory and read back through
//! `DumpStore`, so these cover the whole path from dump file to script.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::{Value, json};
use tempfile::TempDir;

use primero_migration_core::export::{
    BatchDriver, ExportConfig, ExportContext, ExporterKind, OutputFormat,
};
use primero_migration_core::model::RecordType;
use primero_migration_core::source::{Collection, DumpStore};

/// 32 character hex id for document `n`
fn raw_id(n: usize) -> String {
    format!("{:032x}", n + 1)
}

fn canonical(n: usize) -> String {
    let raw = raw_id(n);
    format!(
        "{}-{}-{}-{}-{}",
        &raw[0..8],
        &raw[8..12],
        &raw[12..16],
        &raw[16..20],
        &raw[20..32]
    )
}

fn write_dump(dir: &Path, collection: Collection, documents: &[Value]) {
    let mut file = fs::File::create(dir.join(format!("{}.jsonl", collection.file_stem())))
        .expect("Failed to create dump");
    for document in documents {
        writeln!(file, "{}", document).expect("Failed to write dump");
    }
}

fn cases(count: usize) -> Vec<Value> {
    (0..count)
        .map(|n| {
            json!({
                "_id": raw_id(n),
                "_rev": "1-a",
                "couchrest-type": "Child",
                "name": format!("Child {n}"),
                "cp_short_id": format!("S{n}"),
                "child_status": "open"
            })
        })
        .collect()
}

#[test]
fn test_records_are_split_into_batches_in_order() {
    let dump = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_dump(dump.path(), Collection::Child, &cases(520));

    let store = DumpStore::open(dump.path()).unwrap();
    let context = ExportContext::load(&store).unwrap();
    let config = ExportConfig::new()
        .with_export_dir(out.path())
        .with_batch_size(250);
    let driver = BatchDriver::new(&store, config).unwrap();

    let stats = ExporterKind::Records(RecordType::Case)
        .run(&context, &driver)
        .unwrap();
    assert_eq!(stats.documents_read, 520);
    assert_eq!(stats.records_exported, 520);
    assert_eq!(stats.records_failed, 0);
    assert_eq!(
        stats.units,
        vec![
            out.path().join("cases/case0.rb"),
            out.path().join("cases/case1.rb"),
            out.path().join("cases/case2.rb"),
        ]
    );

    let mut ids = Vec::new();
    let mut sizes = Vec::new();
    for unit in &stats.units {
        let script = fs::read_to_string(unit).unwrap();
        assert!(script.starts_with("# Automatically generated script"));
        assert_eq!(script.matches("records.each do |record|").count(), 1);
        assert!(script.ends_with("end\n"));
        sizes.push(script.matches("Child.new(").count());
        for line in script.lines().filter(|l| l.starts_with("      id: ")) {
            ids.push(line.trim_start_matches("      id: ").trim_end_matches(',').to_string());
        }
    }
    assert_eq!(sizes, vec![250, 250, 20]);
    let expected: Vec<String> = (0..520).map(|n| format!("\"{}\"", canonical(n))).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_records_are_normalized() {
    let dump = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_dump(dump.path(), Collection::Child, &cases(1));

    let store = DumpStore::open(dump.path()).unwrap();
    let context = ExportContext::load(&store).unwrap();
    let driver = BatchDriver::new(&store, ExportConfig::new().with_export_dir(out.path())).unwrap();
    ExporterKind::Records(RecordType::Case)
        .run(&context, &driver)
        .unwrap();

    let script = fs::read_to_string(out.path().join("cases/case0.rb")).unwrap();
    assert!(script.contains("short_id: \"S0\""));
    assert!(script.contains("status: \"open\""));
    assert!(!script.contains("cp_short_id"));
    assert!(!script.contains("child_status"));
    assert!(!script.contains("_rev"));
    assert!(!script.contains("couchrest-type"));
}

#[test]
fn test_bad_record_is_logged_and_skipped() {
    let dump = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let mut documents = cases(2);
    documents.insert(1, json!({"_id": "not-a-couch-id", "name": "Broken"}));
    write_dump(dump.path(), Collection::Child, &documents);

    let store = DumpStore::open(dump.path()).unwrap();
    let context = ExportContext::load(&store).unwrap();
    let driver = BatchDriver::new(&store, ExportConfig::new().with_export_dir(out.path())).unwrap();
    let stats = ExporterKind::Records(RecordType::Case)
        .run(&context, &driver)
        .unwrap();

    assert_eq!(stats.records_exported, 2);
    assert_eq!(stats.records_failed, 1);
    assert_eq!(stats.errors.len(), 1);
    let script = fs::read_to_string(out.path().join("cases/case0.rb")).unwrap();
    assert_eq!(script.matches("Child.new(").count(), 2);
    assert!(!script.contains("Broken"));
}

#[test]
fn test_json_output() {
    let dump = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_dump(dump.path(), Collection::Child, &cases(3));

    let store = DumpStore::open(dump.path()).unwrap();
    let context = ExportContext::load(&store).unwrap();
    let config = ExportConfig::new()
        .with_export_dir(out.path())
        .with_batch_size(2)
        .with_format(OutputFormat::Json);
    let driver = BatchDriver::new(&store, config).unwrap();
    let stats = ExporterKind::Records(RecordType::Case)
        .run(&context, &driver)
        .unwrap();
    assert_eq!(stats.units.len(), 2);

    let first: Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("cases/case0.json")).unwrap())
            .unwrap();
    let records = first.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["id"], json!(canonical(0)));
    assert_eq!(records[0]["data"]["short_id"], json!("S0"));

    let second: Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("cases/case1.json")).unwrap())
            .unwrap();
    assert_eq!(second.as_array().unwrap().len(), 1);
}

#[test]
fn test_data_exporters_write_their_directories() {
    let dump = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_dump(
        dump.path(),
        Collection::Child,
        &[json!({
            "_id": raw_id(0),
            "name": "Joe",
            "flags": [{"message": "Check age", "date": "2019-05-01", "removed": false}],
            "alerts": [{"alert_for": "new_form", "type": "notes", "date": "2020/02/03", "form_sidebar_id": "notes"}],
            "histories": [{"user_name": "primero", "action": "create", "datetime": "2019-07-01T08:00:00Z"}],
            "transitions": [{"unique_id": "t1", "type": "referral", "to_user_local": "a"}],
            "incident_details": [{"unique_id": "d1", "cp_incident_location_type": "home"}]
        })],
    );

    let store = DumpStore::open(dump.path()).unwrap();
    let context = ExportContext::load(&store).unwrap();
    let driver = BatchDriver::new(&store, ExportConfig::new().with_export_dir(out.path())).unwrap();
    for kind in ExporterKind::data(&[RecordType::Case]) {
        let stats = kind.run(&context, &driver).unwrap();
        assert_eq!(stats.records_failed, 0, "{kind:?} failed: {:?}", stats.errors);
        assert_eq!(stats.units.len(), 1, "{kind:?} wrote no unit");
    }

    let flags = fs::read_to_string(out.path().join("flags/case_flags0.rb")).unwrap();
    assert!(flags.contains("Flag.new("));
    assert!(flags.contains(&format!("record_id: \"{}\"", canonical(0))));

    let alerts = fs::read_to_string(out.path().join("alerts/alerts0.rb")).unwrap();
    assert!(alerts.contains("Alert.new("));

    let histories =
        fs::read_to_string(out.path().join("record_histories/case_record_history0.rb")).unwrap();
    assert!(histories.contains("RecordHistory.new("));

    let transitions =
        fs::read_to_string(out.path().join("case_transitions/case_transition0.rb")).unwrap();
    assert!(transitions.contains("Transition.new("));
    assert!(transitions.contains("type: \"Referral\""));

    let incidents =
        fs::read_to_string(out.path().join("incident_from_cases/incident_from_case0.rb")).unwrap();
    assert!(incidents.contains("Incident.new("));
    assert!(incidents.contains(&format!("incident_case_id: \"{}\"", canonical(0))));
    assert!(incidents.contains("cp_incident_location_type: \"home\""));

    let case = fs::read_to_string(out.path().join("cases/case0.rb")).unwrap();
    assert!(!case.contains("flags"));
    assert!(!case.contains("histories"));
    assert!(!case.contains("incident_details"));
}

#[test]
fn test_attachments_are_copied_and_scripted() {
    let dump = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_dump(
        dump.path(),
        Collection::Child,
        &[
            json!({
                "_id": raw_id(0),
                "_attachments": {
                    "photo1": {"content_type": "image/png"},
                    "doc1": {"content_type": "application/pdf", "data": "JVBERi0xLjQgdGVzdA=="}
                },
                "photo_keys": ["photo1"],
                "other_documents": [{"attachment_key": "doc1", "file_name": "report.pdf", "is_current": true}]
            }),
            json!({"_id": raw_id(1), "name": "No files"}),
        ],
    );
    let photo_dir = dump.path().join("attachments").join(raw_id(0));
    fs::create_dir_all(&photo_dir).unwrap();
    fs::write(photo_dir.join("photo1"), b"\x89PNG\r\n\x1A\n\0\0\0\rIHDR").unwrap();

    let store = DumpStore::open(dump.path()).unwrap();
    let context = ExportContext::load(&store).unwrap();
    let driver = BatchDriver::new(&store, ExportConfig::new().with_export_dir(out.path())).unwrap();
    let stats = ExporterKind::Attachments.run(&context, &driver).unwrap();
    assert_eq!(stats.records_failed, 0, "{:?}", stats.errors);
    assert_eq!(stats.items_written, 2);

    let folder = out.path().join("cases-attachments").join(canonical(0));
    assert!(folder.join("photo_keys/photo1").is_file());
    assert_eq!(
        fs::read(folder.join("other_documents/report.pdf")).unwrap(),
        b"%PDF-1.4 test"
    );

    let script = fs::read_to_string(out.path().join("cases-attachments/cases.1.rb")).unwrap();
    assert!(script.contains("attachment.attachment_type = 'image'"));
    assert!(script.contains("attachment.attachment_type = 'document'"));
    assert_eq!(script.matches("attachment.save!").count(), 2);
}

#[test]
fn test_missing_attachment_fails_only_its_record() {
    let dump = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_dump(
        dump.path(),
        Collection::Child,
        &[json!({
            "_id": raw_id(0),
            "_attachments": {"photo1": {"content_type": "image/png"}},
            "photo_keys": ["photo1"]
        })],
    );

    let store = DumpStore::open(dump.path()).unwrap();
    let context = ExportContext::load(&store).unwrap();
    let driver = BatchDriver::new(&store, ExportConfig::new().with_export_dir(out.path())).unwrap();
    let stats = ExporterKind::Attachments.run(&context, &driver).unwrap();
    assert_eq!(stats.records_failed, 1);
    assert!(stats.units.is_empty());
}
