//! Integration tests for record sources.

use std::fs::File;
use std::io::Write;

use feedscope::prelude::*;
use feedscope::sources::{source_for, CsvOptions, CsvSource, RecordSource};
use serde_json::json;
use tempfile::TempDir;

/// Creates a test directory with sample files of every text format.
fn create_test_data() -> TempDir {
    let dir = TempDir::new().unwrap();

    let mut file1 = File::create(dir.path().join("data1.csv")).unwrap();
    writeln!(file1, "id,name,value").unwrap();
    writeln!(file1, "1,Alice,100").unwrap();
    writeln!(file1, "2,Bob,200").unwrap();
    file1.flush().unwrap();

    let mut file2 = File::create(dir.path().join("data2.csv")).unwrap();
    writeln!(file2, "id,name,value").unwrap();
    writeln!(file2, "3,Charlie,300").unwrap();
    file2.flush().unwrap();

    let mut tsv = File::create(dir.path().join("data.tsv")).unwrap();
    writeln!(tsv, "id\tname\tvalue").unwrap();
    writeln!(tsv, "5\tEve\t500").unwrap();
    tsv.flush().unwrap();

    let mut jsonl = File::create(dir.path().join("events.jsonl")).unwrap();
    writeln!(jsonl, r#"{{"id": 1, "tags": ["a", "b"]}}"#).unwrap();
    writeln!(jsonl, r#"{{"id": 2, "tags": []}}"#).unwrap();
    jsonl.flush().unwrap();

    let mut xml = File::create(dir.path().join("catalog.xml")).unwrap();
    write!(
        xml,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog>
  <book id="b1"><title>Dune</title><author>Herbert</author></book>
  <book id="b2"><title>Emma</title><author>Austen</author><author>Anon</author></book>
</catalog>"#
    )
    .unwrap();
    xml.flush().unwrap();

    dir
}

fn collect(path: &std::path::Path) -> Vec<Value> {
    open_records(path, FileType::from_path(path))
        .unwrap()
        .collect::<Result<_>>()
        .unwrap()
}

#[test]
fn test_glob_expansion_is_sorted() {
    let dir = create_test_data();
    let pattern = format!("{}/data*.csv", dir.path().display());
    let paths = expand_inputs(&pattern).unwrap();

    let names: Vec<_> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["data1.csv", "data2.csv"]);
}

#[test]
fn test_glob_without_matches_is_config_error() {
    let dir = create_test_data();
    let pattern = format!("{}/*.missing", dir.path().display());
    let err = expand_inputs(&pattern).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_csv_rows_are_string_mappings() {
    let dir = create_test_data();
    let records = collect(&dir.path().join("data1.csv"));

    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0],
        Value::from(json!({"id": "1", "name": "Alice", "value": "100"}))
    );
}

#[test]
fn test_tsv_delimiter_is_sniffed() {
    let dir = create_test_data();
    let records = collect(&dir.path().join("data.tsv"));

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("name"), Some(&Value::string("Eve")));
}

#[test]
fn test_csv_explicit_delimiter() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pipes.txt");
    std::fs::write(&path, "a|b\n1|2\n").unwrap();

    let source = CsvSource::with_options(
        &path,
        CsvOptions {
            delimiter: Some(b'|'),
            ..CsvOptions::default()
        },
    );
    let records: Vec<Value> = source.records().unwrap().collect::<Result<_>>().unwrap();
    assert_eq!(records[0], Value::from(json!({"a": "1", "b": "2"})));
}

#[test]
fn test_jsonl_keeps_nesting() {
    let dir = create_test_data();
    let records = collect(&dir.path().join("events.jsonl"));

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("tags").unwrap().as_sequence().unwrap().len(), 2);
    assert!(records[1].get("tags").unwrap().is_empty());
}

#[test]
fn test_xml_records_feed_profiler() {
    let dir = create_test_data();
    let stream = open_records(&dir.path().join("catalog.xml"), FileType::Xml).unwrap();

    let mut profiler = Profiler::new(ProfilerConfig::default()).unwrap();
    profiler
        .run(stream, &std::sync::atomic::AtomicBool::new(false))
        .unwrap();

    let tree = profiler.schema().tree(None).unwrap();
    assert_eq!(tree.record_count(), 2);
    assert_eq!(tree.get("root.id").unwrap().population_count(), 2);
    // the second book repeats <author>, so the path collapses the list
    assert_eq!(tree.get("root.author.text").unwrap().population_count(), 3);
}

#[test]
fn test_missing_file_error_names_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.jsonl");
    let err = open_records(&path, FileType::JsonLines).err().unwrap();
    assert!(err.to_string().contains("absent.jsonl"));
}

#[test]
fn test_source_for_reports_type() {
    let dir = create_test_data();
    let path = dir.path().join("events.jsonl");
    let source = source_for(&path, FileType::from_path(&path), &SourceOptions::default()).unwrap();
    assert_eq!(source.file_type(), FileType::JsonLines);
    assert_eq!(source.path(), path.as_path());
}

#[cfg(not(feature = "parquet"))]
#[test]
fn test_parquet_requires_feature() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("x.parquet");
    let err = source_for(&path, FileType::Parquet, &SourceOptions::default())
        .err()
        .unwrap();
    assert!(err.is_configuration());
}

#[test]
fn test_windows_1252_csv_through_profiler() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("export.csv");
    std::fs::write(&path, b"id;city\n1;M\xfcnchen\n2;Z\xfcrich\n3;M\xfcnchen\n").unwrap();

    let encoding = feedscope::sources::encoding_for_label("cp1252").unwrap();
    let options = SourceOptions::default().with_encoding(encoding);
    let stream = open_records_with(&path, FileType::Csv, &options).unwrap();

    let mut profiler = Profiler::new(ProfilerConfig::default()).unwrap();
    profiler
        .run(stream, &std::sync::atomic::AtomicBool::new(false))
        .unwrap();

    let city = profiler.schema().tree(None).unwrap().get("root.city").unwrap();
    assert_eq!(city.top_values(2), vec![("München", 2), ("Zürich", 1)]);
}
