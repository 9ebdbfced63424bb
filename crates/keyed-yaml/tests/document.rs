/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end tests for loading, editing and saving documents.
 */

use std::fs;
use std::io;
use std::thread;

use keyed_yaml::{Config, Document, Error, LockRegistry, StreamSource, Value};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Route library logs to the test output, once per test binary.
fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyed_yaml=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

const SETTINGS: &str = "\
# Connection settings
server:
  host: localhost # bind address
  port: 8080

  # Allowed origins
  origins:
    - a.example
    - b.example
";

#[test]
fn test_file_edit_preserves_untouched_layout() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.yml");
    fs::write(&path, SETTINGS).unwrap();

    let mut document = Document::from_path(&path);
    document.load().unwrap();

    let port = document.put(&["server", "port"]).unwrap();
    assert_eq!(port.borrow().value().as_i32().unwrap(), 8080);
    port.borrow_mut().set_value("9090");

    document
        .put(&["server", "origins"])
        .unwrap()
        .borrow_mut()
        .add_value(Value::new("c.example").with_side_comment("new"));
    document
        .put(&["server", "timeout"])
        .unwrap()
        .borrow_mut()
        .set_value("30")
        .set_comments(["Seconds"]);
    document.save().unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "\
# Connection settings
server:
  host: localhost # bind address
  port: 9090

  # Allowed origins
  origins:
    - a.example
    - b.example
    - c.example # new
  # Seconds
  timeout: 30
"
    );
}

#[test]
fn test_first_save_creates_file_content() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("new.yml");
    fs::write(&path, "").unwrap();

    let mut document = Document::from_path(&path);
    document.load().unwrap();
    document
        .add(&["name"])
        .unwrap()
        .borrow_mut()
        .set_value("demo");
    document
        .add(&["paths", "cache"])
        .unwrap()
        .borrow_mut()
        .set_value("/tmp/cache");
    document.save().unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "name: demo\npaths:\n  cache: /tmp/cache\n"
    );
}

#[test]
fn test_missing_file_is_a_read_failure() {
    let temp = TempDir::new().unwrap();
    let mut document = Document::from_path(temp.path().join("absent.yml"));

    let error = document.load().unwrap_err();
    assert!(error.is_reader_failure());
    assert!(matches!(error, Error::Read(ref inner) if inner.kind() == io::ErrorKind::NotFound));
    assert!(!document.is_loaded());
}

#[test]
fn test_handles_survive_reload_after_external_change() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.yml");
    fs::write(&path, SETTINGS).unwrap();

    let mut document = Document::from_path(&path);
    document.load().unwrap();
    let origins = document.get(&["server", "origins"]).unwrap();
    assert_eq!(origins.borrow().values.len(), 2);

    fs::write(&path, "server:\n  origins:\n    - only.example\n").unwrap();
    document.load().unwrap();

    let texts: Vec<_> = origins
        .borrow()
        .values
        .iter()
        .map(|value| value.text.clone())
        .collect();
    assert_eq!(texts, vec![Some("only.example".to_string())]);
    assert!(!document.contains(&["server", "host"]));
}

#[test]
fn test_defaults_are_written_for_empty_sections() {
    let mut document = Document::from_text("mode:\n");
    document.load().unwrap();

    let mode = document.put(&["mode"]).unwrap();
    mode.borrow_mut()
        .set_default_value("fast")
        .set_default_comments(["One of fast or safe"]);
    assert_eq!(mode.borrow().value().text(), Some("fast"));

    document.save().unwrap();
    assert_eq!(document.source().text(), "# One of fast or safe\nmode: fast\n");
}

#[test]
fn test_raw_config_keeps_quotes_and_padding() {
    let mut document = Document::new(
        keyed_yaml::MemorySource::new("a: \"quoted\"\nb: 'single'\n"),
        Config::raw(),
    );
    document.load().unwrap();

    let a = document.get(&["a"]).unwrap();
    assert_eq!(a.borrow().value().text(), Some("\"quoted\""));
    document.save().unwrap();
    assert_eq!(document.source().text(), "a: \"quoted\"\nb: 'single'\n");
}

#[test]
fn test_stream_source_document() {
    let input = "list:\n  - 1\n  - 2\n".as_bytes();
    let mut document = Document::new(StreamSource::new(input, Vec::new()), Config::default());
    document.load().unwrap();

    let list = document.get(&["list"]).unwrap();
    let numbers: Vec<i64> = list
        .borrow()
        .resolved_values()
        .iter()
        .map(|value| value.as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2]);

    list.borrow_mut().add_value("3");
    document.save().unwrap();

    let output = document.into_source().into_output();
    assert_eq!(String::from_utf8(output).unwrap(), "list:\n  - 1\n  - 2\n  - 3\n");
}

#[test]
fn test_locked_documents_do_not_lose_updates() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("counter.yml");
    fs::write(&path, "# shared counter\ncount: 0\n").unwrap();
    let registry = LockRegistry::new();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let mut document = Document::from_path(&path);
                for _ in 0..25 {
                    let _guard = document.lock(&registry);
                    document.load().unwrap();
                    let count = document.put(&["count"]).unwrap();
                    let next = count.borrow().value().as_i64().unwrap() + 1;
                    count.borrow_mut().set_value(next.to_string());
                    document.save().unwrap();
                }
            });
        }
    });

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "# shared counter\ncount: 100\n"
    );
    assert!(registry.is_empty());
}
