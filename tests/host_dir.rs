//! On-disk host tests: loading, background runs, writing back.

mod fixtures;

use confpatch::config::CONFIG_FILE_NAME;
use confpatch::progress::CollectSink;
use confpatch::{spawn_run_with_sink, Catalog, EffectiveConfig, Engine, EngineConfig, EngineError, KnownIdentifiers};
use fixtures::{documents, expected_documents, gamedata_path, load_gamedata};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_dir_layout() {
    let catalog = load_gamedata();
    let files: Vec<_> = catalog
        .files()
        .iter()
        .map(|f| (f.url.as_str(), f.collection.as_str(), f.documents.len()))
        .collect();
    assert_eq!(
        files,
        vec![
            ("MyMod/patches.cfg", "MyMod", 7),
            ("Squad/Parts/probe.cfg", "Squad", 1),
            ("Squad/Parts/tank.cfg", "Squad", 1),
        ]
    );
}

#[test]
fn test_background_run_and_write_back() {
    let catalog = load_gamedata();
    let known = KnownIdentifiers::discover(&catalog, &EngineConfig::default());
    let sink = CollectSink::new();
    let handle = spawn_run_with_sink(Engine::default(), catalog, known, sink.clone()).unwrap();
    let outcome = handle.wait().unwrap();
    assert_eq!(documents(&outcome.catalog), expected_documents());
    assert!(!sink.events().is_empty());

    let out = TempDir::new().unwrap();
    outcome.catalog.write_dir(out.path()).unwrap();
    let reloaded = Catalog::load_dir(out.path(), &EngineConfig::default()).unwrap();
    assert_eq!(reloaded, outcome.catalog);

    let patches = fs::read_to_string(out.path().join("MyMod/patches.cfg")).unwrap();
    assert!(patches.contains("myModPart"));
    assert!(!patches.contains("@PART"));
}

#[test]
fn test_config_file_in_root() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("Keep")).unwrap();
    fs::create_dir_all(root.path().join("Skip")).unwrap();
    fs::write(root.path().join("Keep/a.cfg"), "PART\n{\n\tname = a\n}\n").unwrap();
    fs::write(root.path().join("Keep/notes.txt"), "PART { name = txt }\n").unwrap();
    fs::write(root.path().join("Skip/b.cfg"), "@PART { @name = b }\n").unwrap();
    fs::write(
        root.path().join(CONFIG_FILE_NAME),
        "exclude_dirs = [\"Skip\"]\nextra_identifiers = [\"Extra\"]\ninclude_directory_identifiers = false\n",
    )
    .unwrap();

    let effective = EffectiveConfig::build(Some(&root.path().join(CONFIG_FILE_NAME)), None).unwrap();
    let config = effective.config;
    let catalog = Catalog::load_dir(root.path(), &config).unwrap();
    assert_eq!(catalog.file_count(), 1);
    assert_eq!(catalog.files()[0].url, "Keep/a.cfg");

    let known = KnownIdentifiers::discover(&catalog, &config);
    assert!(known.contains("extra"));
    assert!(!known.contains("Keep"));
}

#[test]
fn test_malformed_file_is_codec_error() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("bad.cfg"), "PART\n{\n\tname = a\n").unwrap();
    let err = Catalog::load_dir(root.path(), &EngineConfig::default()).unwrap_err();
    assert!(matches!(err, EngineError::Codec { .. }));
    assert!(!err.is_fatal());
}

#[test]
fn test_fixture_root_is_present() {
    assert!(gamedata_path().join("MyMod/patches.cfg").exists());
}
