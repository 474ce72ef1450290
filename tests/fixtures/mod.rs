//! Test fixtures for golden-file assertions
//!
//! - `gamedata/`: a small document tree with one patch collection
//! - `expected.cfg`: every document left after patching `gamedata/`, in
//!   catalog order

#![allow(dead_code)]

use confpatch::{Catalog, EngineConfig};
use confpatch_tree::{parse_document, Node};
use std::path::{Path, PathBuf};

/// Path to the fixture document root
pub fn gamedata_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/gamedata")
}

/// Path to the golden output
pub fn expected_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/expected.cfg")
}

pub fn load_gamedata() -> Catalog {
    Catalog::load_dir(&gamedata_path(), &EngineConfig::default()).expect("fixture catalog loads")
}

pub fn expected_documents() -> Vec<Node> {
    let text = std::fs::read_to_string(expected_path()).expect("golden file readable");
    parse_document(&text).expect("golden file parses")
}

/// Every document of `catalog`, in order.
pub fn documents(catalog: &Catalog) -> Vec<Node> {
    catalog.documents().map(|(_, node)| node.clone()).collect()
}

/// One file holding `text`.
pub fn single_file(text: &str) -> Catalog {
    Catalog::new().with_file("test.cfg", "", parse_document(text).expect("test document parses"))
}
