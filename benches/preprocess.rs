//! This bench test expands a document that pulls a large number of schemas
//! and examples in through `!include`, then parses the result.

#![allow(missing_docs)]

use std::{fmt::Write as _, path::Path};

use criterion::{Criterion, criterion_group, criterion_main};
use raml::{Parser, preprocess};
use tempfile::TempDir;

const RESOURCES: usize = 200;

/// Writes a root document with one resource per schema file. Each schema is
/// included into a literal block so it stays a string.
fn preseed_directory(path: &Path) -> String {
    let mut root = String::from("#%RAML 0.8\ntitle: Bench\nschemas:\n");
    for i in 0..RESOURCES {
        std::fs::write(
            path.join(format!("schema-{i}.json")),
            format!("{{\n  \"type\": \"object\",\n  \"title\": \"item {i}\"\n}}\n"),
        )
        .unwrap();
        writeln!(root, "  - item{i}: |\n      !include schema-{i}.json").unwrap();
    }
    for i in 0..RESOURCES {
        writeln!(
            root,
            "/items-{i}:\n  get:\n    responses:\n      200:\n        body:\n          application/json:\n            schema: item{i}"
        )
        .unwrap();
    }
    std::fs::write(path.join("api.raml"), &root).unwrap();
    root
}

fn expand(c: &mut Criterion) {
    let tmp_dir = TempDir::new().unwrap();
    let root = preseed_directory(tmp_dir.path());

    c.bench_function("expand includes", |b| {
        b.iter(|| preprocess::expand(&root, tmp_dir.path()).unwrap());
    });

    let parser = Parser::default();
    let path = tmp_dir.path().join("api.raml");
    c.bench_function("parse expanded document", |b| {
        b.iter(|| parser.parse_file(&path).unwrap());
    });
}

criterion_group!(benches, expand);
criterion_main!(benches);
