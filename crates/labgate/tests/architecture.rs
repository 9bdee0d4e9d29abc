//! Architecture rule tests.

use std::fs;
use std::path::{Path, PathBuf};

const FORBIDDEN_INNER_IMPORTS: &[&str] = &[
    "crate::infra",
    "crate::app",
    "crate::adapters",
    "tokio::",
    "axum::",
    "tower_http::",
    "reqwest::",
    "tracing::",
];

fn collect_rs_files(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_rs_files(&path, files)?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("rs") {
            files.push(path);
        }
    }
    Ok(())
}

fn violations_in(root: &Path, forbidden: &[&str]) -> Vec<String> {
    let mut files = Vec::new();
    if let Err(err) = collect_rs_files(root, &mut files) {
        panic!("collect source files under {}: {err}", root.display());
    }

    files
        .iter()
        .filter_map(|file| fs::read_to_string(file).ok().map(|text| (file, text)))
        .flat_map(|(file, text)| {
            forbidden
                .iter()
                .filter(move |token| text.contains(**token))
                .map(move |token| format!("{}: {}", file.display(), token))
        })
        .collect()
}

fn assert_layer(layer: &str, forbidden: &[&str]) {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src").join(layer);
    let violations = violations_in(&root, forbidden);
    assert!(
        violations.is_empty(),
        "Found forbidden dependencies in {} layer:\n{}",
        layer,
        violations.join("\n")
    );
}

#[test]
fn domain_layer_has_no_outward_dependencies() {
    assert_layer("domain", FORBIDDEN_INNER_IMPORTS);
}

#[test]
fn usecase_layer_has_no_outward_dependencies() {
    assert_layer("usecases", FORBIDDEN_INNER_IMPORTS);
}

#[test]
fn adapter_layer_does_not_depend_on_app() {
    assert_layer("adapters", &["crate::app"]);
}

#[test]
fn domain_layer_does_not_depend_on_usecases() {
    assert_layer("domain", &["crate::usecases"]);
}
