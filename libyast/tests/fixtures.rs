//! Test harness for the parser against fixture files.
//!
//! Every test/yaml/*.yaml file must parse. When a sibling .tree file exists,
//! each of its lines must equal the inspected root of the corresponding
//! document. Every test/nay/*.yaml file must fail to parse, and when a
//! sibling .error file exists the error's display must match it exactly.

use std::fs;
use std::path::{Path, PathBuf};

use libyast::{parse_with_options, ParseOptions};

/// Root test directory.
fn test_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test")
}

/// All .yaml files of a subdirectory of test/, sorted.
fn fixture_files(subdir: &str) -> Vec<PathBuf> {
    let pattern = test_root().join(subdir).join("*.yaml");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .expect("valid glob pattern")
        .flatten()
        .collect();
    files.sort();
    files
}

/// Read a sibling file with another extension, if present.
fn read_sibling(path: &Path, ext: &str) -> Option<String> {
    fs::read_to_string(path.with_extension(ext)).ok()
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().to_string()
}

/// Run a single accepted fixture.
fn run_yaml_test(path: &Path) -> Result<(), String> {
    let filename = file_name(path);
    let content = fs::read(path).map_err(|e| format!("Failed to read {}: {}", filename, e))?;
    let options = ParseOptions::default().with_filename(filename.clone());

    let stream = parse_with_options(&content, &options)
        .map_err(|e| format!("{}: Unexpected parse error: {}", filename, e))?;
    let actual: Vec<String> = stream.iter().map(|doc| doc.inspect(doc.root)).collect();

    match read_sibling(path, "tree") {
        Some(expected) => {
            let expected: Vec<&str> = expected.lines().collect();
            if actual != expected {
                return Err(format!(
                    "{}: Tree mismatch\n    expected: {:?}\n    actual:   {:?}",
                    filename, expected, actual
                ));
            }
            println!("  {} => {}", filename, actual.join(" | "));
        }
        None => println!("  {} => {:?} (no expected tree)", filename, actual),
    }
    Ok(())
}

/// Run a single rejected fixture.
fn run_nay_test(path: &Path) -> Result<(), String> {
    let filename = file_name(path);
    let content = fs::read(path).map_err(|e| format!("Failed to read {}: {}", filename, e))?;
    let options = ParseOptions::default().with_filename(filename.clone());

    let err = match parse_with_options(&content, &options) {
        Ok(stream) => {
            return Err(format!(
                "{}: Expected parse error, but got {} document(s)",
                filename,
                stream.len()
            ));
        }
        Err(err) => err,
    };
    let actual = err.to_string();
    match read_sibling(path, "error") {
        Some(expected) if expected.trim() != actual => Err(format!(
            "{}: Error mismatch\n    expected: {}\n    actual:   {}",
            filename,
            expected.trim(),
            actual
        )),
        Some(_) => {
            println!("  {} => error (as expected)", filename);
            Ok(())
        }
        None => {
            println!("  {} => {} (no .error file to compare)", filename, actual);
            Ok(())
        }
    }
}

fn run_all(subdir: &str, run: fn(&Path) -> Result<(), String>) {
    let files = fixture_files(subdir);
    assert!(!files.is_empty(), "no fixtures found in test/{}", subdir);

    println!("\nRunning {} test/{} fixtures:", files.len(), subdir);
    let mut passed = 0;
    let mut errors: Vec<String> = Vec::new();
    for file in &files {
        match run(file) {
            Ok(()) => passed += 1,
            Err(e) => errors.push(e),
        }
    }

    println!("\nResults: {} passed, {} failed", passed, errors.len());
    if !errors.is_empty() {
        println!("\nErrors:");
        for error in &errors {
            println!("  - {}", error);
        }
    }
    assert!(errors.is_empty(), "{} test/{} fixtures failed", errors.len(), subdir);
}

#[test]
fn test_all_yaml_fixtures() {
    run_all("yaml", run_yaml_test);
}

#[test]
fn test_all_nay_fixtures() {
    run_all("nay", run_nay_test);
}
