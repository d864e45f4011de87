//! Walking font folders and tracing what was found back to the catalog.
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use typcat_core::catalog::{Manifest, SourceCatalog};
use typcat_core::discovery::{FontDiscovery, PathDiscovery};
use typcat_core::installed::InstalledFontMatcher;
use typcat_core::names::collect_families;
use typcat_core::sources::SourceConfig;
use typcat_core::system_fonts::is_critical_system_font;

fn manifest() -> Manifest {
    let source = SourceConfig::new("google-fonts", "Google Fonts", "google", "mem://google");
    let doc = br#"{
        "lato": {"name": "Lato", "license": "OFL"},
        "fira-sans": {"name": "Fira Sans", "license": "OFL"}
    }"#;
    let catalog = SourceCatalog::from_document(&source, 0, doc.to_vec(), Utc::now())
        .expect("catalog");
    Manifest::new([catalog])
}

#[test]
fn files_in_nested_folders_are_traced_to_catalog_entries() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    let nested = root.join("user").join("fonts");
    fs::create_dir_all(&nested).expect("mkdir");

    // Not real sfnt data, so names come from the file stems.
    fs::write(root.join("Lato-Regular.ttf"), b"\0\0lato").expect("write");
    fs::write(root.join("Lato-Bold.ttf"), b"\0\0lato").expect("write");
    fs::write(nested.join("Fira_Sans-Italic.otf"), b"\0\0fira").expect("write");
    fs::write(nested.join("Arial.ttf"), b"\0\0arial").expect("write");
    fs::write(nested.join("readme.txt"), b"hello").expect("write");

    let files = PathDiscovery::new([PathBuf::from(root)])
        .discover()
        .expect("discover");
    assert_eq!(files.len(), 4);

    let families = collect_families(&files);
    assert_eq!(
        families.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["Arial", "Fira Sans", "Lato"]
    );

    let matches =
        InstalledFontMatcher::new().match_all(&manifest(), &families, is_critical_system_font);
    assert_eq!(matches.len(), 2);
    assert_eq!(matches["Lato"].font_id, "google.lato");
    assert_eq!(matches["Fira Sans"].font_id, "google.fira-sans");
    assert!(!matches.contains_key("Arial"));
}

#[test]
fn missing_roots_can_be_skipped() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("Lato-Regular.ttf"), b"").expect("write");
    let missing = PathBuf::from("/nonexistent/typcat-fonts");

    let strict = PathDiscovery::new([missing.clone(), temp.path().to_path_buf()]);
    assert!(strict.discover().is_err());

    let lenient = PathDiscovery::new([missing, temp.path().to_path_buf()]).skip_missing(true);
    assert_eq!(lenient.discover().expect("discover").len(), 1);
}
