//! On-disk cache of raw source documents (made by FontLab https://www.fontlab.com/)
//!
//! One `<source-id>.json` file per source holds the document exactly as it
//! was fetched. Writes go to a hidden temp file in the same directory and
//! are renamed into place, so a reader sees either the previous file or the
//! new one, never a half-written mix.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::SourceCatalog;
use crate::error::CacheError;
use crate::sources::{cache_key, SourceConfig};

const CACHE_EXTENSION: &str = "json";
const TEMP_PREFIX: &str = ".";
const TEMP_SUFFIX: &str = ".tmp";

/// Last-known-good document bytes for one source, plus when they were written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub raw: Vec<u8>,
    pub written_at: DateTime<Utc>,
}

/// What `status` reports for each cache file.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryStatus {
    /// Sanitized source id taken from the file name.
    pub source_id: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    #[serde(with = "duration_secs")]
    pub age: Option<Duration>,
    pub fresh: bool,
    pub valid: bool,
}

/// Result of `validate`: which files would be trusted by `load`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheValidation {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

impl CacheValidation {
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ManifestCache {
    dir: PathBuf,
}

impl ManifestCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic file path for a source id.
    pub fn cache_path(&self, source_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{CACHE_EXTENSION}", cache_key(source_id)))
    }

    /// True iff a structurally valid record exists and was written within `ttl`.
    pub fn is_fresh(&self, source_id: &str, ttl: Duration) -> bool {
        let path = self.cache_path(source_id);
        let Ok(meta) = fs::metadata(&path) else {
            return false;
        };
        let Ok(modified) = meta.modified() else {
            return false;
        };
        if age_of(modified) > ttl {
            return false;
        }
        is_valid_cache_file(&path)
    }

    /// Read the raw record, refusing anything that fails the structural check.
    pub fn load_record(&self, source_id: &str) -> Result<CacheRecord, CacheError> {
        let path = self.cache_path(source_id);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(CacheError::Miss {
                    source_id: source_id.to_string(),
                })
            }
            Err(err) => return Err(CacheError::io(&path, err)),
        };

        if !is_valid_cache_bytes(&raw) {
            return Err(CacheError::Corrupt {
                source_id: source_id.to_string(),
                reason: "not a complete JSON object".to_string(),
            });
        }

        let modified = fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .map_err(|err| CacheError::io(&path, err))?;

        Ok(CacheRecord {
            raw,
            written_at: DateTime::<Utc>::from(modified),
        })
    }

    /// Load and parse a cached catalog for `source`.
    ///
    /// A file that is valid JSON but does not fit the catalog schema is
    /// reported as corrupt rather than partially used.
    pub fn load(&self, source: &SourceConfig, priority: usize) -> Result<SourceCatalog, CacheError> {
        let record = self.load_record(&source.id)?;
        SourceCatalog::from_document(source, priority, record.raw, record.written_at).map_err(
            |err| CacheError::Corrupt {
                source_id: source.id.clone(),
                reason: err.to_string(),
            },
        )
    }

    /// Persist the catalog's original document bytes.
    pub fn store(&self, source_id: &str, catalog: &SourceCatalog) -> Result<(), CacheError> {
        self.store_raw(source_id, catalog.raw_document())
    }

    /// Atomically replace the cache file for `source_id` with `raw`.
    pub fn store_raw(&self, source_id: &str, raw: &[u8]) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).map_err(|err| CacheError::io(&self.dir, err))?;
        let path = self.cache_path(source_id);

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.dir)
            .map_err(|err| CacheError::io(&self.dir, err))?;
        tmp.write_all(raw)
            .and_then(|()| tmp.flush())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|err| CacheError::io(tmp.path(), err))?;
        tmp.persist(&path)
            .map_err(|err| CacheError::io(&path, err.error))?;

        log::debug!("cached {} bytes for {source_id} at {}", raw.len(), path.display());
        Ok(())
    }

    /// Remove one source's cache file. Removing an absent file is not an error.
    pub fn clear(&self, source_id: &str) -> Result<bool, CacheError> {
        let path = self.cache_path(source_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(CacheError::io(&path, err)),
        }
    }

    /// Remove every cache file and any temp files left by interrupted writes.
    pub fn clear_all(&self) -> Result<usize, CacheError> {
        let mut removed = 0;
        for path in self.owned_files()? {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(CacheError::io(&path, err)),
            }
        }
        Ok(removed)
    }

    /// Per-file size, age, freshness, and validity, sorted by source id.
    pub fn status(&self, ttl: Duration) -> Result<Vec<CacheEntryStatus>, CacheError> {
        let mut entries = Vec::new();
        for path in self.owned_files()? {
            let Some(source_id) = cache_file_id(&path) else {
                continue;
            };
            let meta = fs::metadata(&path).map_err(|err| CacheError::io(&path, err))?;
            let modified = meta.modified().ok();
            let age = modified.map(age_of);
            let valid = is_valid_cache_file(&path);
            entries.push(CacheEntryStatus {
                source_id,
                size: meta.len(),
                modified: modified.map(DateTime::<Utc>::from),
                age,
                fresh: valid && age.is_some_and(|age| age <= ttl),
                valid,
                path,
            });
        }
        entries.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        Ok(entries)
    }

    /// Bytes used by cache files (temp files excluded).
    pub fn total_size(&self) -> Result<u64, CacheError> {
        let mut total = 0;
        for path in self.owned_files()? {
            if cache_file_id(&path).is_some() {
                total += fs::metadata(&path)
                    .map_err(|err| CacheError::io(&path, err))?
                    .len();
            }
        }
        Ok(total)
    }

    /// Run the structural check over every cache file.
    pub fn validate(&self) -> Result<CacheValidation, CacheError> {
        let mut report = CacheValidation::default();
        for path in self.owned_files()? {
            let Some(source_id) = cache_file_id(&path) else {
                continue;
            };
            if is_valid_cache_file(&path) {
                report.valid.push(source_id);
            } else {
                report.invalid.push(source_id);
            }
        }
        report.valid.sort();
        report.invalid.sort();
        Ok(report)
    }

    /// Cache files and leftover temp files; anything else in the directory is ignored.
    fn owned_files(&self) -> Result<Vec<PathBuf>, CacheError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(CacheError::io(&self.dir, err)),
        };

        let mut files = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|err| CacheError::io(&self.dir, err))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if cache_file_id(&path).is_some() || is_temp_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Structural check only: non-empty, `{ ... }` after trimming, and parses as JSON.
pub fn is_valid_cache_bytes(raw: &[u8]) -> bool {
    let trimmed = raw.trim_ascii();
    if trimmed.is_empty() || trimmed[0] != b'{' || trimmed[trimmed.len() - 1] != b'}' {
        return false;
    }
    serde_json::from_slice::<serde::de::IgnoredAny>(trimmed).is_ok()
}

pub fn is_valid_cache_file(path: &Path) -> bool {
    fs::read(path).is_ok_and(|raw| is_valid_cache_bytes(&raw))
}

fn cache_file_id(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    if name.starts_with(TEMP_PREFIX) {
        return None;
    }
    let stem = name.strip_suffix(&format!(".{CACHE_EXTENSION}"))?;
    (!stem.is_empty()).then(|| stem.to_string())
}

fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX))
}

/// Files stamped in the future count as just written.
fn age_of(modified: SystemTime) -> Duration {
    SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO)
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn google() -> SourceConfig {
        SourceConfig::new("google-fonts", "Google Fonts", "google", "https://g")
    }

    fn catalog(raw: &[u8]) -> SourceCatalog {
        SourceCatalog::from_document(&google(), 0, raw.to_vec(), Utc::now()).expect("catalog")
    }

    #[test]
    fn validity_matches_structural_rules() {
        assert!(!is_valid_cache_bytes(b""));
        assert!(!is_valid_cache_bytes(b"   \n"));
        assert!(!is_valid_cache_bytes(br#"{"a":1"#));
        assert!(!is_valid_cache_bytes(b"font list goes here"));
        assert!(!is_valid_cache_bytes(b"{ not json }"));
        assert!(is_valid_cache_bytes(br#"{"a":1}"#));
        assert!(is_valid_cache_bytes(b"\n\t {\"a\":1}  \r\n"));
    }

    #[test]
    fn validity_check_reads_files() {
        let tmp = TempDir::new().expect("tempdir");
        let cases: [(&str, &[u8], bool); 5] = [
            ("empty.json", b"", false),
            ("truncated.json", br#"{"a":1"#, false),
            ("text.json", b"hello", false),
            ("ok.json", br#"{"a":1}"#, true),
            ("padded.json", b"  {\"a\":1}\n", true),
        ];
        for (name, body, expected) in cases {
            let path = tmp.path().join(name);
            fs::write(&path, body).expect("write");
            assert_eq!(is_valid_cache_file(&path), expected, "{name}");
        }
        assert!(!is_valid_cache_file(&tmp.path().join("missing.json")));
    }

    #[test]
    fn store_then_load_keeps_bytes_identical() {
        let tmp = TempDir::new().expect("tempdir");
        let cache = ManifestCache::new(tmp.path());
        // key order and whitespace must survive
        let raw = b"{\n  \"zeta\": {\"name\": \"Zeta\", \"popularity\": 1},\n  \"alpha\": {\"name\": \"Alpha\"}\n}\n";

        cache.store("google-fonts", &catalog(raw)).expect("store");
        let record = cache.load_record("google-fonts").expect("load");
        assert_eq!(record.raw, raw.to_vec());

        let loaded = cache.load(&google(), 0).expect("parse");
        assert_eq!(loaded.raw_document(), raw.as_slice());
        assert!(loaded.fonts.contains_key("google.alpha"));
    }

    #[test]
    fn missing_file_is_a_miss() {
        let tmp = TempDir::new().expect("tempdir");
        let cache = ManifestCache::new(tmp.path().join("not-created-yet"));
        assert!(matches!(
            cache.load(&google(), 0),
            Err(CacheError::Miss { .. })
        ));
        assert!(!cache.is_fresh("google-fonts", Duration::from_secs(60)));
    }

    #[test]
    fn structurally_broken_or_schema_mismatched_files_are_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let cache = ManifestCache::new(tmp.path());

        fs::write(cache.cache_path("google-fonts"), br#"{"a":1"#).expect("write");
        assert!(matches!(
            cache.load(&google(), 0),
            Err(CacheError::Corrupt { .. })
        ));

        fs::write(cache.cache_path("google-fonts"), br#"{"roboto": 42}"#).expect("write");
        assert!(matches!(
            cache.load(&google(), 0),
            Err(CacheError::Corrupt { .. })
        ));
    }

    #[test]
    fn interrupted_write_leaves_previous_record() {
        let tmp = TempDir::new().expect("tempdir");
        let cache = ManifestCache::new(tmp.path());
        let good = br#"{"roboto": {"name": "Roboto"}}"#;
        cache.store_raw("google-fonts", good).expect("store");

        // crash after writing the temp file but before the rename
        let mut orphan = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(tmp.path())
            .expect("temp");
        orphan.write_all(br#"{"roboto": {"na"#).expect("partial");
        let (_, orphan_path) = orphan.keep().expect("keep");

        let record = cache.load_record("google-fonts").expect("load");
        assert_eq!(record.raw, good.to_vec());

        let status = cache.status(Duration::from_secs(60)).expect("status");
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].source_id, "google-fonts");

        assert_eq!(cache.clear_all().expect("clear"), 2);
        assert!(!orphan_path.exists());
    }

    #[test]
    fn interrupted_first_write_is_a_miss() {
        let tmp = TempDir::new().expect("tempdir");
        let cache = ManifestCache::new(tmp.path());
        let mut orphan = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(tmp.path())
            .expect("temp");
        orphan.write_all(b"{\"half").expect("partial");
        let _kept = orphan.keep().expect("keep");

        assert!(matches!(
            cache.load_record("google-fonts"),
            Err(CacheError::Miss { .. })
        ));
    }

    #[test]
    fn freshness_follows_ttl_and_validity() {
        let tmp = TempDir::new().expect("tempdir");
        let cache = ManifestCache::new(tmp.path());
        cache.store_raw("google-fonts", b"{}").expect("store");

        assert!(cache.is_fresh("google-fonts", Duration::from_secs(3600)));
        std::thread::sleep(Duration::from_millis(20));
        assert!(!cache.is_fresh("google-fonts", Duration::ZERO));

        fs::write(cache.cache_path("google-fonts"), b"").expect("truncate");
        assert!(!cache.is_fresh("google-fonts", Duration::from_secs(3600)));
    }

    #[test]
    fn clear_and_introspection() {
        let tmp = TempDir::new().expect("tempdir");
        let cache = ManifestCache::new(tmp.path());
        cache.store_raw("Google Fonts", b"{}").expect("store");
        cache.store_raw("nerd-fonts", b"{\"a\":{}}").expect("store");
        fs::write(cache.cache_path("broken"), b"{").expect("write");
        fs::write(tmp.path().join("notes.txt"), b"keep me").expect("write");

        assert_eq!(cache.total_size().expect("size"), 2 + 8 + 1);
        let report = cache.validate().expect("validate");
        assert_eq!(report.valid, vec!["google-fonts", "nerd-fonts"]);
        assert_eq!(report.invalid, vec!["broken"]);
        assert!(!report.is_clean());

        assert!(cache.clear("nerd-fonts").expect("clear"));
        assert!(!cache.clear("nerd-fonts").expect("clear again"));
        assert_eq!(cache.clear_all().expect("clear all"), 2);
        assert!(tmp.path().join("notes.txt").exists());
        assert_eq!(cache.total_size().expect("size"), 0);
    }

    #[test]
    fn cache_paths_are_sanitized() {
        let cache = ManifestCache::new("/cache");
        assert_eq!(
            cache.cache_path("Google Fonts"),
            PathBuf::from("/cache/google-fonts.json")
        );
        assert_eq!(
            cache.cache_path("../../etc"),
            PathBuf::from("/cache/etc.json")
        );
    }
}
