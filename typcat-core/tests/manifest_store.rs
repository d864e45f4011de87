use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use typcat_core::cache::ManifestCache;
use typcat_core::error::{CatalogError, FetchError, SourceError};
use typcat_core::fetch::{CancelToken, HttpFetcher, SourceFetcher};
use typcat_core::sources::SourceConfig;
use typcat_core::store::{CatalogOrigin, ManifestStore, RefreshPolicy};

/// Every URL is unreachable; records what was asked for.
#[derive(Default)]
struct OfflineFetcher {
    calls: Mutex<Vec<String>>,
}

impl SourceFetcher for OfflineFetcher {
    fn fetch(
        &self,
        url: &str,
        _timeout: Duration,
        _max_bytes: u64,
        _cancel: &CancelToken,
    ) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().expect("lock").push(url.to_string());
        Err(FetchError::Unreachable {
            url: url.to_string(),
            reason: "network is down".to_string(),
        })
    }
}

fn three_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new("google-fonts", "Google Fonts", "google", "mem://google").with_priority(1),
        SourceConfig::new("nerd-fonts", "Nerd Fonts", "nerd", "mem://nerd").with_priority(2),
        SourceConfig::new("font-squirrel", "Font Squirrel", "squirrel", "mem://squirrel")
            .with_priority(3),
    ]
}

fn age_file(path: &std::path::Path, by: Duration) {
    let file = fs::File::options().write(true).open(path).expect("open");
    file.set_modified(SystemTime::now() - by).expect("set mtime");
}

#[test]
fn stale_caches_carry_the_manifest_when_every_source_is_down() {
    let tmp = TempDir::new().expect("tempdir");
    let cache = ManifestCache::new(tmp.path());
    cache
        .store_raw("google-fonts", br#"{"roboto": {"name": "Roboto"}}"#)
        .expect("seed google");
    cache
        .store_raw("nerd-fonts", br#"{"hack": {"name": "Hack"}}"#)
        .expect("seed nerd");
    let three_days = Duration::from_secs(3 * 24 * 60 * 60);
    age_file(&cache.cache_path("google-fonts"), three_days);
    age_file(&cache.cache_path("nerd-fonts"), three_days);

    let store = ManifestStore::new(cache, OfflineFetcher::default(), three_sources());
    let report = store.get(RefreshPolicy::UseCacheIfFresh).expect("manifest");

    assert_eq!(report.manifest.len(), 2);
    assert_eq!(report.stale, vec!["google-fonts", "nerd-fonts"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source_id, "font-squirrel");
    assert!(matches!(
        report.failures[0].error,
        SourceError::Fetch(FetchError::Unreachable { .. })
    ));
    assert!(report.manifest.find_font("google.roboto").is_some());

    // last_updated is the newest timestamp actually used: the stale cache times
    let last = report.manifest.last_updated().expect("timestamp");
    assert!(last < chrono::Utc::now() - chrono::Duration::days(2));
}

#[test]
fn no_catalog_anywhere_is_a_hard_failure() {
    let tmp = TempDir::new().expect("tempdir");
    let store = ManifestStore::new(
        ManifestCache::new(tmp.path()),
        OfflineFetcher::default(),
        three_sources(),
    );

    let err = store
        .get(RefreshPolicy::UseCacheIfFresh)
        .expect_err("nothing to serve");
    assert!(matches!(err, CatalogError::NoSourcesAvailable(_)));
    assert_eq!(err.failures().len(), 3);

    let message = err.to_string();
    for name in ["Google Fonts", "Nerd Fonts", "Font Squirrel"] {
        assert!(message.contains(name), "missing {name} in {message}");
    }
}

#[test]
fn fresh_cache_skips_the_network() {
    let tmp = TempDir::new().expect("tempdir");
    let cache = ManifestCache::new(tmp.path());
    for id in ["google-fonts", "nerd-fonts", "font-squirrel"] {
        cache.store_raw(id, b"{}").expect("seed");
    }

    let store = ManifestStore::new(cache, OfflineFetcher::default(), three_sources());
    let report = store.get(RefreshPolicy::UseCacheIfFresh).expect("manifest");

    assert!(!report.is_degraded());
    assert!(report
        .origins
        .iter()
        .all(|(_, origin)| *origin == CatalogOrigin::FreshCache));
}

#[test]
fn disabled_sources_are_not_visited() {
    let tmp = TempDir::new().expect("tempdir");
    let cache = ManifestCache::new(tmp.path());
    cache.store_raw("google-fonts", b"{}").expect("seed");

    let mut sources = three_sources();
    sources[1].enabled = false;
    sources[2].enabled = false;
    let store = ManifestStore::new(cache, OfflineFetcher::default(), sources);

    let report = store.get(RefreshPolicy::UseCacheIfFresh).expect("manifest");
    assert_eq!(report.manifest.len(), 1);
    assert!(report.failures.is_empty());
}

#[test]
fn sources_sharing_a_cache_file_never_reach_the_cache() {
    let tmp = TempDir::new().expect("tempdir");
    let cache = ManifestCache::new(tmp.path());
    cache
        .store_raw("google-fonts", br#"{"roboto": {"name": "Roboto"}}"#)
        .expect("seed");

    let sources = vec![
        SourceConfig::new("google-fonts", "Google Fonts", "google", "mem://google"),
        SourceConfig::new("Google_Fonts", "Google Mirror", "mirror", "mem://mirror"),
    ];
    let store = ManifestStore::new(cache, OfflineFetcher::default(), sources);

    let err = store
        .get(RefreshPolicy::UseCacheIfFresh)
        .expect_err("colliding cache files");
    assert!(matches!(err, CatalogError::Sources(_)));
    let message = err.to_string();
    assert!(message.contains("google-fonts.json"), "{message}");
}

/// Serve `body` to `hits` sequential connections.
fn serve(body: &'static [u8], hits: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    thread::spawn(move || {
        for _ in 0..hits {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut seen = Vec::new();
            let mut buf = [0u8; 1024];
            while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => seen.extend_from_slice(&buf[..n]),
                }
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
        }
    });
    format!("http://{addr}/google-fonts.json")
}

#[test]
fn http_fetch_is_cached_byte_for_byte() {
    let body: &'static [u8] = b"{\"source_info\": {\"name\": \"Google Fonts\"},\n \"fonts\": {\"google.roboto\": {\"name\": \"Roboto\", \"popularity\": 7}}}";
    let url = serve(body, 1);
    let tmp = TempDir::new().expect("tempdir");
    let sources = vec![SourceConfig::new("google-fonts", "Google Fonts", "google", url)];

    let store = ManifestStore::new(ManifestCache::new(tmp.path()), HttpFetcher::new(), sources)
        .with_request_timeout(Duration::from_secs(5));
    let report = store.get(RefreshPolicy::ForceRefresh).expect("manifest");

    assert_eq!(report.origins[0].1, CatalogOrigin::Fetched);
    let cached = fs::read(store.cache().cache_path("google-fonts")).expect("cache file");
    assert_eq!(cached, body);
    assert_eq!(report.manifest.font_count(), 1);
}
