//! Installed font file discovery (made by FontLab https://www.fontlab.com/)

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use walkdir::WalkDir;

/// Extensions treated as installed font files.
pub const FONT_EXTENSIONS: [&str; 11] = [
    "ttf", "otf", "ttc", "otc", "pfb", "pfm", "pfa", "bdf", "pcf", "psf", "psfu",
];

/// Path to an installed font file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct InstalledFontFile {
    pub path: PathBuf,
}

/// Trait for enumerating installed fonts from some backing store.
pub trait FontDiscovery {
    fn discover(&self) -> Result<Vec<InstalledFontFile>>;
}

/// Recursive filesystem walker over font directories.
#[derive(Debug, Clone)]
pub struct PathDiscovery {
    roots: Vec<PathBuf>,
    follow_symlinks: bool,
    skip_missing: bool,
}

impl PathDiscovery {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let roots = roots.into_iter().map(Into::into).collect();
        Self {
            roots,
            follow_symlinks: false,
            skip_missing: false,
        }
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Ignore roots that do not exist instead of failing.
    pub fn skip_missing(mut self, skip: bool) -> Self {
        self.skip_missing = skip;
        self
    }
}

impl FontDiscovery for PathDiscovery {
    fn discover(&self) -> Result<Vec<InstalledFontFile>> {
        let mut found = Vec::new();

        for root in &self.roots {
            if !root.exists() {
                if self.skip_missing {
                    log::debug!("skipping missing font root {}", root.display());
                    continue;
                }
                return Err(anyhow!("root path does not exist: {}", root.display()));
            }

            for entry in WalkDir::new(root).follow_links(self.follow_symlinks) {
                let entry = match entry {
                    Ok(entry) => entry,
                    // unreadable subdirectories are common under system font roots
                    Err(err) if err.depth() > 0 => {
                        log::warn!("skipping unreadable font path: {err}");
                        continue;
                    }
                    Err(err) => return Err(err.into()),
                };
                if entry.file_type().is_file() && is_font(entry.path()) {
                    found.push(InstalledFontFile {
                        path: entry.path().to_path_buf(),
                    });
                }
            }
        }

        found.sort();
        found.dedup();
        Ok(found)
    }
}

pub fn is_font(path: &Path) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return false,
    };

    FONT_EXTENSIONS.contains(&ext.as_str())
}
