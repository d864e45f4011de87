//! Family and style names of installed font files (made by FontLab https://www.fontlab.com/)
//!
//! With the `fontations` feature the `name` table is read through
//! read-fonts. Without it, or for formats that are not sfnt based (Type 1,
//! BDF, PCF, PSF), names are derived from the file stem.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::discovery::InstalledFontFile;

/// Names read from one face of a font file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaceNames {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttc_index: Option<u32>,
    pub family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

/// Read every face in `path`, falling back to the file stem when the file
/// has no readable `name` table.
pub fn read_face_names(path: &Path) -> Result<Vec<FaceNames>> {
    #[cfg(feature = "fontations")]
    {
        use anyhow::Context;

        let data = std::fs::read(path)
            .with_context(|| format!("reading font {}", path.display()))?;
        match sfnt::read_names(path, &data) {
            Ok(faces) if !faces.is_empty() => return Ok(faces),
            Ok(_) => log::debug!("{} has no usable name records", path.display()),
            Err(err) => log::debug!("{} is not an sfnt font ({err}); using file name", path.display()),
        }
    }

    Ok(stem_names(path).into_iter().collect())
}

/// Distinct family names across `files`. Unreadable files are skipped with a warning.
pub fn collect_families(files: &[InstalledFontFile]) -> BTreeSet<String> {
    let mut families = BTreeSet::new();
    for file in files {
        match read_face_names(&file.path) {
            Ok(faces) => families.extend(faces.into_iter().map(|face| face.family)),
            Err(err) => log::warn!("skipping {}: {err:#}", file.path.display()),
        }
    }
    families
}

/// `Roboto-BoldItalic.ttf` gives family `Roboto`, style `BoldItalic`.
pub fn stem_names(path: &Path) -> Option<FaceNames> {
    let stem = path.file_stem()?.to_string_lossy();
    let stem = stem.trim();
    if stem.is_empty() {
        return None;
    }
    let (family, style) = match stem.rsplit_once('-') {
        Some((family, style)) if !family.trim().is_empty() && !style.trim().is_empty() => {
            (family.trim().to_string(), Some(style.trim().to_string()))
        }
        _ => (stem.to_string(), None),
    };
    Some(FaceNames {
        path: path.to_path_buf(),
        ttc_index: None,
        family: family.replace('_', " "),
        style,
    })
}

#[cfg(feature = "fontations")]
mod sfnt {
    use std::path::Path;

    use anyhow::Result;
    use read_fonts::tables::name::{Name, NameId};
    use read_fonts::{FontRef, TableProvider};

    use super::FaceNames;

    /// Windows English (United States).
    const ENGLISH_US: u16 = 0x0409;

    pub(super) fn read_names(path: &Path, data: &[u8]) -> Result<Vec<FaceNames>> {
        let mut faces = Vec::new();
        for font in FontRef::fonts(data) {
            let font = font?;
            let Ok(name_table) = font.name() else {
                continue;
            };

            let family = lookup(&name_table, NameId::TYPOGRAPHIC_FAMILY_NAME)
                .or_else(|| lookup(&name_table, NameId::FAMILY_NAME));
            let style = lookup(&name_table, NameId::TYPOGRAPHIC_SUBFAMILY_NAME)
                .or_else(|| lookup(&name_table, NameId::SUBFAMILY_NAME));

            if let Some(family) = family {
                faces.push(FaceNames {
                    path: path.to_path_buf(),
                    ttc_index: font.ttc_index(),
                    family,
                    style,
                });
            }
        }
        Ok(faces)
    }

    /// First Unicode record for `id`, English preferred.
    fn lookup(name_table: &Name, id: NameId) -> Option<String> {
        let data = name_table.string_data();
        let mut fallback = None;

        for record in name_table.name_record() {
            if !record.is_unicode() || record.name_id() != id {
                continue;
            }
            let Ok(entry) = record.string(data) else {
                continue;
            };
            let rendered = entry.to_string().trim().to_string();
            if rendered.is_empty() {
                continue;
            }
            if record.language_id() == ENGLISH_US {
                return Some(rendered);
            }
            fallback.get_or_insert(rendered);
        }

        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn stem_fallback_splits_style() {
        let names = stem_names(Path::new("/fonts/Roboto-BoldItalic.ttf")).expect("names");
        assert_eq!(names.family, "Roboto");
        assert_eq!(names.style.as_deref(), Some("BoldItalic"));

        let plain = stem_names(Path::new("/fonts/Open_Sans.otf")).expect("names");
        assert_eq!(plain.family, "Open Sans");
        assert_eq!(plain.style, None);
    }

    #[test]
    fn non_sfnt_files_use_their_file_name() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("Terminus-Bold.pcf");
        fs::write(&path, b"not really a font").expect("write");

        let faces = read_face_names(&path).expect("names");
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].family, "Terminus");
    }

    #[test]
    fn families_are_deduplicated() {
        let tmp = tempdir().expect("tempdir");
        let files: Vec<InstalledFontFile> = ["Hack-Regular.ttf", "Hack-Bold.ttf", "Lato-Light.otf"]
            .iter()
            .map(|name| {
                let path = tmp.path().join(name);
                fs::write(&path, b"").expect("touch");
                InstalledFontFile { path }
            })
            .collect();

        let families: Vec<String> = collect_families(&files).into_iter().collect();
        assert_eq!(families, vec!["Hack".to_string(), "Lato".to_string()]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempdir().expect("tempdir");
        let result = read_face_names(&tmp.path().join("gone.ttf"));
        if cfg!(feature = "fontations") {
            assert!(result.is_err());
        }
    }
}
