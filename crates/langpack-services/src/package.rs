use crate::util::{ensure_dir, language_dirs};
use crate::Result;
use color_eyre::eyre::WrapErr;
use langpack_config::Settings;
use langpack_core::{archive_file_name, CATALOG_DIR};
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedLanguage {
    pub code: String,
    pub archive: PathBuf,
    pub entries: usize,
}

/// Flattened archive name: JSON files at the root, everything else under
/// `LC_MESSAGES/`, both by base name only.
pub fn archive_entry_name(path: &Path) -> Option<String> {
    let base = path.file_name()?.to_str()?;
    if base.ends_with(".json") {
        Some(base.to_string())
    } else {
        Some(format!("{CATALOG_DIR}/{base}"))
    }
}

/// Write every file under `lang_dir` into a fresh archive at `archive`.
/// Returns the number of entries stored.
pub fn package_language(lang_dir: &Path, archive: &Path) -> Result<usize> {
    let file = File::create(archive)
        .wrap_err_with(|| format!("failed to create {}", archive.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut seen: HashSet<String> = HashSet::new();
    for entry in WalkDir::new(lang_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(name) = archive_entry_name(path) else {
            tracing::warn!(event = "skip_unnamed_file", path = %path.display());
            continue;
        };
        if !seen.insert(name.clone()) {
            tracing::warn!(
                event = "archive_name_collision",
                name = %name,
                path = %path.display(),
                "file flattens onto an existing entry; skipped"
            );
            continue;
        }
        zip.start_file(name.as_str(), options)?;
        let mut src =
            File::open(path).wrap_err_with(|| format!("failed to open {}", path.display()))?;
        std::io::copy(&mut src, &mut zip)?;
        tracing::debug!(event = "archive_entry", archive = %archive.display(), name = %name);
    }
    zip.finish()?;
    Ok(seen.len())
}

/// One archive per language directory under the locale root.
pub fn zip_language_packs(settings: &Settings) -> Result<Vec<PackedLanguage>> {
    ensure_dir(&settings.language_pack_root)?;
    let mut packed = Vec::new();
    for code in language_dirs(&settings.locale_root)? {
        let archive = settings.language_pack_root.join(archive_file_name(&code));
        let entries = package_language(&settings.locale_root.join(&code), &archive)?;
        tracing::info!(
            event = "language_packed",
            code = %code,
            archive = %archive.display(),
            entries = entries
        );
        packed.push(PackedLanguage {
            code,
            archive,
            entries,
        });
    }
    Ok(packed)
}
