use crate::util::{ensure_dir, language_dirs};
use crate::Result;
use color_eyre::eyre::WrapErr;
use langpack_catalog::{count_markers, MarkerCounts};
use langpack_config::Settings;
use langpack_core::{language_name, metadata_file_name, LanguageMetadata, CATALOG_DIR, MANIFEST_FILE_NAME};
use serde::Deserialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sum marker counts over every `*.po` directly inside `catalog_dir`.
pub fn completion_stats(catalog_dir: &Path) -> Result<MarkerCounts> {
    let rd = std::fs::read_dir(catalog_dir)
        .wrap_err_with(|| format!("failed to list catalogs in {}", catalog_dir.display()))?;
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in rd {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("po") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut total = MarkerCounts::default();
    for path in paths {
        let content = std::fs::read(&path)
            .wrap_err_with(|| format!("failed to read catalog {}", path.display()))?;
        let counts = count_markers(&content);
        tracing::debug!(
            event = "catalog_counted",
            path = %path.display(),
            source = counts.source,
            translated = counts.translated
        );
        total.add(counts);
    }
    Ok(total)
}

/// Round a non-negative ratio to three decimals, half away from zero, on the
/// exact binary value of `x` (what Python's `round(x, 3)` returns).
pub fn round3(x: f64) -> f64 {
    // A double sits exactly halfway between two thousandths only when it is a
    // multiple of 1/16 whose fourth decimal is 5; `{:.3}` handles the rest exactly.
    let sixteenths = x * 16.0;
    if sixteenths.fract() == 0.0 && sixteenths < 1e15 {
        let ten_thousandths = sixteenths as u64 * 625;
        if ten_thousandths % 10 == 5 {
            return ((ten_thousandths + 5) / 10) as f64 / 1000.0;
        }
    }
    format!("{x:.3}").parse().unwrap_or(x)
}

/// Completion ratio in `[0, 1]`, rounded to three decimals.
/// A language without source strings counts as 0.0.
pub fn percent_translated(code: &str, counts: MarkerCounts) -> f64 {
    if counts.source == 0 {
        tracing::warn!(
            event = "no_source_strings",
            code = code,
            translated = counts.translated,
            "no source strings found; completion set to 0.0"
        );
        return 0.0;
    }
    round3(counts.translated as f64 / counts.source as f64).min(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PreviousMetadata {
    pub percent_translated: f64,
    pub version: u32,
}

/// Read the metadata persisted by an earlier run. Anything unreadable counts
/// as no history.
pub fn load_previous_metadata(path: &Path) -> Option<PreviousMetadata> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!(event = "no_previous_metadata", path = %path.display(), error = %e);
            return None;
        }
    };
    match serde_json::from_slice::<PreviousMetadata>(&bytes) {
        Ok(prev) if prev.version >= 1 => Some(prev),
        Ok(prev) => {
            tracing::warn!(event = "invalid_previous_version", path = %path.display(), version = prev.version);
            None
        }
        Err(e) => {
            tracing::warn!(event = "corrupt_previous_metadata", path = %path.display(), error = %e);
            None
        }
    }
}

/// Version 1 without history; bumped only when the ratio changed.
pub fn next_version(previous: Option<PreviousMetadata>, percent: f64) -> u32 {
    match previous {
        None => 1,
        Some(prev) if prev.percent_translated != percent => prev.version.saturating_add(1),
        Some(prev) => prev.version,
    }
}

/// The aggregate list of published language packs.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: Vec<LanguageMetadata>,
    append_history: bool,
}

impl Manifest {
    pub fn new(append_history: bool) -> Self {
        Self {
            entries: Vec::new(),
            append_history,
        }
    }

    /// Load `path`; a missing or corrupt file yields an empty manifest.
    pub fn load(path: &Path, append_history: bool) -> Self {
        let mut manifest = Self::new(append_history);
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return manifest,
            Err(e) => {
                tracing::warn!(event = "manifest_unreadable", path = %path.display(), error = %e);
                return manifest;
            }
        };
        match serde_json::from_slice::<Vec<LanguageMetadata>>(&bytes) {
            Ok(entries) => manifest.entries = entries,
            Err(e) => {
                tracing::warn!(event = "manifest_corrupt", path = %path.display(), error = %e);
            }
        }
        manifest
    }

    /// Replace the entry for `meta.code`, or append when keeping history.
    pub fn record(&mut self, meta: LanguageMetadata) {
        if !self.append_history {
            if let Some(slot) = self.entries.iter_mut().find(|e| e.code == meta.code) {
                *slot = meta;
                return;
            }
        }
        self.entries.push(meta);
    }

    pub fn entries(&self) -> &[LanguageMetadata] {
        &self.entries
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        if !self.append_history {
            self.entries.sort_by(|a, b| a.code.cmp(&b.code));
        }
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        write_json(path, &self.entries)
    }
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = std::fs::File::create(path)
        .wrap_err_with(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer(&mut w, value)
        .wrap_err_with(|| format!("failed to write {}", path.display()))?;
    w.flush()?;
    Ok(())
}

pub fn manifest_path(settings: &Settings) -> PathBuf {
    settings.language_pack_root.join(MANIFEST_FILE_NAME)
}

/// Compute metadata for one language directory and persist it next to the catalogs.
pub fn language_metadata(locale_root: &Path, code: &str) -> Result<LanguageMetadata> {
    let lang_dir = locale_root.join(code);
    let counts = completion_stats(&lang_dir.join(CATALOG_DIR))?;
    let percent = percent_translated(code, counts);

    let meta_path = lang_dir.join(metadata_file_name(code));
    let version = next_version(load_previous_metadata(&meta_path), percent);

    let meta = LanguageMetadata {
        code: code.to_string(),
        name: language_name(code),
        percent_translated: percent,
        version,
    };
    write_json(&meta_path, &meta)?;

    tracing::info!(
        event = "language_metadata",
        code = code,
        source = counts.source,
        translated = counts.translated,
        percent = percent,
        version = version
    );
    Ok(meta)
}

/// Refresh per-language metadata for the whole locale tree and rewrite the manifest.
pub fn generate_metadata(settings: &Settings) -> Result<Vec<LanguageMetadata>> {
    let path = manifest_path(settings);
    let mut manifest = Manifest::load(&path, settings.append_history);

    let mut fresh = Vec::new();
    for code in language_dirs(&settings.locale_root)? {
        let meta = language_metadata(&settings.locale_root, &code)?;
        manifest.record(meta.clone());
        fresh.push(meta);
    }

    manifest.save(&path)?;
    tracing::info!(
        event = "manifest_written",
        path = %path.display(),
        entries = manifest.entries().len()
    );
    Ok(fresh)
}
