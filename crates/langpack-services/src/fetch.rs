use crate::util::{ensure_dir, language_dirs};
use crate::Result;
use color_eyre::eyre::WrapErr;
use langpack_config::{FetchSettings, Settings};
use langpack_core::{LangPackError, CATALOG_DIR};
use std::fs::{self, File};
use std::io::Cursor;
use std::path::Path;

/// Source of translation archives, one zip per language.
pub trait CatalogFetcher {
    fn fetch(&self, lang: &str) -> Result<Vec<u8>>;
}

/// Downloads project exports from a CrowdIn-style API.
pub struct CrowdinFetcher {
    client: reqwest::blocking::Client,
    base_url: String,
    project_id: String,
    api_key: String,
}

impl CrowdinFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("langpack/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()
            .wrap_err("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            project_id: settings.project_id.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    /// Export URL without the key, safe to log.
    pub fn download_url(&self, lang: &str) -> String {
        format!(
            "{}/api/project/{}/download/{}.zip",
            self.base_url, self.project_id, lang
        )
    }
}

impl CatalogFetcher for CrowdinFetcher {
    fn fetch(&self, lang: &str) -> Result<Vec<u8>> {
        let url = self.download_url(lang);
        tracing::info!(event = "fetch_start", lang = lang, url = %url);
        let resp = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .wrap_err_with(|| format!("request for `{lang}` failed"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LangPackError::FetchFailed {
                lang: lang.to_string(),
                status: status.as_u16(),
            }
            .into());
        }
        let bytes = resp
            .bytes()
            .wrap_err_with(|| format!("failed to read `{lang}` archive body"))?;
        Ok(bytes.to_vec())
    }
}

/// Unpack a zip into `dest`. Entries that would land outside `dest` abort the extraction.
pub fn extract_archive(bytes: &[u8], dest: &Path) -> Result<usize> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).wrap_err("invalid zip archive")?;
    ensure_dir(dest)?;
    let mut written = 0usize;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let Some(rel) = entry.enclosed_name() else {
            return Err(LangPackError::UnsafeArchiveEntry {
                name: entry.name().to_string(),
            }
            .into());
        };
        let out_path = dest.join(rel);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = File::create(&out_path)
            .wrap_err_with(|| format!("failed to create {}", out_path.display()))?;
        std::io::copy(&mut entry, &mut f)?;
        written += 1;
    }
    Ok(written)
}

/// Refresh the catalogs of every existing language directory.
/// Only languages that already have a directory are requested.
pub fn download_latest_translations(
    settings: &Settings,
    fetcher: &dyn CatalogFetcher,
) -> Result<Vec<(String, usize)>> {
    let mut fetched = Vec::new();
    for lang in language_dirs(&settings.locale_root)? {
        let bytes = fetcher.fetch(&lang)?;
        let dest = settings.locale_root.join(&lang).join(CATALOG_DIR);
        let files = extract_archive(&bytes, &dest)
            .wrap_err_with(|| format!("failed to unpack translations for `{lang}`"))?;
        tracing::info!(event = "fetch_done", lang = %lang, files = files, bytes = bytes.len());
        fetched.push((lang, files));
    }
    Ok(fetched)
}
