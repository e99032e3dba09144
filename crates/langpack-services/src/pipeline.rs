use crate::compile::{compiler_for, CatalogCompiler, CompileSummary};
use crate::fetch::{download_latest_translations, CatalogFetcher, CrowdinFetcher};
use crate::metadata::{generate_metadata, manifest_path};
use crate::package::{zip_language_packs, PackedLanguage};
use crate::Result;
use langpack_config::Settings;
use langpack_core::LanguageMetadata;
use std::path::PathBuf;

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// `(lang, files extracted)`; empty when fetching is disabled.
    pub fetched: Vec<(String, usize)>,
    pub metadata: Vec<LanguageMetadata>,
    pub manifest: PathBuf,
    pub compiler: String,
    pub compiled: CompileSummary,
    pub packs: Vec<PackedLanguage>,
}

/// Fetch → metadata → compile → package, strictly in that order.
/// The first failing stage aborts the run.
pub struct Pipeline<'a> {
    settings: &'a Settings,
    fetcher: Option<&'a dyn CatalogFetcher>,
    compiler: &'a dyn CatalogCompiler,
}

impl<'a> Pipeline<'a> {
    pub fn new(settings: &'a Settings, compiler: &'a dyn CatalogCompiler) -> Self {
        Self {
            settings,
            fetcher: None,
            compiler,
        }
    }

    pub fn with_fetcher(mut self, fetcher: &'a dyn CatalogFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn run(&self) -> Result<PipelineReport> {
        let s = self.settings;
        tracing::info!(
            event = "pipeline_start",
            locale_root = %s.locale_root.display(),
            language_pack_root = %s.language_pack_root.display(),
            fetch = self.fetcher.is_some(),
            compiler = self.compiler.name()
        );

        let fetched = match self.fetcher {
            Some(f) => stage("fetch", || download_latest_translations(s, f))?,
            None => Vec::new(),
        };
        let metadata = stage("metadata", || generate_metadata(s))?;
        let compiled = stage("compile", || self.compiler.compile(&s.locale_root))?;
        let packs = stage("package", || zip_language_packs(s))?;

        tracing::info!(event = "pipeline_done", languages = metadata.len(), packs = packs.len());
        Ok(PipelineReport {
            fetched,
            metadata,
            manifest: manifest_path(s),
            compiler: self.compiler.name().to_string(),
            compiled,
            packs,
        })
    }
}

fn stage<T>(name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    tracing::info!(event = "stage_start", stage = name);
    let result = f();
    match &result {
        Ok(_) => tracing::info!(event = "stage_done", stage = name),
        Err(e) => tracing::error!(event = "stage_failed", stage = name, error = %e),
    }
    result
}

/// Run the full pipeline with collaborators built from `settings`.
pub fn cache_translations(settings: &Settings) -> Result<PipelineReport> {
    let compiler = compiler_for(&settings.compile);
    let fetcher = settings.fetch.as_ref().map(CrowdinFetcher::new).transpose()?;

    let mut pipeline = Pipeline::new(settings, compiler.as_ref());
    if let Some(f) = fetcher.as_ref() {
        pipeline = pipeline.with_fetcher(f);
    }
    pipeline.run()
}
