//! Pipeline stages over a locale tree: fetch, metadata, compile, package.
//! Exposes stable entry points for the CLI.

pub mod compile;
pub mod fetch;
pub mod metadata;
pub mod package;
pub mod pipeline;
pub mod util;

pub use compile::{compiler_for, CatalogCompiler, CommandCompiler, CompileSummary, NativeCompiler};
pub use fetch::{download_latest_translations, extract_archive, CatalogFetcher, CrowdinFetcher};
pub use langpack_config::Settings;
pub use langpack_core::{LanguageMetadata, Result};
pub use metadata::{generate_metadata, Manifest};
pub use package::{zip_language_packs, PackedLanguage};
pub use pipeline::{cache_translations, Pipeline, PipelineReport};
