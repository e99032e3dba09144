use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "langpack.toml";
pub const DEFAULT_LOCALE_ROOT: &str = "locale";
pub const DEFAULT_PACK_ROOT: &str = "language_packs";
pub const DEFAULT_FETCH_BASE_URL: &str = "https://api.crowdin.com";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

/// Raw file-level configuration; every field optional so sources can be merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LangPackConfig {
    pub locale_root: Option<PathBuf>,
    pub language_pack_root: Option<PathBuf>,
    pub fetch: Option<FetchCfg>,
    pub compile: Option<CompileCfg>,
    pub manifest: Option<ManifestCfg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchCfg {
    pub enabled: Option<bool>,
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompileCfg {
    /// "native" or "command"
    pub backend: Option<String>,
    pub command: Option<Vec<String>>,
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestCfg {
    pub append_history: Option<bool>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("fetch is enabled but `{0}` is not set")]
    MissingFetchField(&'static str),
    #[error("unknown compile backend `{0}` (expected `native` or `command`)")]
    UnknownBackend(String),
    #[error("compile backend `command` needs a non-empty `compile.command`")]
    EmptyCommand,
}

/// Load configuration from `./langpack.toml` and `<config_dir>/langpack/langpack.toml`
/// (earlier sources win), then apply environment overrides.
pub fn load_config() -> Result<LangPackConfig, ConfigError> {
    let mut candidates = Vec::new();
    if let Ok(p) = std::env::current_dir() {
        candidates.push(p.join(CONFIG_FILE_NAME));
    }
    if let Some(base) = dirs::config_dir() {
        candidates.push(base.join("langpack").join(CONFIG_FILE_NAME));
    }
    let cfg = load_config_from(&candidates)?;
    Ok(apply_env(cfg, |k| std::env::var(k).ok()))
}

/// Merge the given files in order; missing files are skipped.
pub fn load_config_from(paths: &[PathBuf]) -> Result<LangPackConfig, ConfigError> {
    let mut merged = LangPackConfig::default();
    for path in paths {
        if let Some(cfg) = read_config_file(path)? {
            merged = merge(merged, cfg);
        }
    }
    Ok(merged)
}

fn read_config_file(path: &Path) -> Result<Option<LangPackConfig>, ConfigError> {
    let s = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    toml::from_str::<LangPackConfig>(&s)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Environment variables take precedence over files.
pub fn apply_env<F>(mut cfg: LangPackConfig, var: F) -> LangPackConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = var("LANGPACK_LOCALE_ROOT") {
        cfg.locale_root = Some(PathBuf::from(v));
    }
    if let Some(v) = var("LANGPACK_PACK_ROOT") {
        cfg.language_pack_root = Some(PathBuf::from(v));
    }
    let project_id = var("CROWDIN_PROJECT_ID");
    let api_key = var("CROWDIN_PROJECT_KEY");
    if project_id.is_some() || api_key.is_some() {
        let fetch = cfg.fetch.get_or_insert_with(FetchCfg::default);
        if project_id.is_some() {
            fetch.project_id = project_id;
        }
        if api_key.is_some() {
            fetch.api_key = api_key;
        }
    }
    cfg
}

fn merge(mut a: LangPackConfig, b: LangPackConfig) -> LangPackConfig {
    if a.locale_root.is_none() {
        a.locale_root = b.locale_root;
    }
    if a.language_pack_root.is_none() {
        a.language_pack_root = b.language_pack_root;
    }
    a.fetch = merge_opt(a.fetch, b.fetch, merge_fetch);
    a.compile = merge_opt(a.compile, b.compile, merge_compile);
    a.manifest = merge_opt(a.manifest, b.manifest, merge_manifest);
    a
}

fn merge_opt<T>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_fetch(mut a: FetchCfg, b: FetchCfg) -> FetchCfg {
    if a.enabled.is_none() {
        a.enabled = b.enabled;
    }
    if a.project_id.is_none() {
        a.project_id = b.project_id;
    }
    if a.api_key.is_none() {
        a.api_key = b.api_key;
    }
    if a.base_url.is_none() {
        a.base_url = b.base_url;
    }
    if a.timeout_secs.is_none() {
        a.timeout_secs = b.timeout_secs;
    }
    a
}
fn merge_compile(mut a: CompileCfg, b: CompileCfg) -> CompileCfg {
    if a.backend.is_none() {
        a.backend = b.backend;
    }
    if a.command.is_none() {
        a.command = b.command;
    }
    if a.working_dir.is_none() {
        a.working_dir = b.working_dir;
    }
    a
}
fn merge_manifest(mut a: ManifestCfg, b: ManifestCfg) -> ManifestCfg {
    if a.append_history.is_none() {
        a.append_history = b.append_history;
    }
    a
}

/// Fully resolved settings handed to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub locale_root: PathBuf,
    pub language_pack_root: PathBuf,
    pub fetch: Option<FetchSettings>,
    pub compile: CompileSettings,
    /// Legacy manifest mode: append every run's entries without deduplication.
    pub append_history: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub project_id: String,
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompileSettings {
    Native,
    Command {
        program: String,
        args: Vec<String>,
        working_dir: PathBuf,
    },
}

impl Settings {
    /// Native compiler, no fetching, replace-mode manifest.
    pub fn new(locale_root: impl Into<PathBuf>, language_pack_root: impl Into<PathBuf>) -> Self {
        Self {
            locale_root: locale_root.into(),
            language_pack_root: language_pack_root.into(),
            fetch: None,
            compile: CompileSettings::Native,
            append_history: false,
        }
    }

    pub fn resolve(cfg: LangPackConfig) -> Result<Self, ConfigError> {
        let locale_root = cfg
            .locale_root
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCALE_ROOT));
        let language_pack_root = cfg
            .language_pack_root
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PACK_ROOT));

        let fetch = match cfg.fetch {
            Some(f) if f.enabled.unwrap_or(false) => Some(FetchSettings {
                project_id: f
                    .project_id
                    .ok_or(ConfigError::MissingFetchField("fetch.project_id"))?,
                api_key: f
                    .api_key
                    .ok_or(ConfigError::MissingFetchField("fetch.api_key"))?,
                base_url: f
                    .base_url
                    .unwrap_or_else(|| DEFAULT_FETCH_BASE_URL.to_string()),
                timeout: Duration::from_secs(f.timeout_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS)),
            }),
            _ => None,
        };

        let compile_cfg = cfg.compile.unwrap_or_default();
        let compile = match compile_cfg.backend.as_deref().unwrap_or("native") {
            "native" => CompileSettings::Native,
            "command" => {
                let mut parts = compile_cfg.command.unwrap_or_default().into_iter();
                let program = parts.next().ok_or(ConfigError::EmptyCommand)?;
                let working_dir = compile_cfg
                    .working_dir
                    .unwrap_or_else(|| default_working_dir(&locale_root));
                CompileSettings::Command {
                    program,
                    args: parts.collect(),
                    working_dir,
                }
            }
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let append_history = cfg
            .manifest
            .and_then(|m| m.append_history)
            .unwrap_or(false);

        Ok(Self {
            locale_root,
            language_pack_root,
            fetch,
            compile,
            append_history,
        })
    }
}

// Project root is the locale root's parent, the directory gettext tooling expects to run from.
fn default_working_dir(locale_root: &Path) -> PathBuf {
    match locale_root.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
