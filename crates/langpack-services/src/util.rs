use crate::Result;
use color_eyre::eyre::WrapErr;
use std::path::Path;

/// Language codes under `locale_root`: every subdirectory whose name does not
/// end in `.json`, sorted.
pub fn language_dirs(locale_root: &Path) -> Result<Vec<String>> {
    let rd = std::fs::read_dir(locale_root)
        .wrap_err_with(|| format!("failed to list locale root {}", locale_root.display()))?;
    let mut langs = Vec::new();
    for entry in rd {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!(event = "skip_non_utf8_dir", path = %entry.path().display());
            continue;
        };
        if name.ends_with(".json") {
            continue;
        }
        langs.push(name);
    }
    langs.sort();
    Ok(langs)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .wrap_err_with(|| format!("failed to create {}", path.display()))
}
