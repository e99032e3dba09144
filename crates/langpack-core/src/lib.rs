use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Subdirectory of every language directory that holds the catalogs.
/// Also the archive folder non-JSON files are flattened into.
pub const CATALOG_DIR: &str = "LC_MESSAGES";

/// File name of the aggregate manifest inside the language-pack root.
pub const MANIFEST_FILE_NAME: &str = "language_pack_availability.json";

/// `<lang>_metadata.json`, stored inside the language directory.
pub fn metadata_file_name(code: &str) -> String {
    format!("{code}_metadata.json")
}

/// `<lang>_lang_pack.zip`, stored inside the language-pack root.
pub fn archive_file_name(code: &str) -> String {
    format!("{code}_lang_pack.zip")
}

/// Completion metadata published for one language pack.
/// Field order is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageMetadata {
    pub code: String,
    pub name: String,
    pub percent_translated: f64,
    pub version: u32,
}

/// Failures with a stable shape that callers may want to match on.
/// Everything else travels as a plain `eyre::Report` with context.
#[derive(Debug, Error)]
pub enum LangPackError {
    #[error("catalog compiler `{program}` failed ({status}): {stderr}")]
    CompilerFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("download of `{lang}` failed with HTTP {status}")]
    FetchFailed { lang: String, status: u16 },
    #[error("archive entry `{name}` escapes the extraction directory")]
    UnsafeArchiveEntry { name: String },
    #[error("{path}:{line}: {message}")]
    MalformedCatalog {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// English display name for a locale code such as `es`, `pt-BR` or `zh_CN`.
/// Unknown codes are returned unchanged.
pub fn language_name(code: &str) -> String {
    let l = code.trim().to_lowercase().replace('_', "-");
    let name = match l.as_str() {
        "ar" => "Arabic",
        "bg" => "Bulgarian",
        "bn" => "Bengali",
        "ca" => "Catalan",
        "cs" => "Czech",
        "da" => "Danish",
        "de" => "German",
        "el" => "Greek",
        "en" | "en-us" => "English",
        "en-gb" => "English (United Kingdom)",
        "es" | "es-es" => "Spanish",
        "es-419" | "es-mx" | "es-ar" => "Spanish (Latin America)",
        "fa" => "Persian",
        "fi" => "Finnish",
        "fr" | "fr-fr" => "French",
        "fr-ca" => "French (Canada)",
        "gu" => "Gujarati",
        "he" => "Hebrew",
        "hi" => "Hindi",
        "hu" => "Hungarian",
        "id" => "Indonesian",
        "it" => "Italian",
        "ja" => "Japanese",
        "ka" => "Georgian",
        "kn" => "Kannada",
        "ko" => "Korean",
        "mr" => "Marathi",
        "ms" => "Malay",
        "nb" => "Norwegian Bokmål",
        "ne" => "Nepali",
        "nl" => "Dutch",
        "pl" => "Polish",
        "ps" => "Pashto",
        "pt" | "pt-pt" => "Portuguese",
        "pt-br" => "Portuguese (Brazil)",
        "ro" => "Romanian",
        "ru" => "Russian",
        "sk" => "Slovak",
        "sr" => "Serbian",
        "sv" => "Swedish",
        "sw" => "Swahili",
        "ta" => "Tamil",
        "te" => "Telugu",
        "th" => "Thai",
        "tr" => "Turkish",
        "uk" => "Ukrainian",
        "ur" => "Urdu",
        "vi" => "Vietnamese",
        "xh" => "Xhosa",
        "zh" | "zh-cn" | "zh-hans" => "Chinese (Simplified)",
        "zh-tw" | "zh-hk" | "zh-hant" => "Chinese (Traditional)",
        "zu" => "Zulu",
        _ => return code.to_string(),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_codes_to_names() {
        assert_eq!(language_name("es"), "Spanish");
        assert_eq!(language_name("zh_CN"), "Chinese (Simplified)");
        assert_eq!(language_name("pt-BR"), "Portuguese (Brazil)");
        assert_eq!(language_name(" DE "), "German");
        // fallback keeps the code verbatim
        assert_eq!(language_name("xx_YY"), "xx_YY");
    }

    #[test]
    fn file_names_follow_layout() {
        assert_eq!(metadata_file_name("es"), "es_metadata.json");
        assert_eq!(archive_file_name("zh_CN"), "zh_CN_lang_pack.zip");
    }

    #[test]
    fn metadata_serializes_keys_in_order() {
        let meta = LanguageMetadata {
            code: "es".into(),
            name: "Spanish".into(),
            percent_translated: 0.7,
            version: 1,
        };
        let s = serde_json::to_string(&meta).unwrap();
        assert_eq!(
            s,
            r#"{"code":"es","name":"Spanish","percent_translated":0.7,"version":1}"#
        );
    }
}
