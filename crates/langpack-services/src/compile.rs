use crate::Result;
use color_eyre::eyre::WrapErr;
use langpack_config::CompileSettings;
use langpack_core::LangPackError;
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileSummary {
    pub catalogs: usize,
    /// Known only for the native backend.
    pub messages: Option<usize>,
}

/// Turns every source catalog under a locale root into its compiled form.
pub trait CatalogCompiler {
    fn name(&self) -> &str;
    fn compile(&self, locale_root: &Path) -> Result<CompileSummary>;
}

pub fn compiler_for(settings: &CompileSettings) -> Box<dyn CatalogCompiler> {
    match settings {
        CompileSettings::Native => Box::new(NativeCompiler),
        CompileSettings::Command {
            program,
            args,
            working_dir,
        } => Box::new(CommandCompiler {
            program: program.clone(),
            args: args.clone(),
            working_dir: working_dir.clone(),
        }),
    }
}

/// Writes `<name>.mo` next to every `<name>.po`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCompiler;

impl CatalogCompiler for NativeCompiler {
    fn name(&self) -> &str {
        "native"
    }

    fn compile(&self, locale_root: &Path) -> Result<CompileSummary> {
        let mut summary = CompileSummary {
            catalogs: 0,
            messages: Some(0),
        };
        for entry in WalkDir::new(locale_root).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("po")
            {
                continue;
            }
            let mo = path.with_extension("mo");
            let n = langpack_catalog::compile_po_file(path, &mo)?;
            tracing::debug!(event = "catalog_compiled", po = %path.display(), messages = n);
            summary.catalogs += 1;
            summary.messages = summary.messages.map(|m| m + n);
        }
        Ok(summary)
    }
}

/// Runs an external tool once over the whole tree, e.g. `django-admin compilemessages`.
/// `{locale_root}` in any argument is replaced by the absolute locale root.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl CatalogCompiler for CommandCompiler {
    fn name(&self) -> &str {
        &self.program
    }

    fn compile(&self, locale_root: &Path) -> Result<CompileSummary> {
        let root = std::fs::canonicalize(locale_root)
            .wrap_err_with(|| format!("locale root {} is not accessible", locale_root.display()))?;
        let root_s = root.to_string_lossy();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace("{locale_root}", &root_s))
            .collect();

        tracing::info!(
            event = "compiler_spawn",
            program = %self.program,
            args = ?args,
            cwd = %self.working_dir.display()
        );
        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.working_dir)
            .output()
            .wrap_err_with(|| format!("failed to run `{}`", self.program))?;

        if !output.status.success() {
            return Err(LangPackError::CompilerFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        let catalogs = WalkDir::new(&root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("po"))
            .count();
        Ok(CompileSummary {
            catalogs,
            messages: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn native_compiles_every_catalog_in_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        for code in ["es", "fr"] {
            let dir = root.join(code).join("LC_MESSAGES");
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("django.po"), "msgid \"Hi\"\nmsgstr \"Salut\"\n").unwrap();
        }
        fs::write(root.join("es").join("LC_MESSAGES").join("readme.txt"), "x").unwrap();

        let summary = NativeCompiler.compile(root).unwrap();
        assert_eq!(
            summary,
            CompileSummary {
                catalogs: 2,
                messages: Some(2)
            }
        );
        let mo = fs::read(root.join("fr").join("LC_MESSAGES").join("django.mo")).unwrap();
        let map = langpack_catalog::parse_mo(&mo).unwrap();
        assert_eq!(map["Hi"], "Salut");
        assert!(!root.join("es").join("LC_MESSAGES").join("readme.mo").exists());
    }

    #[test]
    fn native_fails_on_malformed_catalog() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("es").join("LC_MESSAGES");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("django.po"), "msgid \"Hi\"\nwhat is this\n").unwrap();

        let err = NativeCompiler.compile(tmp.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LangPackError>(),
            Some(LangPackError::MalformedCatalog { line: 2, .. })
        ));
    }

    #[test]
    fn selects_backend_from_settings() {
        assert_eq!(compiler_for(&CompileSettings::Native).name(), "native");
        let cmd = CompileSettings::Command {
            program: "msgfmt-all".into(),
            args: vec![],
            working_dir: PathBuf::from("."),
        };
        assert_eq!(compiler_for(&cmd).name(), "msgfmt-all");
    }

    #[cfg(unix)]
    #[test]
    fn command_runs_in_working_dir_with_root_placeholder() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("locale");
        fs::create_dir_all(root.join("es").join("LC_MESSAGES")).unwrap();
        fs::write(root.join("es").join("LC_MESSAGES").join("django.po"), "").unwrap();

        let c = CommandCompiler {
            program: "sh".into(),
            args: vec![
                "-c".into(),
                "pwd > cwd.txt && touch \"$0/compiled\"".into(),
                "{locale_root}".into(),
            ],
            working_dir: tmp.path().to_path_buf(),
        };
        let summary = c.compile(&root).unwrap();
        assert_eq!(summary.catalogs, 1);
        assert_eq!(summary.messages, None);
        assert!(root.join("compiled").exists());
        assert!(tmp.path().join("cwd.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn command_failure_carries_status_and_stderr() {
        let tmp = tempfile::tempdir().unwrap();
        let c = CommandCompiler {
            program: "sh".into(),
            args: vec!["-c".into(), "echo broken catalog >&2; exit 3".into()],
            working_dir: tmp.path().to_path_buf(),
        };
        let err = c.compile(tmp.path()).unwrap_err();
        match err.downcast_ref::<LangPackError>() {
            Some(LangPackError::CompilerFailed { program, stderr, .. }) => {
                assert_eq!(program, "sh");
                assert_eq!(stderr, "broken catalog");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_program_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let c = CommandCompiler {
            program: "definitely-not-a-real-compiler-binary".into(),
            args: vec![],
            working_dir: tmp.path().to_path_buf(),
        };
        assert!(c.compile(tmp.path()).is_err());
    }
}
