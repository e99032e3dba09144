use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use std::process::Command;

/// Binary running in `cwd` with no inherited config or overrides.
fn bin_cmd(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("langpack").unwrap();
    cmd.current_dir(cwd)
        .env("HOME", cwd)
        .env("XDG_CONFIG_HOME", cwd.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("LANGPACK_LOCALE_ROOT")
        .env_remove("LANGPACK_PACK_ROOT")
        .env_remove("CROWDIN_PROJECT_ID")
        .env_remove("CROWDIN_PROJECT_KEY");
    cmd
}

fn write_catalog(root: &Path, code: &str, total: usize, translated: usize) {
    let dir = root.join("locale").join(code).join("LC_MESSAGES");
    fs::create_dir_all(&dir).unwrap();
    let mut body = String::from("msgid \"\"\nmsgstr \"\"\n\"Content-Type: text/plain; charset=UTF-8\\n\"\n\n");
    for i in 0..total {
        let msgstr = if i < translated { format!("t{i}") } else { String::new() };
        body.push_str(&format!("msgid \"s{i}\"\nmsgstr \"{msgstr}\"\n\n"));
    }
    fs::write(dir.join("django.po"), body).unwrap();
}

#[test]
fn help_works() {
    let tmp = tempfile::tempdir().unwrap();
    bin_cmd(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("language pack").or(predicate::str::contains("archive")));
}

#[test]
fn builds_packs_and_manifest_with_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    write_catalog(tmp.path(), "es", 10, 7);
    write_catalog(tmp.path(), "de", 4, 4);

    bin_cmd(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Spanish"))
        .stdout(predicate::str::contains("70.0%"))
        .stdout(predicate::str::contains("es_lang_pack.zip"));

    let packs = tmp.path().join("language_packs");
    assert!(packs.join("es_lang_pack.zip").exists());
    assert!(packs.join("de_lang_pack.zip").exists());

    let manifest: serde_json::Value =
        serde_json::from_slice(&fs::read(packs.join("language_pack_availability.json")).unwrap())
            .unwrap();
    let codes: Vec<&str> = manifest
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["de", "es"]);

    let mut z = zip::ZipArchive::new(File::open(packs.join("es_lang_pack.zip")).unwrap()).unwrap();
    assert!(z.by_name("LC_MESSAGES/django.mo").is_ok());
    assert!(z.by_name("es_metadata.json").is_ok());

    assert!(tmp.path().join("logs").exists());
}

#[test]
fn reads_paths_from_config_file() {
    let tmp = tempfile::tempdir().unwrap();
    write_catalog(tmp.path(), "fr", 2, 1);
    fs::write(
        tmp.path().join("langpack.toml"),
        "locale_root = \"locale\"\nlanguage_pack_root = \"out/packs\"\n",
    )
    .unwrap();

    bin_cmd(tmp.path()).assert().success();
    assert!(tmp.path().join("out").join("packs").join("fr_lang_pack.zip").exists());
}

#[test]
fn environment_overrides_pack_root() {
    let tmp = tempfile::tempdir().unwrap();
    write_catalog(tmp.path(), "it", 1, 1);

    bin_cmd(tmp.path())
        .env("LANGPACK_PACK_ROOT", tmp.path().join("env-packs"))
        .assert()
        .success();
    assert!(tmp.path().join("env-packs").join("it_lang_pack.zip").exists());
}

#[test]
fn failing_compile_command_exits_non_zero_without_archives() {
    let tmp = tempfile::tempdir().unwrap();
    write_catalog(tmp.path(), "es", 3, 1);
    fs::write(
        tmp.path().join("langpack.toml"),
        "[compile]\nbackend = \"command\"\ncommand = [\"definitely-not-a-real-compiler-binary\"]\n",
    )
    .unwrap();

    bin_cmd(tmp.path()).assert().failure();
    assert!(!tmp.path().join("language_packs").join("es_lang_pack.zip").exists());
}

#[test]
fn malformed_config_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("langpack.toml"), "locale_root = [").unwrap();

    bin_cmd(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("langpack.toml"));
}

#[test]
fn missing_catalog_dir_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("locale").join("pt")).unwrap();

    bin_cmd(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("LC_MESSAGES"));
}
