//  ██████╗██╗     ██╗
// ██╔════╝██║     ██║
// ██║     ██║     ██║
// ██║     ██║     ██║
// ╚██████╗███████╗██║
//  ╚═════╝╚══════╝╚═╝

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::{json, Value};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{write_fixture, PAGE_HTML, SCENARIO_JSON};

/// The binary, isolated from the user's configuration and saved state
fn textpatch(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("TEXTPATCH_STATE_DIR", dir.join("state"))
        .env("NO_COLOR", "1")
        .env_remove("TEXTPATCH_CONFIG")
        .env_remove("TEXTPATCH_PROVIDER")
        .env_remove("TEXTPATCH_AI_KEY");
    cmd
}

#[cfg(test)]
mod passing {
    use super::*;

    #[test]
    fn extract_prints_strings_export() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "scenario.json", SCENARIO_JSON);

        let out = textpatch(dir.path())
            .args(["extract", "scenario.json"])
            .output()
            .unwrap();

        assert!(out.status.success());
        let rows: Value = serde_json::from_slice(&out.stdout).unwrap();
        assert_eq!(rows[0]["original"], "Hello");
        assert_eq!(rows[1]["jsonPath"], json!(["b", 0]));
        assert_eq!(rows[1]["type"], "json");
    }

    #[test]
    fn apply_strings_writes_translated_document() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "scenario.json", SCENARIO_JSON);
        write_fixture(
            dir.path(),
            "edits.json",
            r#"[{"original":"World","translated":"Mundo","type":"json","index":1,"jsonPath":["b",0]}]"#,
        );

        textpatch(dir.path())
            .args(["apply", "scenario.json", "--strings", "edits.json"])
            .assert()
            .success();

        let written = fs::read_to_string(dir.path().join("scenario-traduzido.json")).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&written).unwrap(),
            json!({"a": "Hello", "b": ["Mundo"]})
        );
    }

    #[test]
    fn saved_dictionary_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "page.html", "<p>Ok, done</p><p>okay</p>");

        textpatch(dir.path())
            .args(["dict", "add", "ok", "certo"])
            .assert()
            .success();
        assert!(dir.path().join("state").join("userDictionary.json").exists());

        let out = textpatch(dir.path()).args(["dict", "list"]).output().unwrap();
        assert_eq!(String::from_utf8_lossy(&out.stdout), "ok\tcerto\n");

        textpatch(dir.path())
            .args(["apply", "page.html", "--saved-dictionary", "-o", "out.html"])
            .assert()
            .success();
        let written = fs::read_to_string(dir.path().join("out.html")).unwrap();
        assert!(written.contains("<p>Certo, done</p><p>okay</p>"));

        textpatch(dir.path())
            .args(["dict", "export", "-o", "dicionario.json"])
            .assert()
            .success();
        let exported: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("dicionario.json")).unwrap())
                .unwrap();
        assert_eq!(exported[0]["translated"], "certo");

        textpatch(dir.path()).args(["dict", "clear"]).assert().success();
        let out = textpatch(dir.path()).args(["dict", "list"]).output().unwrap();
        assert!(out.stdout.is_empty());
    }

    #[test]
    fn dict_import_accepts_legacy_map() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "legacy.json", r#"{"Hello": "Olá"}"#);

        textpatch(dir.path())
            .args(["dict", "import", "legacy.json"])
            .assert()
            .success();

        let out = textpatch(dir.path()).args(["dict", "list"]).output().unwrap();
        assert_eq!(String::from_utf8_lossy(&out.stdout), "Hello\tOlá\n");
    }

    #[test]
    fn sanitize_strips_active_content() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(
            dir.path(),
            "dirty.html",
            "<p onclick=\"x()\">Hi</p><script>alert(1)</script><iframe src=\"y\"></iframe>",
        );

        let out = textpatch(dir.path())
            .args(["sanitize", "dirty.html"])
            .output()
            .unwrap();

        assert!(out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout), "<p>Hi</p>\n");
    }

    #[test]
    fn preview_page_mode_is_sandboxed() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "page.html", PAGE_HTML);

        textpatch(dir.path())
            .args(["preview", "page.html", "--mode", "page", "-o", "preview.html"])
            .assert()
            .success();

        let written = fs::read_to_string(dir.path().join("preview.html")).unwrap();
        assert!(written.contains("sandbox=\"\""));
        assert!(!written.to_lowercase().contains("onclick"));
    }

    #[test]
    fn translate_keeps_originals_when_every_engine_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "scenario.json", SCENARIO_JSON);
        write_fixture(
            dir.path(),
            "textpatch.toml",
            "provider = \"google\"\n\
             google_url = \"http://127.0.0.1:9/translate\"\n\
             mymemory_url = \"http://127.0.0.1:9/get\"\n\
             timeout_secs = 2\n",
        );

        textpatch(dir.path())
            .args([
                "translate",
                "scenario.json",
                "--to",
                "pt",
                "--log-out",
                "log.json",
                "-o",
                "out.json",
            ])
            .assert()
            .success();

        let written = fs::read_to_string(dir.path().join("out.json")).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&written).unwrap(),
            serde_json::from_str::<Value>(SCENARIO_JSON).unwrap()
        );
        let log = fs::read_to_string(dir.path().join("log.json")).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&log).unwrap(), json!({}));
    }

    #[test]
    fn prefs_are_saved_in_slots() {
        let dir = tempfile::tempdir().unwrap();

        textpatch(dir.path())
            .args(["prefs", "set", "--provider", "mymemory", "--model", "gpt-4o-mini"])
            .assert()
            .success();

        let out = textpatch(dir.path()).args(["prefs", "show"]).output().unwrap();
        let shown = String::from_utf8_lossy(&out.stdout).to_string();
        assert!(shown.contains("provider\tmymemory"));
        assert!(shown.contains("model\tgpt-4o-mini"));
        assert!(shown.contains("key\tunset"));
        assert!(dir.path().join("state").join("translationProvider.json").exists());
    }

    #[test]
    fn config_init_then_show() {
        let dir = tempfile::tempdir().unwrap();

        textpatch(dir.path()).args(["config", "init"]).assert().success();
        assert!(dir.path().join("textpatch.toml").exists());

        let out = textpatch(dir.path())
            .args(["config", "show"])
            .env("TEXTPATCH_AI_KEY", "sk-secret")
            .output()
            .unwrap();
        let shown = String::from_utf8_lossy(&out.stdout).to_string();
        assert!(out.status.success());
        assert!(shown.contains("target_lang = \"pt\""));
        assert!(shown.contains("<redacted>"));
        assert!(!shown.contains("sk-secret"));
    }

    #[test]
    fn config_env_lists_variables() {
        let dir = tempfile::tempdir().unwrap();

        let out = textpatch(dir.path()).args(["config", "env"]).output().unwrap();
        assert!(String::from_utf8_lossy(&out.stdout).contains("TEXTPATCH_LOG_LEVEL"));
    }
}

#[cfg(test)]
mod failing {
    use super::*;

    #[test]
    fn unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "notes.txt", "hello");

        textpatch(dir.path())
            .args(["extract", "notes.txt"])
            .assert()
            .code(65);
    }

    #[test]
    fn malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "broken.json", "{\"a\": ");

        let out = textpatch(dir.path())
            .args(["apply", "broken.json"])
            .output()
            .unwrap();

        assert_eq!(out.status.code(), Some(65));
        assert!(String::from_utf8_lossy(&out.stderr).contains("failed to parse JSON document"));
        assert!(!dir.path().join("broken-traduzido.json").exists());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();

        textpatch(dir.path())
            .args(["apply", "absent.html"])
            .assert()
            .code(74);
    }

    #[test]
    fn config_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "textpatch.toml", "target_lang = \"de\"\n");

        textpatch(dir.path()).args(["config", "init"]).assert().code(78);
        let kept = fs::read_to_string(dir.path().join("textpatch.toml")).unwrap();
        assert_eq!(kept, "target_lang = \"de\"\n");
    }

    #[test]
    fn unknown_preview_mode() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "page.html", PAGE_HTML);

        textpatch(dir.path())
            .args(["preview", "page.html", "--mode", "split"])
            .assert()
            .code(2);
    }
}
