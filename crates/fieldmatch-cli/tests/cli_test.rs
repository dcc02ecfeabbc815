//! CLI integration tests for the fieldmatch binary.

use assert_cmd::Command;
use mockito::{Matcher, Server};
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const SCHEMA: &str = r#"{"name": "", "age": 0}"#;
const TEXT: &str = "John Smith is 30 years old";

/// Binary isolated from the user's config files and keys
fn cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fieldmatch"));
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"));
    for var in [
        "FIELDMATCH_API_KEY",
        "FIELDMATCH_PROVIDER",
        "FIELDMATCH_MODEL",
        "FIELDMATCH_CONFIG",
        "FIELDMATCH_LOG_FORMAT",
        "FIELDMATCH_LOG_FILE",
        "OPENAI_API_KEY",
        "ANTHROPIC_API_KEY",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn openai_completion(content: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

fn analysis_answer() -> String {
    json!({
        "matches": [
            {
                "property": "name",
                "matchedText": "John Smith",
                "position": {"start": 0, "end": 10},
                "confidence": 95,
                "matchType": "exact"
            },
            {
                "property": "age",
                "matchedText": "30",
                "position": {"start": 14, "end": 16},
                "confidence": 90,
                "matchType": "exact"
            },
            {
                "property": "name",
                "matchedText": "years",
                "position": {"start": 17, "end": 22},
                "confidence": 10,
                "matchType": "partial"
            }
        ]
    })
    .to_string()
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

mod validate_command {
    use super::*;

    #[test]
    fn valid_document_is_pretty_printed() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", r#"{"name":"John","tags":[1,2]}"#);

        cmd(&dir)
            .args(["validate", doc.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("✓ Valid JSON"))
            .stdout(predicate::str::contains("{\n  \"name\": \"John\",\n  \"tags\": [\n    1,\n    2\n  ]\n}"));
    }

    #[test]
    fn compact_from_stdin() {
        let dir = TempDir::new().unwrap();

        cmd(&dir)
            .args(["--quiet", "validate", "-", "--compact"])
            .write_stdin("{\n  \"a\": 1\n}")
            .assert()
            .success()
            .stdout("{\"a\":1}\n");
    }

    #[test]
    fn json_output_reports_both_projections() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", r#"{ "a" : 1 }"#);

        let output = cmd(&dir)
            .args(["validate", doc.to_str().unwrap(), "-o", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let report = stdout_json(&output);
        assert_eq!(report["isValid"], true);
        assert_eq!(report["raw"], r#"{"a":1}"#);
        assert_eq!(report["formatted"], "{\n  \"a\": 1\n}");
    }

    #[test]
    fn invalid_document_fails() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", r#"{"name": "John",}"#);

        cmd(&dir)
            .args(["validate", doc.to_str().unwrap()])
            .assert()
            .code(4)
            .stderr(predicate::str::contains("Invalid JSON in"));
    }

    #[test]
    fn missing_file_fails() {
        let dir = TempDir::new().unwrap();

        cmd(&dir)
            .args(["validate", "nope.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("File not found"));
    }

    #[test]
    fn against_detects_type_change() {
        let dir = TempDir::new().unwrap();
        let original = write_temp_file(&dir, "original.json", SCHEMA);
        let updated = write_temp_file(&dir, "updated.json", r#"{"name":"John","age":"30"}"#);

        cmd(&dir)
            .args([
                "validate",
                updated.to_str().unwrap(),
                "--against",
                original.to_str().unwrap(),
            ])
            .assert()
            .code(8)
            .stderr(predicate::str::contains("Type mismatch at age"));
    }

    #[test]
    fn against_accepts_added_keys() {
        let dir = TempDir::new().unwrap();
        let original = write_temp_file(&dir, "original.json", SCHEMA);
        let updated = write_temp_file(
            &dir,
            "updated.json",
            r#"{"name":"John","age":30,"email":"j@example.com"}"#,
        );

        cmd(&dir)
            .args([
                "validate",
                updated.to_str().unwrap(),
                "--against",
                original.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("✓ Structure matches"));
    }
}

mod models_command {
    use super::*;

    #[test]
    fn lists_both_providers() {
        let dir = TempDir::new().unwrap();

        cmd(&dir)
            .arg("models")
            .assert()
            .success()
            .stdout(predicate::str::contains("gpt-4o-mini"))
            .stdout(predicate::str::contains("claude-3-5-sonnet-latest"))
            .stdout(predicate::str::contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn filters_by_provider() {
        let dir = TempDir::new().unwrap();

        let output = cmd(&dir)
            .args(["models", "--provider", "anthropic", "-o", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let catalog = stdout_json(&output);
        let entries = catalog.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["provider"], "anthropic");
        assert_eq!(entries[0]["apiKeyEnv"], "ANTHROPIC_API_KEY");
        assert!(entries[0]["models"]
            .as_array()
            .unwrap()
            .contains(&json!("claude-2.1")));
    }

    #[test]
    fn unknown_provider_fails() {
        let dir = TempDir::new().unwrap();

        cmd(&dir)
            .args(["models", "--provider", "gemini"])
            .assert()
            .code(7)
            .stderr(predicate::str::contains("Provider 'gemini' not found"));
    }
}

mod config_command {
    use super::*;

    #[test]
    fn init_writes_template_once() {
        let dir = TempDir::new().unwrap();

        cmd(&dir).args(["config", "init"]).assert().success();
        let written = fs::read_to_string(dir.path().join(".fieldmatch.yaml")).unwrap();
        assert!(written.contains("default_provider: openai"));
        assert!(written.contains("claude-3-5-sonnet-latest"));

        cmd(&dir)
            .args(["config", "init"])
            .assert()
            .code(5)
            .stderr(predicate::str::contains("--force"));

        cmd(&dir).args(["config", "init", "--force"]).assert().success();
    }

    #[test]
    fn show_redacts_api_keys() {
        let dir = TempDir::new().unwrap();
        write_temp_file(
            &dir,
            ".fieldmatch.yaml",
            "providers:\n  openai:\n    api_key: sk-secret-1234567890\n",
        );

        cmd(&dir)
            .args(["config", "show", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("sk-***"))
            .stdout(predicate::str::contains("1234567890").not());
    }

    #[test]
    fn explicit_missing_config_fails() {
        let dir = TempDir::new().unwrap();

        cmd(&dir)
            .args(["--config", "missing.yaml", "models"])
            .assert()
            .code(3);
    }
}

mod provider_commands {
    use super::*;

    fn inputs(dir: &TempDir) -> (PathBuf, PathBuf) {
        (
            write_temp_file(dir, "schema.json", SCHEMA),
            write_temp_file(dir, "text.txt", TEXT),
        )
    }

    #[test]
    fn analyze_without_key_fails() {
        let dir = TempDir::new().unwrap();
        let (schema, text) = inputs(&dir);

        cmd(&dir)
            .args([
                "analyze",
                "-s",
                schema.to_str().unwrap(),
                "-t",
                text.to_str().unwrap(),
            ])
            .assert()
            .code(9)
            .stderr(predicate::str::contains("OPENAI_API_KEY"));
    }

    #[test]
    fn two_stdin_inputs_are_rejected() {
        let dir = TempDir::new().unwrap();

        cmd(&dir)
            .args(["analyze", "-s", "-", "-t", "-", "--api-key", "sk-test"])
            .assert()
            .code(6);
    }

    #[test]
    fn analyze_hides_low_confidence_matches() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_body(openai_completion(&analysis_answer()))
            .expect(2)
            .create();

        let dir = TempDir::new().unwrap();
        let (schema, text) = inputs(&dir);
        let base = [
            "analyze",
            "-s",
            schema.to_str().unwrap(),
            "-t",
            text.to_str().unwrap(),
            "--api-key",
            "sk-test",
            "--base-url",
        ];

        let output = cmd(&dir)
            .args(base)
            .args([server.url().as_str(), "-o", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let matches = stdout_json(&output);
        let matches = matches.as_array().unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0]["property"], "name");
        assert_eq!(matches[0]["confidence"], 95);

        let output = cmd(&dir)
            .args(base)
            .args([server.url().as_str(), "-o", "json", "--all"])
            .output()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(stdout_json(&output).as_array().unwrap().len(), 3);

        mock.assert();
    }

    #[test]
    fn apply_writes_matches_into_document() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::Regex("Text to Analyze".to_string()))
            .with_status(200)
            .with_body(openai_completion(&analysis_answer()))
            .expect(1)
            .create();

        let dir = TempDir::new().unwrap();
        let (schema, text) = inputs(&dir);
        let saved = dir.path().join("out").join("person.json");

        let output = cmd(&dir)
            .args([
                "apply",
                "-s",
                schema.to_str().unwrap(),
                "-t",
                text.to_str().unwrap(),
                "--api-key",
                "sk-test",
                "--base-url",
                server.url().as_str(),
                "--save-to",
                saved.to_str().unwrap(),
                "-o",
                "json",
            ])
            .output()
            .unwrap();
        assert!(output.status.success());

        let result = stdout_json(&output);
        assert_eq!(result["strategy"], "deterministic");
        assert_eq!(result["document"], json!({"name": "John Smith", "age": 30}));
        assert_eq!(result["matches"].as_array().unwrap().len(), 2);

        assert_eq!(
            fs::read_to_string(&saved).unwrap(),
            "{\n  \"name\": \"John Smith\",\n  \"age\": 30\n}\n"
        );
        mock.assert();
    }

    #[test]
    fn apply_delegated_rejects_reshaped_rewrite() {
        let mut server = Server::new();
        let analysis = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::Regex("Text to Analyze".to_string()))
            .with_status(200)
            .with_body(openai_completion(&analysis_answer()))
            .create();
        let update = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::Regex("You update JSON documents".to_string()))
            .with_status(200)
            .with_body(openai_completion(r#"{"name":"John Smith","age":"thirty"}"#))
            .expect(1)
            .create();

        let dir = TempDir::new().unwrap();
        let (schema, text) = inputs(&dir);

        let output = cmd(&dir)
            .args([
                "apply",
                "-s",
                schema.to_str().unwrap(),
                "-t",
                text.to_str().unwrap(),
                "--strategy",
                "delegated",
                "--api-key",
                "sk-test",
                "--base-url",
                server.url().as_str(),
                "-o",
                "json",
            ])
            .output()
            .unwrap();
        assert!(output.status.success());

        // The rewrite changed a type, so the original comes back
        let result = stdout_json(&output);
        assert_eq!(result["strategy"], "delegated");
        assert_eq!(result["document"], json!({"name": "", "age": 0}));

        analysis.assert();
        update.assert();
    }

    #[test]
    fn enhance_keeps_populated_fields() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::Regex("Enhance this JSON".to_string()))
            .with_status(200)
            .with_body(openai_completion(
                r#"{"name":"Jane Doe","email":"john.smith@example.com"}"#,
            ))
            .expect(1)
            .create();

        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "person.json", r#"{"name":"John Smith","email":""}"#);

        let output = cmd(&dir)
            .args([
                "enhance",
                "-j",
                doc.to_str().unwrap(),
                "--api-key",
                "sk-test",
                "--base-url",
                server.url().as_str(),
                "-o",
                "json",
            ])
            .output()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(
            stdout_json(&output),
            json!({"name": "John Smith", "email": "john.smith@example.com"})
        );
        mock.assert();
    }

    #[test]
    fn authentication_failure_shows_hint() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body(
                json!({
                    "error": {
                        "message": "Incorrect API key provided",
                        "type": "invalid_request_error",
                        "code": "invalid_api_key"
                    }
                })
                .to_string(),
            )
            .create();

        let dir = TempDir::new().unwrap();
        let (schema, text) = inputs(&dir);

        cmd(&dir)
            .args([
                "analyze",
                "-s",
                schema.to_str().unwrap(),
                "-t",
                text.to_str().unwrap(),
                "--api-key",
                "sk-wrong",
                "--base-url",
                server.url().as_str(),
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Incorrect API key provided"))
            .stderr(predicate::str::contains("hint: check the API key"));
        mock.assert();
    }
}

#[test]
fn completions_are_generated() {
    let dir = TempDir::new().unwrap();

    cmd(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fieldmatch"));
}
