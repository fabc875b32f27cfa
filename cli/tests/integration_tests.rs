use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};
use tempfile::TempDir;

fn manual_tool(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_manual-tool"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run manual-tool")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// One module file with a simple command, a parent command and a broken one.
fn write_manuals(dir: &Path) -> PathBuf {
    let declarations = json!([
        {
            "name": "roll",
            "syntax": "::<prefix>roll:: $1{opt $2}[ TIMES $2]",
            "arguments": [
                {"name": "sides", "id": "sides", "optional": false, "base_type": "INTEGER",
                 "further_constraint": {"type": "integer", "min": 2, "max": 100}},
                {"name": "times", "id": "times", "optional": true,
                 "further_constraint": {"type": "integer", "min": 1, "max": 10}}
            ],
            "description": "Rolls a die."
        },
        {
            "name": "proof",
            "description": "Trickjump proof.",
            "subcommands": [
                {
                    "name": "get",
                    "syntax": "::<prefix>proof get:: NAME $1",
                    "arguments": [{"name": "jump name", "id": "name", "optional": false}],
                    "description": "Links proof of a jump."
                },
                {
                    "name": "clear",
                    "syntax": "::<prefix>proof clear::",
                    "arguments": [],
                    "description": "Removes your proof."
                }
            ]
        },
        {
            "name": "broken",
            "syntax": "<prefix>broken {opt $1}[",
            "arguments": [{"name": "x", "id": "x", "optional": true}],
            "description": "Never loads."
        }
    ]);
    let path = dir.join("games.json");
    fs::write(&path, serde_json::to_string_pretty(&declarations).unwrap()).unwrap();
    path
}

fn write_config(dir: &Path) -> PathBuf {
    let yaml = format!(
        "global_prefix: \"%\"\nbot_name: Tester\ndatabase:\n  path: {}\n  table_prefix: test_\n  pool_size: 1\n",
        dir.join("bot.db").display()
    );
    let path = dir.join("bot.yml");
    fs::write(&path, yaml).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Lint
// ---------------------------------------------------------------------------

#[test]
fn lint_reports_rejected_declarations() {
    let dir = TempDir::new().unwrap();
    let manuals = write_manuals(dir.path());

    let output = manual_tool(&["lint", "--manuals", manuals.to_str().unwrap()]);
    assert!(!output.status.success());

    let out = stdout(&output);
    assert!(out.contains("ok        roll (module games)"), "{out}");
    assert!(out.contains("ok        proof (module games)"), "{out}");
    assert!(out.contains("rejected  "), "{out}");
    assert!(out.contains("(broken)"), "{out}");
    assert!(out.contains("2 accepted, 1 rejected"), "{out}");
    assert!(stderr(&output).contains("error: 1 declaration(s) rejected"));
}

#[test]
fn lint_without_sources_fails() {
    let output = manual_tool(&["lint"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no manual sources"));
}

// ---------------------------------------------------------------------------
// Render / expand
// ---------------------------------------------------------------------------

#[test]
fn render_one_command_with_custom_prefix() {
    let dir = TempDir::new().unwrap();
    let manuals = write_manuals(dir.path());

    let output = manual_tool(&[
        "render",
        "--manuals",
        manuals.to_str().unwrap(),
        "--command",
        "proof",
        "--prefix",
        "!",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));

    let out = stdout(&output);
    assert!(out.starts_with("proof <get/clear>\n"), "{out}");
    assert!(out.contains("!proof get NAME <jump name>"), "{out}");
    assert!(out.contains("!proof clear"), "{out}");
}

#[test]
fn expand_lists_optional_combinations() {
    let dir = TempDir::new().unwrap();
    let manuals = write_manuals(dir.path());

    let output = manual_tool(&["expand", "--manuals", manuals.to_str().unwrap(), "roll"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "%roll <sides>\n%roll <sides> TIMES <times>\n");
}

#[test]
fn expand_unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    let manuals = write_manuals(dir.path());

    let output = manual_tool(&[
        "expand",
        "--manuals",
        manuals.to_str().unwrap(),
        "proof",
        "--subcommand",
        "set",
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("'proof' has no subcommand 'set'"));
}

// ---------------------------------------------------------------------------
// Match / check
// ---------------------------------------------------------------------------

#[test]
fn match_prints_subcommand_and_raw_arguments() {
    let dir = TempDir::new().unwrap();
    let manuals = write_manuals(dir.path());

    let output = manual_tool(&[
        "match",
        "--manuals",
        manuals.to_str().unwrap(),
        "%proof get NAME Moon Jump",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["command"], "proof");
    assert_eq!(value["subcommand"], "get");
    assert_eq!(value["tag"], "%proof get");
    assert_eq!(value["arguments"]["name"], "Moon Jump");
}

#[test]
fn match_reports_attempted_subcommand() {
    let dir = TempDir::new().unwrap();
    let manuals = write_manuals(dir.path());

    let output = manual_tool(&["match", "--manuals", manuals.to_str().unwrap(), "%proof get"]);
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("did not match the syntax of subcommand get of proof"),
        "{}",
        stderr(&output)
    );
}

#[test]
fn check_validates_constraints() {
    let dir = TempDir::new().unwrap();
    let manuals = write_manuals(dir.path());
    let source = manuals.to_str().unwrap();

    let output = manual_tool(&["check", "--manuals", source, "%roll 20 TIMES 3"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["command"], "roll");
    assert_eq!(value["subcommand"], Value::Null);

    let output = manual_tool(&["check", "--manuals", source, "%roll 1000"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("did not have the proper arguments"));
}

#[test]
fn message_for_no_command_fails() {
    let dir = TempDir::new().unwrap();
    let manuals = write_manuals(dir.path());

    let output = manual_tool(&["match", "--manuals", manuals.to_str().unwrap(), "hello there"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("does not call any command"));
}

// ---------------------------------------------------------------------------
// Slash
// ---------------------------------------------------------------------------

#[test]
fn slash_prints_registration_data() {
    let dir = TempDir::new().unwrap();
    let manuals = write_manuals(dir.path());

    let output = manual_tool(&["slash", "--manuals", manuals.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    let commands = value.as_array().unwrap();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0]["name"], "roll");
    assert_eq!(commands[0]["options"][0]["type"], "INTEGER");
    assert_eq!(commands[1]["options"][0]["type"], "SUB_COMMAND");
}

// ---------------------------------------------------------------------------
// Prefix administration
// ---------------------------------------------------------------------------

#[test]
fn prefix_set_get_clear_roundtrip() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    let config = config.to_str().unwrap();

    let output = manual_tool(&["--config", config, "prefix", "get", "--guild", "42"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "% (global)\n");

    let output = manual_tool(&["--config", config, "prefix", "set", "--guild", "42", "!!"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = manual_tool(&["--config", config, "prefix", "get", "--guild", "42"]);
    assert_eq!(stdout(&output), "!!\n");

    let output = manual_tool(&["--config", config, "prefix", "list"]);
    assert_eq!(stdout(&output), "42\t!!\n");

    let output = manual_tool(&["--config", config, "prefix", "clear", "--guild", "42"]);
    assert_eq!(stdout(&output), "Prefix for guild 42 cleared.\n");
    let output = manual_tool(&["--config", config, "prefix", "clear", "--guild", "42"]);
    assert_eq!(stdout(&output), "Guild 42 had no local prefix.\n");
}

#[test]
fn prefix_set_rejects_global_and_whitespace() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    let config = config.to_str().unwrap();

    let output = manual_tool(&["--config", config, "prefix", "set", "--guild", "1", "%"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("already the global prefix"));

    let output = manual_tool(&["--config", config, "prefix", "set", "--guild", "1", "a b"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid prefix"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yml");
    fs::write(&path, "global_prefix: \"a b\"\n").unwrap();

    let output = manual_tool(&["--config", path.to_str().unwrap(), "prefix", "list"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid config"));
}
