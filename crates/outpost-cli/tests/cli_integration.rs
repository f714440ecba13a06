//! CLI subprocess integration tests.
//!
//! These tests invoke the `outpost` binary against the local backend in a
//! temporary root and check exit codes, stdout, and JSON output.

use std::path::PathBuf;
use std::process::{Command, Output};

struct Sandbox {
    root: tempfile::TempDir,
    home: tempfile::TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
            home: tempfile::tempdir().unwrap(),
        }
    }

    fn settings_path(&self) -> PathBuf {
        self.home.path().join("settings.toml")
    }

    fn write_settings(&self, content: &str) {
        std::fs::write(self.settings_path(), content).unwrap();
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_outpost"))
            .env("HOME", self.home.path())
            .env("OUTPOST_SETTINGS", self.settings_path())
            .env_remove("OUTPOST_LOG")
            .arg("--root")
            .arg(self.root.path())
            .args(["--backend", "local"])
            .args(args)
            .output()
            .unwrap()
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let mut full = vec!["--json"];
        full.extend_from_slice(args);
        let output = self.run(&full);
        assert!(
            output.status.success(),
            "{args:?} must exit 0. stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
            panic!(
                "{args:?} must print JSON ({e}): {}",
                String::from_utf8_lossy(&output.stdout)
            )
        })
    }

    fn store_dir(&self) -> PathBuf {
        self.root.path().join("store")
    }
}

fn code(output: &Output) -> i32 {
    output.status.code().unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn cli_version_exits_zero() {
    let output = Command::new(env!("CARGO_BIN_EXE_outpost"))
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success(), "outpost --version must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("outpost"), "version output: {stdout}");
}

#[test]
fn cli_help_lists_commands() {
    let output = Command::new(env!("CARGO_BIN_EXE_outpost"))
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["init", "remove", "open-port", "close-port", "edit", "uninstall"] {
        assert!(stdout.contains(command), "help must list '{command}'");
    }
}

#[test]
fn cli_full_lifecycle_json() {
    let sandbox = Sandbox::new();

    let init = sandbox.json(&["init", "octo/hello"]);
    assert_eq!(init["env"], "octo/hello");
    assert_eq!(init["cluster"], "default");
    assert_eq!(init["created"], true);
    assert_eq!(init["instance_type"], "small");
    assert_eq!(init["ssh_port"], "2200");
    assert!(init["address"].as_str().unwrap().starts_with("127."));

    let again = sandbox.json(&["init", "octo/hello"]);
    assert_eq!(again["created"], false);
    assert_eq!(again["env_id"], init["env_id"]);

    let opened = sandbox.json(&["open-port", "octo/hello", "8080"]);
    assert_eq!(opened["port"], 8080);
    assert_eq!(opened["already_opened"], false);
    let reopened = sandbox.json(&["open-port", "octo/hello", "8080"]);
    assert_eq!(reopened["already_opened"], true);

    let listed = sandbox.json(&["list"]);
    let entries = listed.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["status"], "created");
    assert_eq!(entries[0]["opened_ports"], serde_json::json!([8080]));

    let edited = sandbox.json(&["edit", "octo/hello"]);
    assert_eq!(edited["env"]["id"], init["env_id"]);

    let closed = sandbox.json(&["close-port", "octo/hello", "8080"]);
    assert_eq!(closed["already_closed"], false);

    let refused = sandbox.run(&["uninstall"]);
    assert_eq!(code(&refused), 1);
    assert!(stderr(&refused).contains("remove them before uninstalling"));
    assert!(sandbox.store_dir().exists());

    let removed = sandbox.json(&["remove", "octo/hello", "--force"]);
    assert_eq!(removed["confirmed"], true);

    let uninstalled = sandbox.json(&["uninstall"]);
    assert_eq!(uninstalled["already_uninstalled"], false);
    assert!(!sandbox.store_dir().exists());

    let repeated = sandbox.json(&["uninstall"]);
    assert_eq!(repeated["already_uninstalled"], true);
}

#[test]
fn cli_json_output_never_contains_private_key() {
    let sandbox = Sandbox::new();
    sandbox.json(&["init", "octo/hello"]);
    sandbox.json(&["init", "octo/sibling"]);

    let commands: [&[&str]; 5] = [
        &["--json", "open-port", "octo/hello", "8080"],
        &["--json", "close-port", "octo/hello", "8080"],
        &["--json", "edit", "octo/hello"],
        &["--json", "list"],
        &["--json", "remove", "octo/hello", "--force"],
    ];
    for args in commands {
        let output = sandbox.run(args);
        assert!(output.status.success(), "{args:?}: {}", stderr(&output));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(!stdout.contains("PRIVATE KEY"), "{args:?} leaked key material");
        assert!(!stdout.contains("octo/sibling") || args[1] == "list");
    }

    let removed = sandbox.json(&["remove", "octo/sibling", "--force"]);
    assert_eq!(removed["env"]["name"], "octo/sibling");
    assert!(removed["env"].get("ssh_key_pair_pem_content").is_none());
    assert_eq!(removed["cluster"], "default");
}

#[test]
fn cli_human_output_mentions_environment() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["init", "octo/hello", "--instance-type", "medium"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("octo/hello"), "stdout: {stdout}");
    assert!(stdout.contains("ssh outpost@127."), "stdout: {stdout}");
}

#[test]
fn cli_invalid_port_exits_two() {
    let sandbox = Sandbox::new();
    for port in ["0", "65536", "http"] {
        let output = sandbox.run(&["open-port", "octo/hello", port]);
        assert_eq!(code(&output), 2, "port {port}: {}", stderr(&output));
        assert!(stderr(&output).contains("invalid port"));
    }
}

#[test]
fn cli_reserved_port_exits_two() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["close-port", "octo/hello", "2200"]);
    assert_eq!(code(&output), 2);
    assert!(stderr(&output).contains("reserved"));
}

#[test]
fn cli_settings_reserved_ports_replace_default() {
    let sandbox = Sandbox::new();
    sandbox.write_settings("reserved_ports = [\"9000\"]\n");
    sandbox.json(&["init", "octo/hello"]);

    let blocked = sandbox.run(&["open-port", "octo/hello", "9000"]);
    assert_eq!(code(&blocked), 2);

    let opened = sandbox.json(&["open-port", "octo/hello", "2200"]);
    assert_eq!(opened["already_opened"], false);
}

#[test]
fn cli_invalid_instance_type_exits_two() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["init", "octo/hello", "--instance-type", "huge"]);
    assert_eq!(code(&output), 2, "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("huge"));
}

#[test]
fn cli_bare_name_requires_default_owner() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["init", "hello"]);
    assert_eq!(code(&output), 2);
    assert!(stderr(&output).contains("default_owner"));

    sandbox.write_settings("default_owner = \"octo\"\n");
    let init = sandbox.json(&["init", "hello"]);
    assert_eq!(init["env"], "octo/hello");
}

#[test]
fn cli_malformed_settings_exit_two() {
    let sandbox = Sandbox::new();
    sandbox.write_settings("backend = \n");
    let output = sandbox.run(&["list"]);
    assert_eq!(code(&output), 2);
    assert!(stderr(&output).contains("settings error"));
}

#[test]
fn cli_edit_when_not_installed_fails() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["edit", "octo/hello"]);
    assert_eq!(code(&output), 1);
    assert!(stderr(&output).contains("not installed"));
}

#[test]
fn cli_edit_unknown_environment_fails() {
    let sandbox = Sandbox::new();
    sandbox.json(&["init", "octo/hello"]);
    let output = sandbox.run(&["edit", "octo/other"]);
    assert_eq!(code(&output), 1);
    assert!(stderr(&output).contains("does not exist"));
}

#[test]
fn cli_remove_without_terminal_requires_force() {
    let sandbox = Sandbox::new();
    sandbox.json(&["init", "octo/hello"]);

    let output = sandbox.run(&["remove", "octo/hello"]);
    assert_eq!(code(&output), 1);
    assert!(stderr(&output).contains("--force"));

    let listed = sandbox.json(&["list"]);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[test]
fn cli_list_when_not_installed() {
    let sandbox = Sandbox::new();
    let listed = sandbox.json(&["list"]);
    assert_eq!(listed, serde_json::json!([]));

    let output = sandbox.run(&["list"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("not installed"));
}

#[test]
fn cli_separate_clusters_are_independent() {
    let sandbox = Sandbox::new();
    sandbox.json(&["init", "octo/hello"]);
    let staging = sandbox.json(&["--cluster", "staging", "init", "octo/hello"]);
    assert_eq!(staging["cluster"], "staging");
    assert_eq!(staging["created"], true);

    let listed = sandbox.json(&["list"]);
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[test]
fn cli_completions_bash() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("outpost"));
}
