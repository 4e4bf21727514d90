//! Integration tests for websessions

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use chrono::{Duration, Utc};
    use predicates::prelude::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;
    use websessions::{AccountId, SessionVal};

    /// Temp workspace with an isolated config file and session directory
    struct Workspace {
        temp: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            std::fs::create_dir(temp.path().join("sessions")).unwrap();
            Self { temp }
        }

        fn sessions(&self) -> PathBuf {
            self.temp.path().join("sessions")
        }

        fn config(&self) -> PathBuf {
            self.temp.path().join("config.toml")
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("websessions");
            cmd.arg("--config")
                .arg(self.config())
                .arg("--dir")
                .arg(self.sessions());
            cmd
        }

        fn write_session(&self, key: &str, account: i32, ttl: Duration) {
            let val = SessionVal::new(AccountId(account), Utc::now(), ttl);
            std::fs::write(self.sessions().join(key), serde_json::to_vec(&val).unwrap()).unwrap();
        }

        fn keys(&self) -> Vec<String> {
            let mut keys: Vec<String> = std::fs::read_dir(self.sessions())
                .unwrap()
                .map(|e| e.unwrap().file_name().into_string().unwrap())
                .collect();
            keys.sort();
            keys
        }
    }

    fn exists(dir: &Path, key: &str) -> bool {
        dir.join(key).exists()
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("websessions")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Flat-file web session cache"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("websessions")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("websessions"));
    }

    #[test]
    fn status_on_empty_directory() {
        let ws = Workspace::new();
        ws.cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Entries:   0"))
            .stdout(predicate::str::contains("absolute"));
    }

    #[test]
    fn list_empty() {
        let ws = Workspace::new();
        ws.cmd()
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No sessions"));
    }

    #[test]
    fn list_json_includes_keys() {
        let ws = Workspace::new();
        ws.write_session("tok-A", 1000, Duration::hours(1));

        let output = ws.cmd().args(["list", "--format", "json"]).output().unwrap();
        assert!(output.status.success());

        let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(listed[0]["key"], "tok-A");
        assert_eq!(listed[0]["account_id"], 1000);
    }

    #[test]
    fn sweep_removes_only_expired() {
        let ws = Workspace::new();
        ws.write_session("expired", 1, Duration::hours(-1));
        ws.write_session("live", 2, Duration::hours(1));

        let output = ws.cmd().args(["sweep", "--format", "json"]).output().unwrap();
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["scanned"], 2);
        assert_eq!(report["removed"], 1);
        assert_eq!(ws.keys(), vec!["live".to_string()]);
    }

    #[test]
    fn log_out_account() {
        let ws = Workspace::new();
        ws.write_session("a1", 1, Duration::hours(1));
        ws.write_session("a2", 1, Duration::hours(1));
        ws.write_session("b1", 2, Duration::hours(1));

        ws.cmd()
            .args(["log-out", "--account", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("2 session(s) cleared"));

        assert!(!exists(&ws.sessions(), "a1"));
        assert!(!exists(&ws.sessions(), "a2"));
        assert!(exists(&ws.sessions(), "b1"));
    }

    #[test]
    fn log_out_all() {
        let ws = Workspace::new();
        ws.write_session("a1", 1, Duration::hours(1));
        ws.write_session("b1", 2, Duration::hours(1));

        ws.cmd().args(["log-out", "--all"]).assert().success();

        assert!(ws.keys().is_empty());
    }

    #[test]
    fn log_out_requires_target() {
        let ws = Workspace::new();
        ws.cmd().arg("log-out").assert().failure();
    }

    #[test]
    fn config_path() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cleanup]"));
    }

    #[test]
    fn invalid_config_fails_with_hint() {
        let ws = Workspace::new();
        std::fs::write(ws.config(), "[expiry]\npolicy = \"lru\"\n").unwrap();

        ws.cmd()
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("Hint:"));
    }
}
