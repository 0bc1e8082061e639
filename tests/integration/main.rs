//! Integration tests for deltagen

use std::path::Path;

/// Write a config file pointing every state directory into `root`
fn write_config(root: &Path) -> std::path::PathBuf {
    let config_path = root.join("config.toml");
    let content = format!(
        r#"
[tools]
dir = "{root}/tools"

[cache]
root = "{root}/cache"

[build]
workspace_root = "{root}/work"
keep_failed_workspaces = false
"#,
        root = root.display()
    );
    std::fs::write(&config_path, content).unwrap();
    config_path
}

/// Install stub tools: unpack drops a marker, diff is caller-provided
fn install_stub_tools(tools_dir: &Path, diff_body: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::create_dir_all(tools_dir).unwrap();
    let scripts = [
        ("mar", "exit 0"),
        ("mbsdiff", "exit 0"),
        ("unwrap_full_update.pl", "touch unpacked.marker"),
        ("make_incremental_update.sh", diff_body),
    ];
    for (name, body) in scripts {
        let path = tools_dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}

/// Seed a complete artifact directly into the on-disk cache layout
fn seed_complete(cache_root: &Path, key: &str, contents: &[u8]) {
    let dir = cache_root.join("complete");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(key), contents).unwrap();
}

mod cli_tests {
    use super::write_config;
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn deltagen(config: &std::path::Path) -> Command {
        let mut cmd = cargo_bin_cmd!("deltagen");
        cmd.env("DELTAGEN_CONFIG", config);
        cmd
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("deltagen")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Partial update artifact builder"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("deltagen")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("deltagen"));
    }

    #[test]
    fn cache_list_empty() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path());

        deltagen(&config)
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache entries found"));
    }

    #[test]
    fn config_path_prints_path() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path());

        deltagen(&config)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_prints_sections() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path());

        deltagen(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[build]"));
    }

    #[test]
    fn status_reports_missing_tools() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path());

        deltagen(&config)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("missing"));
    }

    #[test]
    fn build_without_tools_fails_with_hint() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path());

        deltagen(&config)
            .args([
                "build",
                "--old-location", "h-old",
                "--old-hash", "h-old",
                "--new-location", "h-new",
                "--new-hash", "h-new",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Tool not found"));
    }
}

mod pipeline_tests {
    use super::{install_stub_tools, seed_complete, write_config};
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn deltagen(config: &std::path::Path) -> Command {
        let mut cmd = cargo_bin_cmd!("deltagen");
        cmd.env("DELTAGEN_CONFIG", config);
        cmd
    }

    /// Full pipeline: seeded complete artifacts, stub tools producing a
    /// fixed 10-byte diff, result retrievable from the cache afterwards
    #[test]
    fn build_produces_cached_partial() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path());
        install_stub_tools(
            &dir.path().join("tools"),
            r#"printf '0123456789' > "$1""#,
        );
        seed_complete(&dir.path().join("cache"), "h-old", b"old artifact");
        seed_complete(&dir.path().join("cache"), "h-new", b"new artifact");

        deltagen(&config)
            .args([
                "build",
                "--old-location", "h-old",
                "--old-hash", "h-old",
                "--new-location", "h-new",
                "--new-hash", "h-new",
                "--identifier", "rel-42",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("rel-42"));

        // The exact diff bytes landed in the cache
        let partial = dir.path().join("cache").join("partial").join("rel-42");
        assert_eq!(std::fs::read(&partial).unwrap(), b"0123456789");

        deltagen(&config)
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("rel-42"));
    }

    #[test]
    fn failing_diff_reports_error_and_clears_entry() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path());
        install_stub_tools(&dir.path().join("tools"), "exit 1");
        seed_complete(&dir.path().join("cache"), "h-old", b"old artifact");
        seed_complete(&dir.path().join("cache"), "h-new", b"new artifact");

        // A previous run left a stale partial for this identifier
        let partial_dir = dir.path().join("cache").join("partial");
        std::fs::create_dir_all(&partial_dir).unwrap();
        std::fs::write(partial_dir.join("rel-42"), b"stale").unwrap();

        deltagen(&config)
            .args([
                "build",
                "--old-location", "h-old",
                "--old-hash", "h-old",
                "--new-location", "h-new",
                "--new-hash", "h-new",
                "--identifier", "rel-42",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("exited with code 1"));

        assert!(!partial_dir.join("rel-42").exists());
    }

    #[test]
    fn missing_input_artifact_is_reported() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path());
        install_stub_tools(
            &dir.path().join("tools"),
            r#"printf '0123456789' > "$1""#,
        );

        deltagen(&config)
            .args([
                "build",
                "--old-location", "h-old",
                "--old-hash", "h-old",
                "--new-location", "h-new",
                "--new-hash", "h-new",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cache miss"));
    }

    #[test]
    fn cache_delete_removes_entry() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path());
        seed_complete(&dir.path().join("cache"), "h-old", b"old artifact");

        deltagen(&config)
            .args(["cache", "delete", "h-old", "--category", "complete"])
            .assert()
            .success();

        assert!(!dir
            .path()
            .join("cache")
            .join("complete")
            .join("h-old")
            .exists());
    }

    #[test]
    fn derived_identifier_is_used_when_omitted() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path());
        install_stub_tools(
            &dir.path().join("tools"),
            r#"printf '0123456789' > "$1""#,
        );
        seed_complete(&dir.path().join("cache"), "h-old", b"old artifact");
        seed_complete(&dir.path().join("cache"), "h-new", b"new artifact");

        deltagen(&config)
            .args([
                "build",
                "--old-location", "h-old",
                "--old-hash", "h-old",
                "--new-location", "h-new",
                "--new-hash", "h-new",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Partial artifact cached under"));

        // Exactly one partial entry exists, named by the derived identifier
        let partial_dir = dir.path().join("cache").join("partial");
        let entries: Vec<_> = std::fs::read_dir(&partial_dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
