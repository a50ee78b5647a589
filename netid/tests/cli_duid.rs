use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

fn workspace() -> (TempDir, PathBuf) {
    let dir = tempdir().expect("tempdir");
    let interfaces = dir.path().join("interfaces.json");
    fs::write(
        &interfaces,
        r#"{"interfaces":{"eth0":{"mac":"00:11:22:33:44:55","duid":"00:03:00:01:00:11:22:33:44:55"}}}"#,
    )
    .expect("seed interfaces");

    let config = dir.path().join("netid.toml");
    fs::write(
        &config,
        format!(
            "backend = \"file\"\nstate_dir = {:?}\nbackend_file = {:?}\n\n[retry]\nmax_attempts = 2\nbase_delay_ms = 1\n",
            path_as_str(&dir.path().join("state")),
            path_as_str(&interfaces),
        ),
    )
    .expect("write config");
    (dir, config)
}

fn netid(config: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("netid"));
    cmd.env_remove("NETID_CONFIG").arg("--config").arg(config);
    cmd
}

fn path_as_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[test]
fn parse_decodes_ll_scenario() {
    let (_dir, config) = workspace();

    netid(&config)
        .args(["duid", "parse", "00:03:00:01:aa:bb:cc:dd:ee:ff"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DUID-LL"))
        .stdout(predicate::str::contains("hardware_type: 1"))
        .stdout(predicate::str::contains("AA:BB:CC:DD:EE:FF"));
}

#[test]
fn parse_rejects_truncated_layout() {
    let (_dir, config) = workspace();

    netid(&config)
        .args(["duid", "parse", "00:03:00:01:aa"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("DUID-LL"))
        .stderr(predicate::str::contains("[parse]"));

    netid(&config)
        .args(["duid", "parse", "00-03-00-01"])
        .assert()
        .code(2);
}

#[test]
fn generate_llt_embeds_given_mac() {
    let (_dir, config) = workspace();

    let output = netid(&config)
        .args([
            "--format",
            "json",
            "duid",
            "generate",
            "--type",
            "llt",
            "--mac",
            "00:11:22:33:44:55",
        ])
        .output()
        .expect("run");
    assert!(output.status.success());
    let info: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(info["variant"], "llt");
    assert_eq!(info["link_layer_address"], "00:11:22:33:44:55");
    assert!(info["timestamp"].as_u64().expect("timestamp") > 0);
}

#[test]
fn sync_tracks_spoofed_mac() {
    let (_dir, config) = workspace();

    netid(&config)
        .args(["mac", "set", "eth0", "00:50:56:aa:bb:cc"])
        .assert()
        .success();

    netid(&config)
        .args(["duid", "sync", "eth0", "--type", "ll"])
        .assert()
        .success()
        .stdout(predicate::str::contains("00:03:00:01:00:50:56:aa:bb:cc"));

    netid(&config)
        .args(["original", "show", "duid"])
        .assert()
        .success()
        .stdout(predicate::str::contains("00:03:00:01:00:11:22:33:44:55"));

    netid(&config)
        .args(["duid", "restore", "eth0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("00:03:00:01:00:11:22:33:44:55"));
}

#[test]
fn sync_refuses_variants_without_link_layer_address() {
    let (_dir, config) = workspace();

    netid(&config)
        .args(["duid", "sync", "eth0", "--type", "uuid"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("duid random"));
}

#[test]
fn random_uuid_then_reset() {
    let (_dir, config) = workspace();

    let output = netid(&config)
        .args(["--format", "json", "duid", "random", "eth0", "--type", "uuid"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let value = outcome["value"].as_str().expect("value");
    assert!(value.starts_with("00:04:"), "{value}");
    assert_eq!(value.split(':').count(), 18);

    netid(&config)
        .args(["duid", "reset", "eth0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reset"));

    netid(&config)
        .args(["duid", "show", "eth0"])
        .assert()
        .code(2);

    netid(&config)
        .args(["original", "show", "duid"])
        .assert()
        .success()
        .stdout(predicate::str::contains("00:03:00:01:00:11:22:33:44:55"));
}
