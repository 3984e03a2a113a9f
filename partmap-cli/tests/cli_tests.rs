//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

/// Build command for the partmap binary with supplier credentials cleared,
/// so no test reaches the network.
fn partmap_cli(cache_dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("partmap");
    cmd.env_remove("LCSC_API_KEY")
        .env_remove("OCTOPART_API_KEY")
        .env_remove("DIGIKEY_API_KEY")
        .env_remove("DIGIKEY_CLIENT_ID")
        .env_remove("PARTMAP_DATABASE")
        .env("PARTMAP_CACHE_DIR", cache_dir);
    cmd
}

#[test]
fn test_cli_help() {
    let dir = tempdir().unwrap();
    let mut cmd = partmap_cli(dir.path());

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("BOM"));
}

#[test]
fn test_cli_version() {
    let dir = tempdir().unwrap();
    let mut cmd = partmap_cli(dir.path());

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_map_library_part() {
    let dir = tempdir().unwrap();
    let mut cmd = partmap_cli(dir.path());

    cmd.arg("map")
        .arg("resistor")
        .arg("--value")
        .arg("10k")
        .arg("--package")
        .arg("0603");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("C25804"))
        .stdout(predicate::str::contains("0.95"));
}

#[test]
fn test_cli_map_json_output() {
    let dir = tempdir().unwrap();
    let mut cmd = partmap_cli(dir.path());

    cmd.arg("map")
        .arg("led")
        .arg("--value")
        .arg("blue")
        .arg("--format")
        .arg("json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["primary"]["supplier_pn"], "C72041");
    assert_eq!(json["confidence"], 0.95);
}

#[test]
fn test_cli_map_unknown_component() {
    let dir = tempdir().unwrap();
    let mut cmd = partmap_cli(dir.path());

    cmd.arg("map")
        .arg("unknown")
        .arg("--value")
        .arg("special_part")
        .arg("--attr")
        .arg("series=X");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("UNKNOWN"))
        .stdout(predicate::str::contains("Could not find suitable part"));
}

#[test]
fn test_cli_map_writes_cache() {
    let dir = tempdir().unwrap();

    partmap_cli(dir.path())
        .args(["map", "capacitor", "--value", "100nF"])
        .assert()
        .success();

    partmap_cli(dir.path())
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("capacitor_100nf_any_any"));
}

#[test]
fn test_cli_map_no_cache_leaves_cache_empty() {
    let dir = tempdir().unwrap();

    partmap_cli(dir.path())
        .args(["map", "capacitor", "--value", "100nF", "--no-cache"])
        .assert()
        .success()
        .stdout(predicate::str::contains("C14663"));

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_cli_map_blank_type_fails() {
    let dir = tempdir().unwrap();
    let mut cmd = partmap_cli(dir.path());

    cmd.arg("map").arg("  ");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_map_bad_attribute() {
    let dir = tempdir().unwrap();
    let mut cmd = partmap_cli(dir.path());

    cmd.args(["map", "resistor", "--attr", "novalue"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn test_cli_batch_csv() {
    let dir = tempdir().unwrap();
    let bom = dir.path().join("bom.json");
    std::fs::write(
        &bom,
        r#"[
            {"type": "resistor", "value": "4k7", "package": "0603"},
            {"type": "crystal", "value": "16MHz"},
            {"type": "unknown", "value": "special_part"}
        ]"#,
    )
    .unwrap();

    let mut cmd = partmap_cli(&dir.path().join("cache"));
    cmd.arg("batch").arg(&bom).arg("--format").arg("csv");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("type,value,package,mpn"))
        .stdout(predicate::str::contains("C23162"))
        .stdout(predicate::str::contains("C16212"))
        .stdout(predicate::str::contains("UNKNOWN"))
        .stderr(predicate::str::contains("1 of 3 components could not be mapped"));
}

#[test]
fn test_cli_batch_fail_on_unknown() {
    let dir = tempdir().unwrap();
    let bom = dir.path().join("bom.json");
    std::fs::write(&bom, r#"[{"type": "unknown", "value": "special_part"}]"#).unwrap();

    let mut cmd = partmap_cli(&dir.path().join("cache"));
    cmd.arg("batch").arg(&bom).arg("--fail-on-unknown");

    cmd.assert().failure();
}

#[test]
fn test_cli_batch_invalid_file() {
    let dir = tempdir().unwrap();
    let bom = dir.path().join("bom.json");
    std::fs::write(&bom, r#"{"type": "resistor"}"#).unwrap();

    let mut cmd = partmap_cli(&dir.path().join("cache"));
    cmd.arg("batch").arg(&bom);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_normalize() {
    let dir = tempdir().unwrap();

    partmap_cli(dir.path())
        .args(["normalize", "4K7 ohm"])
        .assert()
        .success()
        .stdout("4.7k\n");

    partmap_cli(dir.path())
        .args(["normalize", "100 nf", "--type", "capacitor"])
        .assert()
        .success()
        .stdout("100nF\n");
}

#[test]
fn test_cli_kb_listing() {
    let dir = tempdir().unwrap();
    let mut cmd = partmap_cli(dir.path());

    cmd.arg("kb").arg("--details");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("resistor"))
        .stdout(predicate::str::contains("crystal"))
        .stdout(predicate::str::contains("ATMEGA328P"));
}

#[test]
fn test_cli_kb_bad_database() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("db.json");
    std::fs::write(&db, "not json").unwrap();

    let mut cmd = partmap_cli(dir.path());
    cmd.arg("kb").arg("--database").arg(&db);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_suppliers_unconfigured() {
    let dir = tempdir().unwrap();
    let mut cmd = partmap_cli(dir.path());

    cmd.args(["suppliers", "--format", "json"]);

    let output = cmd.assert().success().get_output().stdout.clone();
    let status: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let names: Vec<_> = status
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["lcsc", "octopart", "digikey"]);
    assert!(status.as_array().unwrap().iter().all(|s| s["available"] == false));
}

#[test]
fn test_cli_suppliers_configured_from_env() {
    let dir = tempdir().unwrap();
    let mut cmd = partmap_cli(dir.path());

    cmd.env("OCTOPART_API_KEY", "secret").arg("suppliers");

    cmd.assert()
        .success()
        .stdout(predicate::str::is_match(r"octopart\s+configured").unwrap())
        .stdout(predicate::str::is_match(r"lcsc\s+not configured").unwrap());
}

#[test]
fn test_cli_cache_clear() {
    let dir = tempdir().unwrap();

    partmap_cli(dir.path())
        .args(["map", "led", "--value", "red"])
        .assert()
        .success();

    partmap_cli(dir.path())
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1"));

    partmap_cli(dir.path())
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_cli_missing_config_file() {
    let dir = tempdir().unwrap();
    let mut cmd = partmap_cli(dir.path());

    cmd.arg("kb").arg("--config").arg(dir.path().join("missing.json"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}
