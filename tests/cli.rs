use assert_cmd::Command;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use predicates::prelude::*;
use tempfile::TempDir;

const CREDENTIAL_VARS: &[&str] = &[
    "INTUNE_BACKUP_ACCESS_TOKEN",
    "INTUNE_BACKUP_TENANT_ID",
    "INTUNE_BACKUP_CLIENT_ID",
    "INTUNE_BACKUP_CLIENT_SECRET",
    "INTUNE_BACKUP_CONFIG",
    "INTUNE_BACKUP_API_VERSION",
];

/// A command with no ambient credentials and an empty config directory
fn isolated(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("intune-backup").unwrap();
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("APPDATA", home.path());
    cmd
}

fn unsigned_jwt(claims: &str) -> String {
    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
        URL_SAFE_NO_PAD.encode(claims)
    )
}

#[test]
fn test_help() {
    Command::cargo_bin("intune-backup")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--api-version"))
        .stdout(predicate::str::contains("PATH"));
}

#[test]
fn test_list_categories() {
    let home = TempDir::new().unwrap();
    isolated(&home)
        .arg("--list-categories")
        .assert()
        .success()
        .stdout(predicate::str::contains("Device Configurations"))
        .stdout(predicate::str::contains("App Protection Policies"));
}

#[test]
fn test_path_is_required() {
    let home = TempDir::new().unwrap();
    isolated(&home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("PATH"));
}

#[test]
fn test_rejects_unknown_api_version() {
    let home = TempDir::new().unwrap();
    isolated(&home)
        .args(["out", "--api-version", "v2.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("v2.0"));
}

#[test]
fn test_no_credentials() {
    let home = TempDir::new().unwrap();
    isolated(&home)
        .arg(home.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No credentials"));
}

#[test]
fn test_token_missing_scopes_is_rejected_before_any_export() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("out");
    let token = unsigned_jwt(r#"{"roles":["Group.Read.All"]}"#);

    isolated(&home)
        .arg(&out)
        .env("INTUNE_BACKUP_ACCESS_TOKEN", token)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required scopes"))
        .stderr(predicate::str::contains("DeviceManagementConfiguration.Read.All"));

    assert!(!out.exists());
}

#[test]
fn test_opaque_token_is_rejected() {
    let home = TempDir::new().unwrap();
    isolated(&home)
        .arg(home.path().join("out"))
        .env("INTUNE_BACKUP_ACCESS_TOKEN", "not-a-token")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a JWT"));
}

#[test]
fn test_access_token_flag_matches_env() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("out");
    let token = unsigned_jwt(r#"{"scp":"User.Read"}"#);

    isolated(&home)
        .arg(&out)
        .args(["--access-token", &token])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required scopes"));

    assert!(!out.exists());
}
