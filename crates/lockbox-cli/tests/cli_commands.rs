use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

const MASTER: &str = "correct horse battery staple";

fn base_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("lockbox").expect("binary");
    cmd.env("HOME", home);
    for name in [
        "LOCKBOX_USER_ID",
        "LOCKBOX_EMAIL",
        "LOCKBOX_TENANT",
        "LOCKBOX_DEPARTMENT",
        "LOCKBOX_PROFILE",
        "LOCKBOX_STORE_DIR",
        "LOCKBOX_WRITE_POLICY",
        "LOCKBOX_VAULT_KIND",
        "LOCKBOX_MASTER_PASSWORD",
        "LOCKBOX_KDF_ITERATIONS",
    ] {
        cmd.env_remove(name);
    }
    cmd
}

fn configured_cmd(home: &Path) -> Command {
    let mut cmd = base_cmd(home);
    cmd.env("LOCKBOX_ACCOUNT_ID", "123456789012")
        .env("LOCKBOX_REGION", "eu-west-1")
        .env("LOCKBOX_USER_ID", "u-1")
        .env("LOCKBOX_MASTER_PASSWORD", MASTER);
    cmd
}

fn init(home: &Path) {
    configured_cmd(home)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("initialized"));
}

fn add(home: &Path, args: &[&str]) -> String {
    let output = configured_cmd(home)
        .arg("add")
        .args(args)
        .output()
        .expect("run add");
    assert!(output.status.success(), "add failed: {output:?}");
    String::from_utf8(output.stdout)
        .expect("utf8")
        .trim()
        .to_string()
}

#[test]
fn path_prints_personal_and_work_identifiers() {
    let home = tempdir().expect("tempdir");

    configured_cmd(home.path())
        .env("LOCKBOX_EMAIL", "alice@Example.com")
        .arg("path")
        .assert()
        .success()
        .stdout("lockbox/example.com/123456789012/eu-west-1/u-1/personal/vault\n");

    configured_cmd(home.path())
        .args(["--kind", "work", "path"])
        .assert()
        .success()
        .stdout("lockbox/default/123456789012/eu-west-1/department/vault\n");
}

#[test]
fn path_without_region_fails() {
    let home = tempdir().expect("tempdir");

    base_cmd(home.path())
        .env("LOCKBOX_ACCOUNT_ID", "123456789012")
        .env_remove("LOCKBOX_REGION")
        .arg("path")
        .assert()
        .failure()
        .stderr(predicate::str::contains("region"));
}

#[test]
fn unknown_vault_kind_is_rejected() {
    let home = tempdir().expect("tempdir");

    configured_cmd(home.path())
        .args(["--kind", "team", "path"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid_vault_kind"));
}

#[test]
fn add_list_show_and_remove_personal_record() {
    let home = tempdir().expect("tempdir");
    init(home.path());

    let id = add(
        home.path(),
        &[
            "--title",
            "Gmail",
            "--username",
            "alice",
            "--password",
            "hunter2",
            "--tags",
            "mail,personal stuff",
        ],
    );
    assert!(!id.is_empty());

    configured_cmd(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Gmail").and(predicate::str::contains("alice")));

    configured_cmd(home.path())
        .args(["show", "gmail"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"#personal-stuff\"")
                .and(predicate::str::contains("hunter2").not()),
        );

    configured_cmd(home.path())
        .args(["show", &id, "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hunter2"));

    configured_cmd(home.path())
        .args(["rm", &id])
        .assert()
        .success();
    configured_cmd(home.path())
        .args(["rm", &id])
        .assert()
        .success();

    configured_cmd(home.path())
        .args(["list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Gmail").not());
}

#[test]
fn personal_vault_is_sealed_on_disk() {
    let home = tempdir().expect("tempdir");
    init(home.path());
    add(home.path(), &["--title", "Bank", "--password", "s3cret-value"]);

    let store = home.path().join(".lockbox").join("vaults");
    let mut found = false;
    for entry in std::fs::read_dir(&store).expect("store dir") {
        let path = entry.expect("entry").path();
        let contents = std::fs::read_to_string(&path).expect("read");
        assert!(!contents.contains("s3cret-value"));
        found = true;
    }
    assert!(found, "no vault file written");
}

#[test]
fn update_merges_fields() {
    let home = tempdir().expect("tempdir");
    init(home.path());
    let id = add(home.path(), &["--title", "Bank", "--username", "alice"]);

    configured_cmd(home.path())
        .args(["update", &id, "--password", "new-pass"])
        .assert()
        .success();

    configured_cmd(home.path())
        .args(["show", &id, "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("new-pass").and(predicate::str::contains("alice")));
}

#[test]
fn wrong_master_password_is_rejected() {
    let home = tempdir().expect("tempdir");
    init(home.path());

    configured_cmd(home.path())
        .env("LOCKBOX_MASTER_PASSWORD", "not the password")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid master password"));
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let home = tempdir().expect("tempdir");
    init(home.path());

    configured_cmd(home.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));

    configured_cmd(home.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

#[test]
fn init_rejects_weak_kdf_iterations() {
    let home = tempdir().expect("tempdir");

    configured_cmd(home.path())
        .env("LOCKBOX_KDF_ITERATIONS", "1")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 100000 iterations"));
    assert!(!home.path().join(".lockbox").join("state.json").exists());

    configured_cmd(home.path())
        .args(["config", "set", "kdf_iterations", "1000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 100000"));
}

#[test]
fn work_vault_needs_no_master_password() {
    let home = tempdir().expect("tempdir");

    let output = configured_cmd(home.path())
        .env_remove("LOCKBOX_MASTER_PASSWORD")
        .args(["--kind", "work", "add", "--title", "Team wiki"])
        .output()
        .expect("run add");
    assert!(output.status.success(), "add failed: {output:?}");

    configured_cmd(home.path())
        .env_remove("LOCKBOX_MASTER_PASSWORD")
        .args(["--kind", "work", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Team wiki"));
}

#[test]
fn list_without_account_is_empty() {
    let home = tempdir().expect("tempdir");

    base_cmd(home.path())
        .env_remove("LOCKBOX_ACCOUNT_ID")
        .env_remove("LOCKBOX_REGION")
        .args(["list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn otp_prints_a_code_from_the_record() {
    let home = tempdir().expect("tempdir");
    init(home.path());
    let id = add(
        home.path(),
        &[
            "--title",
            "GitHub",
            "--password",
            "otpauth://totp/GitHub:alice?secret=JBSWY3DPEHPK3PXP&issuer=GitHub",
        ],
    );

    configured_cmd(home.path())
        .args(["otp", &id])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\d{6} \(\d+s\)\n$").expect("regex"));
}

#[test]
fn otp_without_configuration_fails() {
    let home = tempdir().expect("tempdir");
    init(home.path());
    let id = add(home.path(), &["--title", "Plain", "--password", "pw"]);

    configured_cmd(home.path())
        .args(["otp", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no one-time password"));
}

#[test]
fn config_set_persists_to_yaml() {
    let home = tempdir().expect("tempdir");

    base_cmd(home.path())
        .env_remove("LOCKBOX_ACCOUNT_ID")
        .env_remove("LOCKBOX_REGION")
        .args(["config", "set", "region", "us-east-1"])
        .assert()
        .success();
    base_cmd(home.path())
        .env_remove("LOCKBOX_ACCOUNT_ID")
        .env_remove("LOCKBOX_REGION")
        .args(["config", "set", "account_id", "42"])
        .assert()
        .success();

    let contents =
        std::fs::read_to_string(home.path().join(".lockbox").join("config.yaml")).expect("config");
    assert!(contents.contains("region: us-east-1"));

    base_cmd(home.path())
        .env_remove("LOCKBOX_ACCOUNT_ID")
        .env_remove("LOCKBOX_REGION")
        .args(["--kind", "work", "path"])
        .assert()
        .success()
        .stdout("lockbox/default/42/us-east-1/department/vault\n");
}

#[test]
fn env_overrides_win_over_config_file() {
    let home = tempdir().expect("tempdir");

    base_cmd(home.path())
        .env_remove("LOCKBOX_REGION")
        .args(["config", "set", "region", "us-east-1"])
        .assert()
        .success();

    base_cmd(home.path())
        .env("LOCKBOX_REGION", "ap-south-1")
        .env("LOCKBOX_ACCOUNT_ID", "42")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("region: ap-south-1"));
}

#[test]
fn schema_describes_vault_records() {
    let home = tempdir().expect("tempdir");

    base_cmd(home.path())
        .arg("schema")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("VaultRecord")
                .and(predicate::str::contains("externalSecretRef")),
        );
}
