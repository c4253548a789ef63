use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn bin() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("desfire-keysearch"));
    cmd.env_remove("DESFIRE_READER")
        .env_remove("DESFIRE_FRAMING")
        .env_remove("DESFIRE_PROGRESS_WIDTH");
    cmd
}

#[test]
fn unknown_auth_type_is_rejected() {
    let dir = tempdir().unwrap();
    let keys = dir.path().join("keys.bin");
    fs::write(&keys, [0u8; 32]).unwrap();

    bin()
        .arg("0x1234")
        .arg("0")
        .arg("AUTH_RC4")
        .arg(&keys)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid authentication type"));
}

#[test]
fn key_number_above_13_is_rejected() {
    let dir = tempdir().unwrap();
    let keys = dir.path().join("keys.bin");
    fs::write(&keys, [0u8; 32]).unwrap();

    bin()
        .arg("0x1234")
        .arg("14")
        .arg("AUTH_DES")
        .arg(&keys)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("range 0-13"));
}

#[test]
fn malformed_aid_is_rejected() {
    let dir = tempdir().unwrap();
    let keys = dir.path().join("keys.bin");
    fs::write(&keys, [0u8; 32]).unwrap();

    bin()
        .arg("0xZZ")
        .arg("0")
        .arg("AUTH_DES")
        .arg(&keys)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("for AID"));
}

#[test]
fn missing_key_file_fails_before_touching_a_reader() {
    let dir = tempdir().unwrap();
    let keys = dir.path().join("missing.bin");

    bin()
        .arg("0x1234")
        .arg("0")
        .arg("AUTH_DES")
        .arg(&keys)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ERROR"));
}

#[test]
fn short_key_file_fails_before_touching_a_reader() {
    let dir = tempdir().unwrap();
    let keys = dir.path().join("short.bin");
    fs::write(&keys, [0u8; 15]).unwrap();

    bin()
        .arg("4660")
        .arg("1")
        .arg("AUTH_AES")
        .arg(&keys)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("too short"));
}

#[test]
fn missing_arguments_print_usage() {
    bin()
        .arg("0x1234")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
