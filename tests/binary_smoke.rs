use std::fs;
use std::process::Command;
use tempfile::tempdir;

use graceful_worker::config::CONFIG_ENV;

fn bin() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("graceful_worker"));
    cmd.env_remove(CONFIG_ENV);
    cmd
}

#[test]
fn binary_print_config_succeeds() {
    let out = bin().arg("--print-config").output().expect("spawn binary");
    assert!(out.status.success(), "binary should succeed with --print-config");
}

#[test]
fn binary_runs_to_completion_without_interrupts() {
    let td = tempdir().unwrap();
    let cfg = td.path().join("config.xml");
    fs::write(&cfg, "<config><steps>3</steps><step_delay_ms>1</step_delay_ms></config>").unwrap();

    let out = bin()
        .arg("--config")
        .arg(&cfg)
        .output()
        .expect("spawn binary");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("1 of 3 iterations..."), "stdout: {stdout}");
    assert!(stdout.contains("3 of 3 iterations..."), "stdout: {stdout}");
    assert!(stdout.contains("3 iterations completed before exiting."), "stdout: {stdout}");
}

#[test]
fn cli_flags_override_config_file() {
    let td = tempdir().unwrap();
    let cfg = td.path().join("config.xml");
    fs::write(&cfg, "<config><steps>50</steps></config>").unwrap();

    let out = bin()
        .args(["--steps", "2", "--delay-ms", "0", "--log-level", "quiet", "--config"])
        .arg(&cfg)
        .output()
        .expect("spawn binary");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("2 iterations completed before exiting."), "stdout: {stdout}");
    assert!(!stdout.contains("3 of"), "stdout: {stdout}");
}

#[test]
fn zero_steps_fails_validation() {
    let td = tempdir().unwrap();
    let cfg = td.path().join("config.xml");
    fs::write(&cfg, "<config/>").unwrap();
    let out = bin()
        .args(["--steps", "0", "--config"])
        .arg(&cfg)
        .output()
        .expect("spawn binary");
    assert!(!out.status.success());
}

#[test]
fn unknown_config_field_fails() {
    let td = tempdir().unwrap();
    let cfg = td.path().join("config.xml");
    fs::write(&cfg, "<config><bogus>1</bogus></config>").unwrap();
    let out = bin().arg("--config").arg(&cfg).output().expect("spawn binary");
    assert!(!out.status.success());
}
