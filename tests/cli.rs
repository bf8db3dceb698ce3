use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn snapflow_cmd(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("snapflow").expect("binary exists");
    cmd.env("XDG_CONFIG_HOME", config_home.path());
    cmd
}

#[test]
fn snapflow_help_prints_usage() {
    let temp = TempDir::new().unwrap();
    snapflow_cmd(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Capture-and-share job runner for Wayland desktops",
        ));
}

#[test]
fn capture_requires_wayland_env() {
    let temp = TempDir::new().unwrap();
    snapflow_cmd(&temp)
        .env_remove("WAYLAND_DISPLAY")
        .env("RUST_LOG", "error")
        .arg("--save")
        .assert()
        .failure()
        .stderr(predicate::str::contains("WAYLAND_DISPLAY not set"));
}

#[test]
fn print_config_applies_flags_over_config_file() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("custom.toml");
    std::fs::write(
        &config,
        "[job]\njob = \"active-window\"\n\n[job.after_capture]\ncopy_image_to_clipboard = true\n",
    )
    .unwrap();

    snapflow_cmd(&temp)
        .env_remove("WAYLAND_DISPLAY")
        .arg("--config")
        .arg(&config)
        .args(["--print-config", "--save", "--job", "rectangle-region"])
        .assert()
        .success()
        .stdout(predicate::str::contains("job = \"rectangle-region\""))
        .stdout(predicate::str::contains("save_to_file = true"))
        .stdout(predicate::str::contains("copy_image_to_clipboard = true"));
}

#[test]
fn print_config_uses_defaults_without_config_file() {
    let temp = TempDir::new().unwrap();
    snapflow_cmd(&temp)
        .env_remove("WAYLAND_DISPLAY")
        .arg("--print-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("job = \"full-screen\""))
        .stdout(predicate::str::contains("save_to_file = false"));
}

#[test]
fn malformed_config_is_reported() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("broken.toml");
    std::fs::write(&config, "[job\n").unwrap();

    snapflow_cmd(&temp)
        .arg("--config")
        .arg(&config)
        .arg("--print-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
fn unknown_job_kind_is_rejected() {
    let temp = TempDir::new().unwrap();
    snapflow_cmd(&temp)
        .args(["--job", "whole-desktop"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn missing_input_image_is_reported() {
    let temp = TempDir::new().unwrap();
    snapflow_cmd(&temp)
        .env("WAYLAND_DISPLAY", "wayland-test")
        .arg("--input")
        .arg(temp.path().join("missing.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read input image"));
}
