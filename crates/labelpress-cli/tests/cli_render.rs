use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn cli() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo_bin!("labelpress-cli"));
    cmd.current_dir(repo_root()).env_remove("LABELPRESS_LOG");
    cmd
}

fn copy_release(name: &str, into: &Path) -> PathBuf {
    let dst = into.join(name);
    fs::copy(repo_root().join("fixtures/releases").join(name), &dst).expect("copy fixture");
    dst
}

#[test]
fn renders_svg_into_catalog_directory() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out_dir = tmp.path().join("rendered");

    let output = cli()
        .args([
            "render",
            "--out-dir",
            out_dir.to_string_lossy().as_ref(),
            "fixtures/releases/nx001.yml",
        ])
        .output()
        .expect("run");
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Rendered fixtures/releases/nx001.yml ->"), "{stdout}");

    let svg = fs::read_to_string(out_dir.join("NX001").join("label.svg")).expect("label.svg");
    assert!(svg.contains("NX001 • 45 • HARDGROOVE"));
    assert!(svg.contains(r#"data-line-count="5""#));
}

#[test]
fn directory_inputs_expand_in_sorted_order_and_failures_are_isolated() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let releases = tmp.path().join("releases");
    fs::create_dir_all(&releases).unwrap();
    copy_release("nx002.yml", &releases);
    copy_release("broken.yml", &releases);
    copy_release("nx001.yml", &releases);
    fs::write(releases.join("notes.txt"), "not a record").unwrap();
    let out_dir = tmp.path().join("out");

    let output = cli()
        .args([
            "--out-dir",
            out_dir.to_string_lossy().as_ref(),
            releases.to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken.yml"), "{stderr}");
    assert!(stderr.contains("Invalid release record YAML"), "{stderr}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let rendered: Vec<&str> = stdout.lines().filter(|l| l.starts_with("Rendered")).collect();
    assert_eq!(rendered.len(), 2, "{stdout}");
    assert!(rendered[0].contains("nx001.yml"));
    assert!(rendered[1].contains("nx002.yml"));

    assert!(out_dir.join("NX001/label.svg").is_file());
    assert!(out_dir.join("NX002/label.svg").is_file());
}

#[test]
fn raster_formats_are_written_next_to_the_svg() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out_dir = tmp.path().join("rendered");

    cli()
        .args([
            "render",
            "--format",
            "svg,png,pdf",
            "--width",
            "300",
            "--out-dir",
            out_dir.to_string_lossy().as_ref(),
            "fixtures/releases/nx001.yml",
        ])
        .assert()
        .success();

    let dir = out_dir.join("NX001");
    let png = fs::read(dir.join("label.png")).expect("label.png");
    assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"), "output is not a PNG");
    assert_eq!(u32::from_be_bytes(png[16..20].try_into().unwrap()), 300);
    let pdf = fs::read(dir.join("label.pdf")).expect("label.pdf");
    assert!(pdf.starts_with(b"%PDF-"), "output is not a PDF");
    assert!(dir.join("label.svg").is_file());
}

#[test]
fn check_writes_nothing() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out_dir = tmp.path().join("rendered");

    let output = cli()
        .args([
            "check",
            "--out-dir",
            out_dir.to_string_lossy().as_ref(),
            "fixtures/releases/nx001.yml",
            "fixtures/releases/nx002.yml",
        ])
        .output()
        .expect("run");
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ok fixtures/releases/nx001.yml (NX001; t_tracks_a=5, t_tracks_b=3)"), "{stdout}");
    assert!(stdout.contains("ok fixtures/releases/nx002.yml (NX002;"), "{stdout}");
    assert!(!out_dir.exists());
}

#[test]
fn config_file_is_applied() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out_dir = tmp.path().join("rendered");

    cli()
        .args([
            "--config",
            "fixtures/config/numbered.yml",
            "--out-dir",
            out_dir.to_string_lossy().as_ref(),
            "fixtures/releases/nx001.yml",
        ])
        .assert()
        .success();

    let svg = fs::read_to_string(out_dir.join("NX001/label.svg")).unwrap();
    assert!(svg.contains("B1. Locked Groove"));
}

#[test]
fn record_without_catalog_fails() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let record = tmp.path().join("anon.yml");
    fs::write(&record, "label: NO CATALOG\n").unwrap();

    let output = cli()
        .args([
            "--out-dir",
            tmp.path().join("out").to_string_lossy().as_ref(),
            record.to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("anon.yml: record has no usable catalog"), "{stderr}");
}

#[test]
fn usage_errors_exit_with_2() {
    let output = cli().args(["--format", "gif"]).output().expect("run");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("USAGE:"));

    let output = cli().arg("--help").output().expect("run");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn invalid_config_is_fatal() {
    let output = cli()
        .args([
            "check",
            "--config",
            "fixtures/config/invalid.yml",
            "fixtures/releases/nx001.yml",
        ])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid.yml: Invalid label config"), "{stderr}");
}
