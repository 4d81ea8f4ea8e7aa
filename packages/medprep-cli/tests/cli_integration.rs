use std::f64::consts::PI;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn medprep() -> Command {
    Command::cargo_bin("medprep").unwrap()
}

fn write_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_pixel(width, height, image::Rgb([10, 200, 30]))
        .save(path)
        .unwrap();
}

/// Single-lead format 16 record at 250 Hz with a beat every 0.8 s
fn write_record(dir: &Path, name: &str) {
    let n = 2400;
    std::fs::write(
        dir.join(format!("{}.hea", name)),
        format!("{} 1 250 {}\n{}.dat 16 200 16 0 0 0 0 MLII\n", name, n, name),
    )
    .unwrap();

    let mut data = Vec::new();
    for i in 0..n {
        let offset = (i + 100) % 200;
        let distance = offset.min(200 - offset) as f64;
        let mv = 0.1 * (2.0 * PI * 0.2 * i as f64 / 250.0).sin()
            + (-distance * distance / 50.0).exp();
        data.extend(((mv * 200.0).round() as i16).to_le_bytes());
    }
    std::fs::write(dir.join(format!("{}.dat", name)), data).unwrap();
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_no_args_shows_help() {
    medprep()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    medprep()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("medprep"));
}

#[test]
fn test_help_lists_subcommands() {
    medprep()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ecg"))
        .stdout(predicate::str::contains("organize"))
        .stdout(predicate::str::contains("split"))
        .stdout(predicate::str::contains("resize"));
}

// =============================================================================
// ECG SUBCOMMAND
// =============================================================================

#[test]
fn test_ecg_prints_features() {
    let tmp = tempfile::tempdir().unwrap();
    write_record(tmp.path(), "200");

    medprep()
        .args(["ecg", "--no-annotations", "--compact", "--record"])
        .arg(tmp.path().join("200"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"record_name\":\"200\""))
        .stdout(predicate::str::contains("heart_rate_bpm"));
}

#[test]
fn test_ecg_glob_with_missing_annotations_fails() {
    let tmp = tempfile::tempdir().unwrap();
    write_record(tmp.path(), "201");

    medprep()
        .args(["ecg", "--glob"])
        .arg(format!("{}/*.hea", tmp.path().display()))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_ecg_requires_input() {
    medprep()
        .arg("ecg")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("must be specified"));
}

// =============================================================================
// IMAGE SUBCOMMANDS
// =============================================================================

#[test]
fn test_resize_reports_partial_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    std::fs::create_dir_all(&input).unwrap();
    write_png(&input.join("a.png"), 20, 10);
    std::fs::write(input.join("bad.jpg"), b"garbage").unwrap();

    medprep()
        .args(["resize", "--width", "8", "--height", "8", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .code(3)
        .stdout(predicate::str::contains("bad.jpg"))
        .stdout(predicate::str::contains("\"kind\": \"decode\""))
        .stderr(predicate::str::contains("1 succeeded, 1 failed"));

    let img = image::open(output.join("a.png")).unwrap();
    assert_eq!((img.width(), img.height()), (8, 8));
}

#[test]
fn test_resize_missing_input() {
    let tmp = tempfile::tempdir().unwrap();
    medprep()
        .args(["resize", "--input"])
        .arg(tmp.path().join("missing"))
        .arg("--output")
        .arg(tmp.path().join("out"))
        .assert()
        .code(2);
}

#[test]
fn test_organize_dry_run_leaves_files() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("images");
    std::fs::create_dir_all(&images).unwrap();
    write_png(&images.join("x1.png"), 4, 4);
    let labels = tmp.path().join("labels.csv");
    std::fs::write(
        &labels,
        "Image Index,Finding Labels\nx1.png,Hernia\nx2.png,Mass\n",
    )
    .unwrap();

    medprep()
        .args(["organize", "--dry-run", "--labels"])
        .arg(&labels)
        .arg("--images")
        .arg(&images)
        .arg("--output")
        .arg(tmp.path().join("organized"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Hernia"))
        .stdout(predicate::str::contains("x2.png"));

    assert!(images.join("x1.png").exists());
    assert!(!tmp.path().join("organized").exists());
}

#[test]
fn test_organize_strict_missing_image() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("images");
    std::fs::create_dir_all(&images).unwrap();
    let labels = tmp.path().join("labels.csv");
    std::fs::write(&labels, "Image Index,Finding Labels\nx2.png,Mass\n").unwrap();

    medprep()
        .args(["organize", "--strict", "--labels"])
        .arg(&labels)
        .arg("--images")
        .arg(&images)
        .arg("--output")
        .arg(tmp.path().join("organized"))
        .assert()
        .code(2);
}

#[test]
fn test_organize_then_split() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("images");
    std::fs::create_dir_all(&images).unwrap();
    let mut csv = String::from("Image Index,Finding Labels\n");
    for i in 0..10 {
        let name = format!("{}.png", i);
        write_png(&images.join(&name), 4, 4);
        csv.push_str(&format!("{},{}\n", name, if i % 2 == 0 { "A" } else { "B" }));
    }
    let labels = tmp.path().join("labels.csv");
    std::fs::write(&labels, csv).unwrap();
    let organized = tmp.path().join("organized");

    medprep()
        .args(["organize", "--labels"])
        .arg(&labels)
        .arg("--images")
        .arg(&images)
        .arg("--output")
        .arg(&organized)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"moved\": 10"));

    medprep()
        .args(["split", "--organized"])
        .arg(&organized)
        .arg("--train")
        .arg(tmp.path().join("train"))
        .arg("--val")
        .arg(tmp.path().join("val"))
        .arg("--test")
        .arg(tmp.path().join("test"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"test\": 2"));

    assert_eq!(std::fs::read_dir(tmp.path().join("test/A")).unwrap().count(), 1);
    assert_eq!(std::fs::read_dir(tmp.path().join("test/B")).unwrap().count(), 1);
}

#[test]
fn test_split_rejects_bad_fraction() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("organized/A")).unwrap();
    std::fs::write(tmp.path().join("organized/A/1.png"), "x").unwrap();

    medprep()
        .args(["split", "--test-size", "1.5", "--organized"])
        .arg(tmp.path().join("organized"))
        .arg("--train")
        .arg(tmp.path().join("train"))
        .arg("--val")
        .arg(tmp.path().join("val"))
        .arg("--test")
        .arg(tmp.path().join("test"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("test_size"));
}

// =============================================================================
// RUN SUBCOMMAND
// =============================================================================

#[test]
fn test_run_missing_config() {
    medprep()
        .args(["run", "--config", "/nonexistent/pipeline.json"])
        .assert()
        .code(2);
}

#[test]
fn test_run_ecg_config_writes_summary() {
    let tmp = tempfile::tempdir().unwrap();
    write_record(tmp.path(), "202");
    let config = tmp.path().join("pipeline.json");
    let summary = tmp.path().join("summary.json");
    std::fs::write(
        &config,
        serde_json::json!({
            "ecg": {
                "record_base": tmp.path().join("202"),
                "annotation_extension": null,
                "target_fs": 125.0
            }
        })
        .to_string(),
    )
    .unwrap();

    medprep()
        .args(["run", "--config"])
        .arg(&config)
        .arg("--output")
        .arg(&summary)
        .assert()
        .success();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary).unwrap()).unwrap();
    assert_eq!(written["ecg"]["samples"], 1200);
    assert_eq!(written["ecg"]["fs"], 125.0);
    assert!(written.get("images").is_none());
}
