//! Integration tests for the slidecache binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::helpers::{file_count, write_images, write_png};

/// slidecache with HOME pointed at a temp dir
fn slidecache(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("slidecache").expect("binary should build");
    cmd.env("HOME", home)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn cache_dir(home: &Path) -> std::path::PathBuf {
    home.join(".config").join("slidecache").join("thumbnails")
}

#[test]
fn help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    slidecache(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("warm")
                .and(predicate::str::contains("status"))
                .and(predicate::str::contains("evict"))
                .and(predicate::str::contains("clear"))
                .and(predicate::str::contains("show")),
        );
}

#[test]
fn config_path_is_under_home() {
    let home = TempDir::new().unwrap();
    let expected = home.path().join(".config/slidecache/config.toml");
    slidecache(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.to_string_lossy().into_owned()));
}

#[test]
fn config_show_prints_defaults() {
    let home = TempDir::new().unwrap();
    slidecache(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[cache]")
                .and(predicate::str::contains("max_size_mb = 100.0"))
                .and(predicate::str::contains("queue_capacity = 5")),
        );
}

#[test]
fn status_on_empty_cache() {
    let home = TempDir::new().unwrap();
    slidecache(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Entries: 0"));
    assert!(cache_dir(home.path()).is_dir());
}

#[test]
fn warm_generates_then_reuses() {
    let home = TempDir::new().unwrap();
    let pics = home.path().join("pics");
    fs::create_dir_all(&pics).unwrap();
    write_images(&pics, 3);
    fs::write(pics.join("readme.txt"), "skip me").unwrap();

    slidecache(home.path())
        .arg("warm")
        .arg(&pics)
        .assert()
        .success()
        .stdout(predicate::str::contains("Done: 3 generated, 0 reused, 0 skipped"));

    // Three thumbnails plus the metadata record
    assert_eq!(file_count(&cache_dir(home.path())), 4);

    slidecache(home.path())
        .arg("warm")
        .arg(&pics)
        .assert()
        .success()
        .stdout(predicate::str::contains("Done: 0 generated, 3 reused, 0 skipped"));

    slidecache(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Entries: 3"));
}

#[test]
fn warm_uses_library_folder_from_config() {
    let home = TempDir::new().unwrap();
    let pics = home.path().join("library");
    fs::create_dir_all(pics.join("nested")).unwrap();
    write_png(&pics, "a.png", 40, 40);
    write_png(&pics.join("nested"), "b.png", 40, 40);
    let config = home.path().join("custom.toml");
    fs::write(
        &config,
        format!(
            "[library]\nfolder = {:?}\nrecursive = true\n",
            pics.to_string_lossy()
        ),
    )
    .unwrap();

    slidecache(home.path())
        .arg("--config")
        .arg(&config)
        .arg("warm")
        .assert()
        .success()
        .stdout(predicate::str::contains("Done: 2 generated"));
}

#[test]
fn warm_without_folder_fails() {
    let home = TempDir::new().unwrap();
    slidecache(home.path())
        .arg("warm")
        .assert()
        .failure()
        .stderr(predicate::str::contains("library.folder is not set"));
}

#[test]
fn warm_empty_folder_reports_nothing_found() {
    let home = TempDir::new().unwrap();
    let empty = home.path().join("empty");
    fs::create_dir_all(&empty).unwrap();

    slidecache(home.path())
        .arg("warm")
        .arg(&empty)
        .assert()
        .success()
        .stdout(predicate::str::contains("No images found"));
}

#[test]
fn clear_yes_empties_cache_dir() {
    let home = TempDir::new().unwrap();
    let pics = home.path().join("pics");
    fs::create_dir_all(&pics).unwrap();
    write_images(&pics, 2);
    slidecache(home.path()).arg("warm").arg(&pics).assert().success();

    slidecache(home.path())
        .args(["clear", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 3 files"));

    assert_eq!(file_count(&cache_dir(home.path())), 0);
}

#[test]
fn clear_declined_keeps_files() {
    let home = TempDir::new().unwrap();
    let pics = home.path().join("pics");
    fs::create_dir_all(&pics).unwrap();
    write_images(&pics, 2);
    slidecache(home.path()).arg("warm").arg(&pics).assert().success();

    slidecache(home.path())
        .arg("clear")
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes made."));

    assert_eq!(file_count(&cache_dir(home.path())), 3);
}

#[test]
fn evict_reports_pass() {
    let home = TempDir::new().unwrap();
    slidecache(home.path())
        .args(["evict", "--max-mb", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Evicted 0 of 0 thumbnails"));
}

#[test]
fn show_writes_fitted_image() {
    let home = TempDir::new().unwrap();
    let source = write_png(home.path(), "photo.png", 800, 400);
    let out = home.path().join("out.jpg");

    slidecache(home.path())
        .arg("show")
        .arg(&source)
        .args(["--width", "200", "--height", "200", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("200x100"));

    let written = image::open(&out).unwrap();
    assert_eq!((written.width(), written.height()), (200, 100));
}

#[test]
fn show_unreadable_image_fails() {
    let home = TempDir::new().unwrap();
    let bad = home.path().join("bad.png");
    fs::write(&bad, "nope").unwrap();

    slidecache(home.path())
        .arg("show")
        .arg(&bad)
        .args(["--width", "10", "--height", "10", "--out"])
        .arg(home.path().join("o.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read image"));
}

#[test]
fn completions_generate_script() {
    let home = TempDir::new().unwrap();
    slidecache(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("slidecache"));
}
