use std::io::Read;

use super::*;

fn gunzip(path: &Path) -> String {
    let file = std::fs::File::open(path).expect("open gz");
    let mut decoder = flate2::read::GzDecoder::new(file);
    let mut out = String::new();
    decoder.read_to_string(&mut out).expect("gunzip");
    out
}

#[test]
fn rotate_creates_gz_and_removes_original() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("daemon.log");
    std::fs::write(&log_path, b"first generation").expect("write");

    rotate_log_files(&log_path).expect("rotate");

    assert!(!log_path.exists());
    let rotated = rotated_path(&log_path, 1);
    assert!(rotated.exists());
    assert_eq!(gunzip(&rotated), "first generation");
}

#[test]
fn rotate_shifts_existing_generations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("daemon.log");

    std::fs::write(&log_path, b"gen one").expect("write");
    rotate_log_files(&log_path).expect("rotate 1");

    std::fs::write(&log_path, b"gen two").expect("write");
    rotate_log_files(&log_path).expect("rotate 2");

    assert_eq!(gunzip(&rotated_path(&log_path, 1)), "gen two");
    assert_eq!(gunzip(&rotated_path(&log_path, 2)), "gen one");
}

#[test]
fn rotate_prunes_beyond_max_rotated() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("daemon.log");

    for gen in 0..(MAX_ROTATED + 2) {
        std::fs::write(&log_path, format!("gen {gen}")).expect("write");
        rotate_log_files(&log_path).expect("rotate");
    }

    assert!(rotated_path(&log_path, MAX_ROTATED).exists());
    assert!(!rotated_path(&log_path, MAX_ROTATED + 1).exists());
}

#[test]
fn writer_rotates_once_threshold_crossed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("daemon.log");
    let mut writer = RotatingWriter::open(log_path.clone()).expect("open");
    writer.written = MAX_LOG_BYTES;

    writer.write_all(b"overflow line").expect("write");

    assert!(rotated_path(&log_path, 1).exists());
    assert_eq!(gunzip(&rotated_path(&log_path, 1)), "");
    assert_eq!(std::fs::read_to_string(&log_path).expect("read"), "overflow line");
}
