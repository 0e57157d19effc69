use std::time::Duration;

use tempfile::tempdir;
use tokio::sync::mpsc;

use super::*;

#[test]
fn qualify_maps_kind_and_dir_flag_to_event_type() {
    assert_eq!(qualify(RawKind::Created, false), "file_created");
    assert_eq!(qualify(RawKind::Created, true), "directory_created");
    assert_eq!(qualify(RawKind::Modified, false), "file_modified");
    assert_eq!(qualify(RawKind::Removed, false), "file_deleted");
    assert_eq!(qualify(RawKind::Removed, true), "directory_deleted");
}

#[test]
fn is_ignored_matches_basename_glob() {
    let patterns = vec!["*.tmp".to_string()];
    assert!(is_ignored(Path::new("/tmp/w/x.tmp"), &patterns));
    assert!(!is_ignored(Path::new("/tmp/w/x.txt"), &patterns));
}

#[test]
fn has_configured_parent_requires_direct_parent_match() {
    let watch = vec![PathBuf::from("/tmp/w")];
    assert!(has_configured_parent(Path::new("/tmp/w/x"), &watch));
    assert!(!has_configured_parent(Path::new("/tmp/w/sub/x"), &watch));
}

#[test]
fn has_configured_ancestor_allows_any_descendant() {
    let watch = vec![PathBuf::from("/tmp/w")];
    assert!(has_configured_ancestor(Path::new("/tmp/w/sub/x"), &watch));
    assert!(!has_configured_ancestor(Path::new("/tmp/other/x"), &watch));
}

#[test]
fn debouncer_only_schedules_once_per_burst() {
    let d = Debouncer::new(Duration::from_secs(1));
    let path = PathBuf::from("/tmp/w/x");
    assert!(d.first_in_window(&path, "file_created"));
    assert!(!d.first_in_window(&path, "file_modified"));
    assert_eq!(d.take(&path), Some("file_created"));
    assert_eq!(d.take(&path), None);
}

#[tokio::test]
async fn touching_a_watched_file_emits_file_created() {
    let dir = tempdir().unwrap();
    let config = FilesystemTrigger {
        watch_paths: vec![dir.path().to_string_lossy().into_owned()],
        recursive: false,
        ignore_patterns: vec![],
        debounce_seconds: 0,
    };
    let source = FilesystemSource::new("watch".to_string(), config, None);

    let (tx, mut rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let cancel_for_task = cancel.clone();
    let handle = tokio::spawn(async move { source.start(cancel_for_task, tx).await });

    // Give the watcher time to register before writing.
    tokio::time::sleep(Duration::from_millis(200)).await;
    std::fs::write(dir.path().join("x"), b"hello").unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert!(event.event_type == "file_created" || event.event_type == "file_modified");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
}
