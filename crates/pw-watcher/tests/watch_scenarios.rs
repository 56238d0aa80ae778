//! Real-filesystem watch scenarios.
//!
//! Each scenario works in its own scratch directory and keeps a writer
//! rewriting the watched file until the first event arrives, since backends
//! may need a moment after registration before they report anything.

mod common;

use common::{sample_content, ScratchDir, Writer, EVENT_TIMEOUT};
use pw_core::{BackendChoice, WatchConfig};
use pw_watcher::{
    watch, NormalizedEvent, PlatformFamily, WatchError, WatchHandle, WatchState,
    WatchTarget,
};
use serde_json::{json, Value};
use tokio::time::{sleep, timeout, Duration};
use url::Url;

async fn first_event(handle: &mut WatchHandle) -> NormalizedEvent {
    timeout(EVENT_TIMEOUT, handle.recv())
        .await
        .expect("Timed out waiting for an event")
        .expect("Stream ended before any event")
        .expect("Backend failed")
}

fn assert_rewrite(event: &NormalizedEvent, family: PlatformFamily, name: &str) {
    assert!(
        family.content_rewrite_kinds().contains(&event.kind),
        "{} is not a content rewrite on {family}",
        event.kind
    );
    assert_eq!(event.entry_name.as_deref(), Some(name));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_directory_watch_reports_entry_name() {
    let mut scratch = ScratchDir::new();
    let root = scratch.refresh();
    let dir = root.join("watch1");
    std::fs::create_dir(&dir).unwrap();
    let file = dir.join("foo");
    let content = sample_content();
    std::fs::write(&file, &content).unwrap();

    let mut handle = watch(dir.as_path(), WatchConfig::default()).unwrap();
    assert_eq!(handle.state(), WatchState::Running);

    let writer = Writer::spawn(&file, &content);
    let event = first_event(&mut handle).await;
    assert_rewrite(&event, handle.family(), "foo");

    let err = handle.start().unwrap_err();
    assert_eq!(err.code(), "ERR_FS_WATCHER_ALREADY_STARTED");
    assert!(handle.is_running());

    handle.close().unwrap();
    assert_eq!(handle.state(), WatchState::Closed);

    // The writer keeps going; nothing more may arrive.
    sleep(Duration::from_millis(300)).await;
    assert!(handle.try_recv().is_none());
    assert!(handle.recv().await.is_none());

    let err = handle.close().unwrap_err();
    assert_eq!(err.code(), "ERR_FS_WATCHER_NOT_STARTED");

    assert!(writer.stop().await > 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_file_watch_reports_file_name() {
    if PlatformFamily::native() == PlatformFamily::Polling {
        return;
    }

    let scratch = ScratchDir::new();
    let dir = scratch.mkdir("watch2");
    let file = dir.join("bar");
    let content = sample_content();
    std::fs::write(&file, &content).unwrap();

    let mut handle = watch(file.as_path(), WatchConfig::default()).unwrap();
    let writer = Writer::spawn(&file, &content);

    let event = first_event(&mut handle).await;
    assert_rewrite(&event, handle.family(), "bar");
    assert_ne!(event.entry_name.as_deref(), Some("watch2"));

    handle.close().unwrap();
    writer.stop().await;
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn test_file_watch_through_symlink_reports_link_name() {
    if PlatformFamily::native() == PlatformFamily::Polling {
        return;
    }

    let scratch = ScratchDir::new();
    let dir = scratch.mkdir("watch2");
    let real = dir.join("real_bar");
    let link = dir.join("bar");
    let content = sample_content();
    std::fs::write(&real, &content).unwrap();
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let mut handle = watch(link.as_path(), WatchConfig::default()).unwrap();
    let writer = Writer::spawn(&real, &content);

    let event = first_event(&mut handle).await;
    assert_rewrite(&event, handle.family(), "bar");

    handle.close().unwrap();
    writer.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_recursive_watch_reports_relative_name() {
    let scratch = ScratchDir::new();
    let dir = scratch.mkdir("watch3");
    std::fs::create_dir(dir.join("sub")).unwrap();
    let file = dir.join("sub").join("baz");
    let content = sample_content();
    std::fs::write(&file, &content).unwrap();

    let config = WatchConfig::default().with_recursive(true);
    let mut handle = watch(dir.as_path(), config).unwrap();
    let writer = Writer::spawn(&file, &content);

    let event = first_event(&mut handle).await;
    assert_rewrite(&event, handle.family(), "sub/baz");

    handle.close().unwrap();
    writer.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_poll_backend_directory_watch() {
    let scratch = ScratchDir::new();
    let dir = scratch.mkdir("watch4");
    let file = dir.join("foo");
    let content = sample_content();
    std::fs::write(&file, &content).unwrap();

    let config = WatchConfig::default().with_backend(BackendChoice::Poll { interval_ms: 50 });
    let mut handle = watch(dir.as_path(), config).unwrap();
    assert_eq!(handle.family(), PlatformFamily::Polling);

    let writer = Writer::spawn(&file, &content);
    let event = first_event(&mut handle).await;
    assert_rewrite(&event, PlatformFamily::Polling, "foo");

    handle.close().unwrap();
    writer.stop().await;
}

#[test]
fn test_rejected_target_shapes() {
    let shapes = [
        Some(json!(false)),
        Some(json!(1)),
        Some(json!({})),
        Some(json!([])),
        Some(Value::Null),
        None,
    ];

    for shape in &shapes {
        let err = watch(shape.as_ref(), WatchConfig::default()).unwrap_err();
        assert_eq!(err.code(), "ERR_INVALID_ARG_TYPE", "shape {shape:?}");
        assert!(err.is_argument());
    }
}

#[tokio::test]
async fn test_accepted_target_representations() {
    let scratch = ScratchDir::new();
    let dir = scratch.mkdir("accepted");
    let text = dir.to_str().unwrap().to_owned();
    let url = Url::from_directory_path(&dir).unwrap();

    let mut handles = vec![
        watch(text.as_str(), WatchConfig::default()).unwrap(),
        watch(text.clone(), WatchConfig::default()).unwrap(),
        watch(dir.clone(), WatchConfig::default()).unwrap(),
        watch(text.as_bytes(), WatchConfig::default()).unwrap(),
        watch(&url, WatchConfig::default()).unwrap(),
        watch(&json!(text), WatchConfig::default()).unwrap(),
    ];

    for handle in &mut handles {
        assert!(handle.is_running());
        handle.close().unwrap();
    }
}

#[test]
fn test_invalid_url_targets() {
    let http = Url::parse("http://example.com/watch1").unwrap();
    let err = watch(&http, WatchConfig::default()).unwrap_err();
    assert_eq!(err.code(), "ERR_INVALID_URL_SCHEME");

    let remote = Url::parse("file://fileserver/watch1").unwrap();
    let err = watch(&remote, WatchConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        WatchError::InvalidFileUrlHost { .. } | WatchError::InvalidFileUrlPath
    ));
}

#[test]
fn test_empty_path_rejected() {
    let err = watch("", WatchConfig::default()).unwrap_err();
    assert_eq!(err.code(), "ERR_INVALID_ARG_VALUE");
}

#[test]
fn test_missing_target_fails_with_enoent() {
    let scratch = ScratchDir::new();
    let missing = scratch.path().join("missing");

    let err = watch(missing.as_path(), WatchConfig::default()).unwrap_err();
    assert_eq!(err.code(), "ENOENT");
    assert!(err.is_backend());

    let mut handle = WatchHandle::new(WatchTarget::new(&missing).unwrap(), WatchConfig::default());
    assert!(handle.start().is_err());
    assert_eq!(handle.state(), WatchState::Unstarted);

    // The handle can still be started once the path exists.
    std::fs::create_dir(&missing).unwrap();
    handle.start().unwrap();
    handle.close().unwrap();
}

#[tokio::test]
async fn test_close_before_any_event() {
    let scratch = ScratchDir::new();
    let dir = scratch.mkdir("quiet");

    let mut handle = watch(dir.as_path(), WatchConfig::default()).unwrap();
    handle.close().unwrap();

    std::fs::write(dir.join("late"), "x").unwrap();
    sleep(Duration::from_millis(200)).await;
    assert!(handle.recv().await.is_none());
}
