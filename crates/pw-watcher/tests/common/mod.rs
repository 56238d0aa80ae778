//! Shared fixtures for the watch scenarios.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Upper bound on how long a scenario waits for its first event.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

/// A caller-owned scratch directory, removed on drop.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create scratch directory"),
        }
    }

    /// Discards the current contents and returns a fresh, empty directory.
    ///
    /// The path is canonical so it compares equal to what backends report.
    pub fn refresh(&mut self) -> PathBuf {
        self.dir = TempDir::new().expect("Failed to create scratch directory");
        self.path()
    }

    pub fn path(&self) -> PathBuf {
        self.dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize scratch directory")
    }

    /// Creates a subdirectory and returns its path.
    pub fn mkdir(&self, name: &str) -> PathBuf {
        let path = self.path().join(name);
        std::fs::create_dir_all(&path).expect("Failed to create directory");
        path
    }
}

/// Background task that keeps clearing and rewriting one file.
pub struct Writer {
    stop: watch::Sender<bool>,
    task: JoinHandle<u32>,
}

impl Writer {
    /// Starts rewriting `path` with `content` every 100 ms.
    pub fn spawn(path: &Path, content: &str) -> Self {
        let (stop, mut stopped) = watch::channel(false);
        let path = path.to_path_buf();
        let content = content.to_owned();

        let task = tokio::spawn(async move {
            let mut rounds = 0;
            let mut ticker = tokio::time::interval(Duration::from_millis(100));
            loop {
                tokio::select! {
                    _ = stopped.changed() => break,
                    _ = ticker.tick() => {
                        tokio::fs::write(&path, "").await.expect("Failed to clear file");
                        tokio::fs::write(&path, &content).await.expect("Failed to write file");
                        rounds += 1;
                    }
                }
            }
            rounds
        });

        Self { stop, task }
    }

    /// Stops the loop and returns how many rewrites it made.
    pub async fn stop(self) -> u32 {
        let _ = self.stop.send(true);
        self.task.await.expect("Writer task panicked")
    }
}

/// Long, repetitive content so each rewrite is a visible content change.
pub fn sample_content() -> String {
    "the quick brown fox jumps over the lazy dog\n"
        .repeat(64)
        .to_uppercase()
}
