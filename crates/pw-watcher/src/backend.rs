//! Native backend adapters.
//!
//! A [`Backend`] owns one native registration and pushes every notification
//! it receives into a [`RawSink`]. The sink is supplied when the backend is
//! opened, so notifications can start flowing as soon as `register` returns.
//!
//! Two adapters are provided, both on top of `notify`:
//!
//! - [`NativeBackend`]: the platform's recommended mechanism
//! - [`PollBackend`]: periodic stat comparison
//!
//! Which one a handle uses is chosen by [`BackendChoice`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use pw_core::BackendChoice;
use pw_core::config::MIN_POLL_INTERVAL_MS;

use crate::error::WatchError;
use crate::raw::{PlatformFamily, RawEvent};

/// Receiver of raw notifications and asynchronous backend failures.
///
/// Called on the backend's own dispatch thread, serially for one backend.
pub type RawSink = Arc<dyn Fn(Result<RawEvent, WatchError>) + Send + Sync>;

/// One native watch registration.
pub trait Backend: Send {
    /// Family of the native mechanism, for event normalization.
    fn family(&self) -> PlatformFamily;

    /// Registers `path` with the native mechanism.
    fn register(&mut self, path: &Path, recursive: bool) -> Result<(), WatchError>;

    /// Removes the registration. A no-op when nothing is registered.
    fn unregister(&mut self) -> Result<(), WatchError>;
}

/// Adapter over any `notify` watcher.
pub struct NotifyBackend<W> {
    watcher: W,
    family: PlatformFamily,
    registered: Option<PathBuf>,
}

/// Backend on the platform's recommended native mechanism.
pub type NativeBackend = NotifyBackend<RecommendedWatcher>;

/// Backend that polls with `stat`.
pub type PollBackend = NotifyBackend<PollWatcher>;

impl<W> std::fmt::Debug for NotifyBackend<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyBackend")
            .field("family", &self.family)
            .field("registered", &self.registered)
            .finish_non_exhaustive()
    }
}

impl NativeBackend {
    /// Opens the native mechanism. Nothing is registered yet.
    pub fn open(sink: RawSink) -> Result<Self, WatchError> {
        let watcher = RecommendedWatcher::new(forward_to(sink), notify::Config::default())
            .map_err(|err| WatchError::from_notify(err, Path::new("")))?;
        Ok(Self {
            watcher,
            family: PlatformFamily::native(),
            registered: None,
        })
    }
}

impl PollBackend {
    /// Opens a poller that compares entries every `interval`.
    ///
    /// Intervals shorter than [`MIN_POLL_INTERVAL_MS`] are raised to it.
    pub fn open(sink: RawSink, interval: Duration) -> Result<Self, WatchError> {
        let interval = interval.max(Duration::from_millis(MIN_POLL_INTERVAL_MS));
        let config = notify::Config::default().with_poll_interval(interval);
        let watcher = PollWatcher::new(forward_to(sink), config)
            .map_err(|err| WatchError::from_notify(err, Path::new("")))?;
        Ok(Self {
            watcher,
            family: PlatformFamily::Polling,
            registered: None,
        })
    }
}

impl<W: Watcher + Send> Backend for NotifyBackend<W> {
    fn family(&self) -> PlatformFamily {
        self.family
    }

    fn register(&mut self, path: &Path, recursive: bool) -> Result<(), WatchError> {
        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        self.watcher
            .watch(path, mode)
            .map_err(|err| WatchError::from_notify(err, path))?;
        self.registered = Some(path.to_path_buf());
        Ok(())
    }

    fn unregister(&mut self) -> Result<(), WatchError> {
        let Some(path) = self.registered.take() else {
            return Ok(());
        };
        self.watcher
            .unwatch(&path)
            .map_err(|err| WatchError::from_notify(err, &path))
    }
}

/// Opens the adapter selected by `choice`.
pub fn open_backend(choice: BackendChoice, sink: RawSink) -> Result<Box<dyn Backend>, WatchError> {
    match choice {
        BackendChoice::Native => Ok(Box::new(NativeBackend::open(sink)?)),
        BackendChoice::Poll { interval_ms } => Ok(Box::new(PollBackend::open(
            sink,
            Duration::from_millis(interval_ms),
        )?)),
    }
}

/// Family a handle will use for `choice`, known before anything is opened.
#[must_use]
pub const fn family_for(choice: BackendChoice) -> PlatformFamily {
    match choice {
        BackendChoice::Native => PlatformFamily::native(),
        BackendChoice::Poll { .. } => PlatformFamily::Polling,
    }
}

fn forward_to(sink: RawSink) -> impl FnMut(notify::Result<notify::Event>) + Send + 'static {
    move |result| match result {
        Ok(event) => sink(Ok(RawEvent::from(event))),
        Err(err) => sink(Err(WatchError::from_notify(err, Path::new("")))),
    }
}
