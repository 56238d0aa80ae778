//! The path watch handle.
//!
//! This module provides [`WatchHandle`], which owns exactly one native
//! registration for one path and turns the backend's notifications into a
//! stream of [`NormalizedEvent`]s.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                 Backend dispatch thread (notify)              │
//! │  ┌──────────────┐    ┌──────────────────────────────────┐     │
//! │  │ Backend      │ -> │ RawSink                          │     │
//! │  │ (native/poll)│    │ drops everything unless Running  │     │
//! │  └──────────────┘    └────────────────┬─────────────────┘     │
//! └───────────────────────────────────────│───────────────────────┘
//!                                         │ unbounded send
//!                                         ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        Consumer task                          │
//! │  ┌──────────────┐    ┌──────────────┐                         │
//! │  │ WatchHandle  │ -> │ normalize()  │ -> Some(Ok(event))      │
//! │  │ recv()       │    └──────────────┘    Some(Err(failure))   │
//! │  └──────────────┘                        None (closed)        │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! ```text
//! Unstarted --start()--> Running --close()--> Closed
//!                           └----backend failure----┘
//! ```
//!
//! `start` on a Running or Closed handle fails with
//! `ERR_FS_WATCHER_ALREADY_STARTED`; `close` on an Unstarted or Closed handle
//! fails with `ERR_FS_WATCHER_NOT_STARTED`. Neither failure changes state.
//!
//! # Usage
//!
//! ```no_run
//! use pw_core::WatchConfig;
//!
//! # async fn example() -> Result<(), pw_watcher::WatchError> {
//! let mut handle = pw_watcher::watch("watch1", WatchConfig::default())?;
//!
//! while let Some(delivery) = handle.recv().await {
//!     let event = delivery?;
//!     println!("{} {:?}", event.kind, event.entry_name);
//!     handle.close()?;
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use pw_core::WatchConfig;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::backend::{family_for, open_backend, Backend, RawSink};
use crate::error::WatchError;
use crate::event::NormalizedEvent;
use crate::normalize::normalize;
use crate::raw::{PlatformFamily, RawEvent};
use crate::target::{IntoWatchTarget, ResolvedTarget, WatchTarget};

/// Lifecycle state of a [`WatchHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchState {
    /// Built, not yet registered.
    Unstarted,
    /// Registered and delivering events.
    Running,
    /// Closed by the caller or by a backend failure. Terminal.
    Closed,
}

type Delivery = Result<RawEvent, WatchError>;

/// Outcome of handling one message from the backend channel.
enum Step {
    Deliver(Result<NormalizedEvent, WatchError>),
    Skip,
    End,
}

/// A watch on one file or directory.
///
/// # Event Delivery
///
/// [`recv`](Self::recv) yields, in backend order:
///
/// - `Some(Ok(event))` for each notification that normalizes to an event
/// - `Some(Err(err))` once if the backend fails, after which the handle is
///   Closed and the registration is released
/// - `None` once the handle is closed
///
/// Nothing is delivered after [`close`](Self::close) returns, including
/// notifications that were already buffered.
///
/// # Examples
///
/// ```no_run
/// use pw_core::WatchConfig;
/// use pw_watcher::{WatchHandle, WatchState, WatchTarget};
///
/// # fn example() -> Result<(), pw_watcher::WatchError> {
/// let target = WatchTarget::new("watch2/bar")?;
/// let mut handle = WatchHandle::new(target, WatchConfig::default());
/// assert_eq!(handle.state(), WatchState::Unstarted);
///
/// handle.start()?;
/// assert!(handle.start().is_err());
///
/// handle.close()?;
/// assert_eq!(handle.close().unwrap_err().code(), "ERR_FS_WATCHER_NOT_STARTED");
/// # Ok(())
/// # }
/// ```
pub struct WatchHandle {
    /// The path as supplied by the caller.
    target: WatchTarget,

    /// Options the handle was built with.
    config: WatchConfig,

    /// Family events are normalized for.
    family: PlatformFamily,

    /// State shared with the backend's sink.
    ///
    /// The sink checks it under the lock before forwarding anything, so a
    /// notification can never slip past a completed `close`.
    state: Arc<Mutex<WatchState>>,

    /// The native registration while Running.
    backend: Option<Box<dyn Backend>>,

    /// Target bound to the filesystem at start.
    resolved: Option<ResolvedTarget>,

    /// Raw notifications from the sink. Dropped on close.
    event_rx: Option<mpsc::UnboundedReceiver<Delivery>>,
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle")
            .field("target", &self.target)
            .field("family", &self.family)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Validates `target` and starts watching it.
///
/// Validation runs first and fails with an argument error without touching
/// any native resource.
///
/// # Errors
///
/// Argument errors for an unacceptable target, or the backend error if the
/// registration fails (`ENOENT` for a missing path).
pub fn watch(target: impl IntoWatchTarget, config: WatchConfig) -> Result<WatchHandle, WatchError> {
    let mut handle = WatchHandle::new(target.into_watch_target()?, config);
    handle.start()?;
    Ok(handle)
}

impl WatchHandle {
    /// Creates an Unstarted handle.
    #[must_use]
    pub fn new(target: WatchTarget, config: WatchConfig) -> Self {
        Self {
            target,
            config,
            family: family_for(config.backend),
            state: Arc::new(Mutex::new(WatchState::Unstarted)),
            backend: None,
            resolved: None,
            event_rx: None,
        }
    }

    /// Registers the target with the configured backend.
    ///
    /// # Errors
    ///
    /// - [`WatchError::AlreadyStarted`] if the handle is Running or Closed.
    /// - A backend error if the path cannot be resolved or registered; the
    ///   handle stays Unstarted and may be started again.
    pub fn start(&mut self) -> Result<(), WatchError> {
        let choice = self.config.backend;
        self.start_with(|sink| open_backend(choice, sink))
    }

    /// Starts with a caller-provided backend opener.
    pub(crate) fn start_with<F>(&mut self, open: F) -> Result<(), WatchError>
    where
        F: FnOnce(RawSink) -> Result<Box<dyn Backend>, WatchError>,
    {
        if *self.state.lock() != WatchState::Unstarted {
            return Err(WatchError::AlreadyStarted);
        }

        let resolved = self.target.resolve(self.config.recursive)?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let sink = make_sink(Arc::clone(&self.state), event_tx);

        let mut backend = open(sink).map_err(|err| err.with_path(resolved.path()))?;
        self.family = backend.family();

        // Running before registering, so nothing reported during
        // registration is discarded.
        *self.state.lock() = WatchState::Running;
        if let Err(err) = backend.register(resolved.path(), resolved.recursive()) {
            *self.state.lock() = WatchState::Unstarted;
            tracing::debug!(path = %resolved.path().display(), error = %err, "Registration failed");
            return Err(err);
        }

        tracing::info!(
            path = %resolved.path().display(),
            family = %self.family,
            recursive = resolved.recursive(),
            "Watch started"
        );

        self.backend = Some(backend);
        self.resolved = Some(resolved);
        self.event_rx = Some(event_rx);
        Ok(())
    }

    /// Stops watching and releases the native registration.
    ///
    /// Buffered notifications are discarded; subsequent calls to
    /// [`recv`](Self::recv) return `None`.
    ///
    /// A handle closed by a backend failure still holds its registration
    /// until the failure is received; `close` releases it then too, while
    /// leaving the failure available to [`recv`](Self::recv).
    ///
    /// # Errors
    ///
    /// [`WatchError::NotStarted`] if the handle is Unstarted or Closed
    /// (including after a backend failure).
    pub fn close(&mut self) -> Result<(), WatchError> {
        let previous = {
            let mut state = self.state.lock();
            let previous = *state;
            if previous == WatchState::Running {
                *state = WatchState::Closed;
            }
            previous
        };
        match previous {
            WatchState::Running => {}
            WatchState::Closed => {
                self.release();
                return Err(WatchError::NotStarted);
            }
            WatchState::Unstarted => return Err(WatchError::NotStarted),
        }

        self.event_rx = None;
        self.release();
        tracing::info!(path = %self.target.path().display(), "Watch closed");
        Ok(())
    }

    /// Receives the next event or backend failure.
    ///
    /// Returns `None` when the handle is not running and nothing remains to
    /// deliver.
    pub async fn recv(&mut self) -> Option<Result<NormalizedEvent, WatchError>> {
        loop {
            let delivery = self.event_rx.as_mut()?.recv().await;
            match self.step(delivery) {
                Step::Deliver(out) => return Some(out),
                Step::Skip => {}
                Step::End => return None,
            }
        }
    }

    /// Receives an event or failure if one is ready, without waiting.
    ///
    /// `None` means nothing is ready right now; check
    /// [`is_running`](Self::is_running) to tell an idle watch from a closed one.
    pub fn try_recv(&mut self) -> Option<Result<NormalizedEvent, WatchError>> {
        loop {
            let delivery = match self.event_rx.as_mut()?.try_recv() {
                Ok(delivery) => Some(delivery),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => None,
            };
            match self.step(delivery) {
                Step::Deliver(out) => return Some(out),
                Step::Skip => {}
                Step::End => return None,
            }
        }
    }

    /// Returns the current lifecycle state.
    ///
    /// A backend failure makes this `Closed` as soon as it is reported, before
    /// the failure itself is received.
    #[must_use]
    pub fn state(&self) -> WatchState {
        *self.state.lock()
    }

    /// Returns `true` while the handle is Running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == WatchState::Running
    }

    /// Returns the target as supplied.
    #[must_use]
    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Returns the target as resolved at start, if started.
    #[must_use]
    pub fn resolved(&self) -> Option<&ResolvedTarget> {
        self.resolved.as_ref()
    }

    /// Returns the options the handle was built with.
    #[must_use]
    pub const fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Returns the backend family events are normalized for.
    #[must_use]
    pub const fn family(&self) -> PlatformFamily {
        self.family
    }

    fn step(&mut self, delivery: Option<Delivery>) -> Step {
        match delivery {
            None => {
                self.event_rx = None;
                Step::End
            }
            Some(Err(err)) => {
                tracing::warn!(code = err.code(), error = %err, "Watch backend failed");
                self.event_rx = None;
                self.release();
                Step::Deliver(Err(err))
            }
            Some(Ok(raw)) => {
                let Some(resolved) = self.resolved.as_ref() else {
                    return Step::Skip;
                };
                match normalize(&raw, resolved, self.family, self.config.encoding) {
                    Some(event) => Step::Deliver(Ok(event)),
                    None => {
                        tracing::trace!(kind = ?raw.kind, "Notification normalized to nothing");
                        Step::Skip
                    }
                }
            }
        }
    }

    fn release(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            if let Err(err) = backend.unregister() {
                tracing::debug!(error = %err, "Unregister failed during teardown");
            }
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        *self.state.lock() = WatchState::Closed;
        self.release();
    }
}

fn make_sink(state: Arc<Mutex<WatchState>>, event_tx: mpsc::UnboundedSender<Delivery>) -> RawSink {
    Arc::new(move |delivery: Delivery| {
        let mut state = state.lock();
        if *state != WatchState::Running {
            tracing::trace!("Discarding notification for inactive watch");
            return;
        }
        if delivery.is_err() {
            *state = WatchState::Closed;
        }
        if event_tx.send(delivery).is_err() {
            tracing::debug!("Event receiver dropped, discarding notification");
        }
    })
}
