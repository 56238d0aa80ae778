//! Single-path filesystem watching with normalized events.
//!
//! This crate watches one file or directory through the platform's native
//! notification mechanism (or a stat poller) and reports each observed change
//! as a [`NormalizedEvent`]: a `rename` or `change` kind plus the name of the
//! affected entry.
//!
//! # Overview
//!
//! The pw-watcher crate is designed to:
//!
//! - Validate watch targets before touching any native resource
//! - Hide backend differences behind one two-kind event model
//! - Enforce a strict Unstarted → Running → Closed lifecycle
//! - Report asynchronous backend failures once, in order with events
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  IntoWatchTarget  ┌──────────────┐  resolve   ┌────────────────┐
//! │ str / bytes /│ ────────────────> │ WatchTarget  │ ─────────> │ ResolvedTarget │
//! │ URL / JSON   │  (argument errs)  └──────────────┘  (ENOENT)  └───────┬────────┘
//! └──────────────┘                                                       │
//!                                                                        ▼
//! ┌──────────────┐     RawEvent      ┌──────────────┐ normalize  ┌────────────────┐
//! │ Backend      │ ────────────────> │ WatchHandle  │ ─────────> │NormalizedEvent │
//! │ (notify)     │   unbounded mpsc  │ (lifecycle)  │            └────────────────┘
//! └──────────────┘                   └──────────────┘
//! ```
//!
//! # Crate Dependencies
//!
//! ```text
//! pw-cli ──► pw-watcher ──► pw-core
//! ```
//!
//! # Usage
//!
//! ## Watching a directory
//!
//! ```no_run
//! use pw_core::WatchConfig;
//! use pw_watcher::EventKind;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut handle = pw_watcher::watch("watch1", WatchConfig::default())?;
//!
//!     while let Some(delivery) = handle.recv().await {
//!         let event = delivery?;
//!         if event.kind == EventKind::Change {
//!             println!("{} changed", event.entry_name.unwrap_or_default());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Rejected targets
//!
//! ```
//! use pw_core::WatchConfig;
//! use serde_json::json;
//!
//! let err = pw_watcher::watch(&json!(false), WatchConfig::default()).unwrap_err();
//! assert_eq!(err.code(), "ERR_INVALID_ARG_TYPE");
//! assert_eq!(
//!     err.to_string(),
//!     "The \"filename\" argument must be one of type string, Buffer, or URL"
//! );
//! ```
//!
//! ## Normalizing a raw notification
//!
//! ```
//! use pw_core::Encoding;
//! use pw_watcher::{normalize, NormalizedEvent, PlatformFamily, RawEvent, RawKind};
//! use pw_watcher::target::{ResolvedTarget, TargetKind};
//!
//! let target = ResolvedTarget::new("/tmp/watch2/bar", TargetKind::File, false);
//! let raw = RawEvent::new(RawKind::ModifyData, "/tmp/watch2/bar");
//!
//! assert_eq!(
//!     normalize(&raw, &target, PlatformFamily::Inotify, Encoding::Utf8),
//!     Some(NormalizedEvent::change("bar"))
//! );
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod event;
pub mod normalize;
pub mod raw;
pub mod target;
pub mod watcher;

pub use backend::{open_backend, Backend, NativeBackend, PollBackend, RawSink};
pub use error::{ReceivedType, WatchError};
pub use event::{EventKind, NormalizedEvent, ParseEventKindError};
pub use normalize::normalize;
pub use raw::{PlatformFamily, RawEvent, RawKind};
pub use target::{IntoWatchTarget, ResolvedTarget, TargetKind, WatchTarget};
pub use watcher::{watch, WatchHandle, WatchState};
