//! Normalized event types.
//!
//! Every backend notification that survives normalization becomes a
//! [`NormalizedEvent`]: an [`EventKind`] plus the name of the entry it
//! concerns, when one is known.
//!
//! # Event Flow
//!
//! ```text
//! native backend notification
//!        │
//!        ▼
//!   RawEvent (raw.rs)
//!        │
//!        ▼
//!   normalize() ──► zero or one NormalizedEvent
//!        │
//!        ▼
//!   WatchHandle::recv()
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Classification of a change.
///
/// `Rename` covers entries appearing, disappearing, or being renamed.
/// `Change` covers content or metadata modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// An entry was created, removed, or renamed.
    Rename,
    /// An entry's content or metadata was modified.
    Change,
}

impl EventKind {
    /// Returns `"rename"` or `"change"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rename => "rename",
            Self::Change => "change",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown event kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event kind '{0}'")]
pub struct ParseEventKindError(String);

impl FromStr for EventKind {
    type Err = ParseEventKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rename" => Ok(Self::Rename),
            "change" => Ok(Self::Change),
            other => Err(ParseEventKindError(other.to_owned())),
        }
    }
}

/// A change notification in its uniform shape.
///
/// `entry_name` is the changed entry's name relative to a watched directory,
/// the watched file's own name when a file is watched, or `None` when the
/// backend supplied nothing to attribute the change to.
///
/// # Examples
///
/// ```
/// use pw_watcher::{EventKind, NormalizedEvent};
///
/// let event = NormalizedEvent::change("foo");
/// assert_eq!(event.kind, EventKind::Change);
/// assert_eq!(event.entry_name.as_deref(), Some("foo"));
/// assert_eq!(event.to_string(), "change foo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// What kind of change happened.
    pub kind: EventKind,

    /// Which entry changed, if the backend could tell.
    pub entry_name: Option<String>,
}

impl NormalizedEvent {
    /// Creates an event of the given kind.
    #[inline]
    #[must_use]
    pub const fn new(kind: EventKind, entry_name: Option<String>) -> Self {
        Self { kind, entry_name }
    }

    /// Creates a `rename` event for `name`.
    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self::new(EventKind::Rename, Some(name.into()))
    }

    /// Creates a `change` event for `name`.
    #[must_use]
    pub fn change(name: impl Into<String>) -> Self {
        Self::new(EventKind::Change, Some(name.into()))
    }

    /// Returns `true` for `rename` events.
    #[inline]
    #[must_use]
    pub fn is_rename(&self) -> bool {
        self.kind == EventKind::Rename
    }

    /// Returns `true` for `change` events.
    #[inline]
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.kind == EventKind::Change
    }
}

impl fmt::Display for NormalizedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entry_name {
            Some(name) => write!(f, "{} {name}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}
