//! Raw backend notifications and platform families.
//!
//! A [`RawEvent`] is what a backend reported, reduced to the handful of kinds
//! the normalizer cares about. [`PlatformFamily`] names the flavour of native
//! mechanism that produced it, since classification rules depend on it.

use std::fmt;
use std::path::PathBuf;

use notify::event::{ModifyKind, RenameMode};
use smallvec::SmallVec;

use crate::event::EventKind;

/// Family of native notification mechanism behind a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    /// Linux/Android inotify.
    Inotify,
    /// BSD kqueue.
    KernelQueue,
    /// Windows `ReadDirectoryChangesW`.
    DirectoryChanges,
    /// macOS `FSEvents` journal.
    FsEvents,
    /// Periodic stat comparison.
    Polling,
}

impl PlatformFamily {
    /// The family of the native backend on this platform.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(any(target_os = "linux", target_os = "android")) {
            Self::Inotify
        } else if cfg!(target_os = "macos") {
            Self::FsEvents
        } else if cfg!(target_os = "windows") {
            Self::DirectoryChanges
        } else if cfg!(any(
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly",
            target_os = "ios"
        )) {
            Self::KernelQueue
        } else {
            Self::Polling
        }
    }

    /// Returns `true` when the backend reports content modification
    /// separately from entries appearing or disappearing.
    #[must_use]
    pub const fn distinguishes_content_changes(self) -> bool {
        matches!(
            self,
            Self::Inotify | Self::KernelQueue | Self::DirectoryChanges
        )
    }

    /// Event kinds a caller must accept for a content rewrite on this family.
    ///
    /// Journal-style and polling backends coalesce a truncate-and-rewrite (or
    /// an editor's write-temp-then-rename-over) with entry creation, so either
    /// classification is correct there.
    #[must_use]
    pub const fn content_rewrite_kinds(self) -> &'static [EventKind] {
        if self.distinguishes_content_changes() {
            &[EventKind::Change]
        } else {
            &[EventKind::Rename, EventKind::Change]
        }
    }

    /// Returns `true` when the backend reports entry-set changes of a
    /// directory as a modification of the directory itself.
    #[must_use]
    pub const fn reports_directory_writes(self) -> bool {
        matches!(self, Self::KernelQueue | Self::Polling)
    }

    /// Returns the lowercase family name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inotify => "inotify",
            Self::KernelQueue => "kqueue",
            Self::DirectoryChanges => "directory-changes",
            Self::FsEvents => "fsevents",
            Self::Polling => "polling",
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-level kind of a raw notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawKind {
    /// An entry appeared.
    Create,
    /// An entry disappeared.
    Remove,
    /// One half of a rename (old or new name), or a rename of unknown shape.
    Rename,
    /// Both halves of a rename in one notification. The halves are also
    /// reported on their own.
    RenamePair,
    /// Content was written.
    ModifyData,
    /// Permissions, timestamps, or other metadata changed.
    ModifyMetadata,
    /// Something was modified, the backend does not say what.
    ModifyAny,
    /// An entry was opened, read, or closed.
    Access,
    /// The backend signalled activity without classifying it.
    Any,
    /// Backend-specific notification with no filesystem meaning.
    Other,
}

/// A notification as delivered by a backend.
///
/// Most notifications carry one path; renames reported as pairs carry two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Backend-level kind.
    pub kind: RawKind,

    /// Paths the notification concerns, possibly none.
    pub paths: SmallVec<[PathBuf; 2]>,
}

impl RawEvent {
    /// Creates a raw event for a single path.
    #[must_use]
    pub fn new(kind: RawKind, path: impl Into<PathBuf>) -> Self {
        let mut paths = SmallVec::new();
        paths.push(path.into());
        Self { kind, paths }
    }

    /// Creates a raw event that names no path.
    #[must_use]
    pub fn unnamed(kind: RawKind) -> Self {
        Self {
            kind,
            paths: SmallVec::new(),
        }
    }

    /// Returns the first reported path.
    #[inline]
    #[must_use]
    pub fn primary_path(&self) -> Option<&PathBuf> {
        self.paths.first()
    }
}

impl From<notify::Event> for RawEvent {
    fn from(event: notify::Event) -> Self {
        let kind = match event.kind {
            notify::EventKind::Create(_) => RawKind::Create,
            notify::EventKind::Remove(_) => RawKind::Remove,
            notify::EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => RawKind::RenamePair,
            notify::EventKind::Modify(ModifyKind::Name(_)) => RawKind::Rename,
            notify::EventKind::Modify(ModifyKind::Data(_)) => RawKind::ModifyData,
            notify::EventKind::Modify(ModifyKind::Metadata(_)) => RawKind::ModifyMetadata,
            notify::EventKind::Modify(ModifyKind::Any | ModifyKind::Other) => RawKind::ModifyAny,
            notify::EventKind::Access(_) => RawKind::Access,
            notify::EventKind::Any => RawKind::Any,
            notify::EventKind::Other => RawKind::Other,
        };
        Self {
            kind,
            paths: event.paths.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};

    fn convert(kind: notify::EventKind) -> RawKind {
        RawEvent::from(notify::Event::new(kind).add_path(PathBuf::from("/w/foo"))).kind
    }

    #[test]
    fn test_notify_kind_mapping() {
        use notify::EventKind as K;

        assert_eq!(convert(K::Create(CreateKind::File)), RawKind::Create);
        assert_eq!(convert(K::Remove(RemoveKind::Any)), RawKind::Remove);
        assert_eq!(
            convert(K::Modify(ModifyKind::Name(RenameMode::From))),
            RawKind::Rename
        );
        assert_eq!(
            convert(K::Modify(ModifyKind::Name(RenameMode::Both))),
            RawKind::RenamePair
        );
        assert_eq!(
            convert(K::Modify(ModifyKind::Data(DataChange::Content))),
            RawKind::ModifyData
        );
        assert_eq!(
            convert(K::Modify(ModifyKind::Metadata(MetadataKind::WriteTime))),
            RawKind::ModifyMetadata
        );
        assert_eq!(convert(K::Modify(ModifyKind::Any)), RawKind::ModifyAny);
        assert_eq!(convert(K::Access(AccessKind::Any)), RawKind::Access);
        assert_eq!(convert(K::Any), RawKind::Any);
        assert_eq!(convert(K::Other), RawKind::Other);
    }

    #[test]
    fn test_conversion_keeps_paths_in_order() {
        let event = notify::Event::new(notify::EventKind::Modify(ModifyKind::Name(
            RenameMode::Both,
        )))
        .add_path(PathBuf::from("/w/old"))
        .add_path(PathBuf::from("/w/new"));

        let raw = RawEvent::from(event);
        assert_eq!(raw.paths.len(), 2);
        assert_eq!(raw.primary_path(), Some(&PathBuf::from("/w/old")));
    }

    #[test]
    fn test_family_capabilities() {
        assert!(PlatformFamily::Inotify.distinguishes_content_changes());
        assert!(PlatformFamily::DirectoryChanges.distinguishes_content_changes());
        assert!(!PlatformFamily::FsEvents.distinguishes_content_changes());
        assert!(!PlatformFamily::Polling.distinguishes_content_changes());

        assert_eq!(
            PlatformFamily::Inotify.content_rewrite_kinds(),
            &[EventKind::Change]
        );
        assert_eq!(
            PlatformFamily::FsEvents.content_rewrite_kinds(),
            &[EventKind::Rename, EventKind::Change]
        );

        assert!(PlatformFamily::KernelQueue.reports_directory_writes());
        assert!(!PlatformFamily::Inotify.reports_directory_writes());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_native_family_on_linux() {
        assert_eq!(PlatformFamily::native(), PlatformFamily::Inotify);
    }

    #[test]
    fn test_unnamed_event() {
        let raw = RawEvent::unnamed(RawKind::Any);
        assert!(raw.primary_path().is_none());
    }
}
