//! Translation of raw backend notifications into [`NormalizedEvent`]s.
//!
//! This is the only place where platform divergence is reconciled. The
//! function is pure: the same raw event, target, family, and encoding always
//! produce the same result.
//!
//! # Classification
//!
//! | Raw kind | Result |
//! |----------|--------|
//! | create, remove, rename | `rename` |
//! | data, metadata, unclassified modify, bare "something changed" | `change` |
//! | modify of a watched directory itself on kqueue/polling | `rename` |
//! | access, rename pair, other | dropped |
//!
//! Journal-style (`FSEvents`) and polling backends coalesce rewrites with
//! creation, so for them a content rewrite may surface as either kind; see
//! [`PlatformFamily::content_rewrite_kinds`].
//!
//! # Entry names
//!
//! - File target: always the file's own leaf name.
//! - Directory target: the entry's path relative to the directory (leaf name
//!   when not recursive, `/`-separated when recursive), the directory's own
//!   leaf name for notifications about the directory itself, `None` when the
//!   backend named nothing.

use std::ffi::OsStr;
use std::path::{Component, Path};

use pw_core::Encoding;

use crate::event::{EventKind, NormalizedEvent};
use crate::raw::{PlatformFamily, RawEvent, RawKind};
use crate::target::{os_bytes, ResolvedTarget, TargetKind};

/// Normalizes one raw notification.
///
/// Returns `None` when the notification carries no reportable change.
///
/// # Examples
///
/// ```
/// use pw_core::Encoding;
/// use pw_watcher::{normalize, NormalizedEvent, PlatformFamily, RawEvent, RawKind};
/// use pw_watcher::target::{ResolvedTarget, TargetKind};
///
/// let target = ResolvedTarget::new("/tmp/watch1", TargetKind::Directory, false);
/// let raw = RawEvent::new(RawKind::ModifyData, "/tmp/watch1/foo");
///
/// let event = normalize(&raw, &target, PlatformFamily::Inotify, Encoding::Utf8);
/// assert_eq!(event, Some(NormalizedEvent::change("foo")));
/// ```
#[must_use]
pub fn normalize(
    raw: &RawEvent,
    target: &ResolvedTarget,
    family: PlatformFamily,
    encoding: Encoding,
) -> Option<NormalizedEvent> {
    match target.kind() {
        TargetKind::File => {
            if !concerns_file(raw, target) {
                return None;
            }
            let kind = classify(raw.kind, family, false)?;
            let entry_name = target.leaf_name().map(|leaf| render(leaf, encoding));
            Some(NormalizedEvent::new(kind, entry_name))
        }
        TargetKind::Directory => {
            let path = raw.primary_path();
            let on_self = path.is_some_and(|p| p == target.path());
            let kind = classify(raw.kind, family, on_self)?;
            let entry_name = path.and_then(|p| directory_entry_name(p, target, encoding));
            Some(NormalizedEvent::new(kind, entry_name))
        }
    }
}

fn classify(kind: RawKind, family: PlatformFamily, on_watched_dir: bool) -> Option<EventKind> {
    match kind {
        RawKind::Access | RawKind::RenamePair | RawKind::Other => None,
        RawKind::Create | RawKind::Remove | RawKind::Rename => Some(EventKind::Rename),
        RawKind::ModifyData | RawKind::ModifyMetadata | RawKind::ModifyAny | RawKind::Any => {
            if on_watched_dir && family.reports_directory_writes() {
                // kqueue and polling see an entry added or removed only as a
                // write to the directory.
                Some(EventKind::Rename)
            } else {
                Some(EventKind::Change)
            }
        }
    }
}

/// A file target is concerned by notifications that name it, name its parent
/// directory, or name nothing. Anything else is a sibling.
///
/// Backends report resolved paths, so this compares against the resolved
/// leaf, not the reported one.
fn concerns_file(raw: &RawEvent, target: &ResolvedTarget) -> bool {
    if raw.paths.is_empty() {
        return true;
    }
    let leaf = target.path().file_name();
    let parent = target.path().parent();
    raw.paths
        .iter()
        .any(|p| p.file_name() == leaf || Some(p.as_path()) == parent)
}

fn directory_entry_name(path: &Path, target: &ResolvedTarget, encoding: Encoding) -> Option<String> {
    let Ok(relative) = path.strip_prefix(target.path()) else {
        // Reported outside the resolved prefix (e.g. through another link):
        // the leaf is the best attribution available.
        return path.file_name().map(|leaf| render(leaf, encoding));
    };
    if relative.as_os_str().is_empty() {
        return target.leaf_name().map(|leaf| render(leaf, encoding));
    }
    if !target.recursive() {
        return relative.file_name().map(|leaf| render(leaf, encoding));
    }

    let mut bytes = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            if !bytes.is_empty() {
                bytes.push(b'/');
            }
            bytes.extend_from_slice(&os_bytes(part));
        }
    }
    Some(render_bytes(&bytes, encoding))
}

fn render(name: &OsStr, encoding: Encoding) -> String {
    render_bytes(&os_bytes(name), encoding)
}

fn render_bytes(bytes: &[u8], encoding: Encoding) -> String {
    if encoding == Encoding::Utf8 && std::str::from_utf8(bytes).is_err() {
        tracing::warn!(
            name = %String::from_utf8_lossy(bytes),
            "Entry name is not valid UTF-8, replacing invalid sequences"
        );
    }
    encoding.render(bytes)
}
