//! Watch targets and their validation.
//!
//! A [`WatchTarget`] is built from one of the accepted path representations:
//!
//! - a textual path (`&str`, `String`, `&Path`, `PathBuf`, `OsString`)
//! - a binary path (`&[u8]`, `Vec<u8>`)
//! - a `file:` URL ([`url::Url`])
//!
//! Untyped input, such as a `target` read from a JSON configuration file, goes
//! through [`WatchTarget::from_value`], which accepts strings only and rejects
//! every other shape with `ERR_INVALID_ARG_TYPE`.
//!
//! Validation never touches the filesystem. Whether the path exists, and
//! whether it is a file or a directory, is decided when the watch starts
//! ([`WatchTarget::resolve`]).
//!
//! # Examples
//!
//! ```
//! use pw_watcher::{IntoWatchTarget, WatchTarget};
//!
//! let target = "watch1/foo".into_watch_target().unwrap();
//! assert_eq!(target.leaf_name().and_then(|n| n.to_str()), Some("foo"));
//!
//! let err = WatchTarget::from_value(Some(&serde_json::json!(false))).unwrap_err();
//! assert_eq!(err.code(), "ERR_INVALID_ARG_TYPE");
//! ```

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use serde_json::Value;
use url::Url;

use crate::error::{ReceivedType, WatchError};

/// A validated path to watch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchTarget {
    path: PathBuf,
}

impl WatchTarget {
    /// Validates a textual path.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, WatchError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(WatchError::InvalidArgValue {
                reason: "must not be empty",
            });
        }
        if os_bytes(path.as_os_str()).contains(&0) {
            return Err(WatchError::InvalidArgValue {
                reason: "must be a string without null bytes",
            });
        }
        Ok(Self { path })
    }

    /// Validates a binary path.
    ///
    /// Bytes are taken verbatim on Unix; elsewhere they must be UTF-8.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, WatchError> {
        let bytes = bytes.into();
        #[cfg(unix)]
        let path = {
            use std::os::unix::ffi::OsStringExt;
            OsString::from_vec(bytes)
        };
        #[cfg(not(unix))]
        let path = OsString::from(String::from_utf8(bytes).map_err(|_| {
            WatchError::InvalidArgValue {
                reason: "must be valid UTF-8 on this platform",
            }
        })?);
        Self::new(path)
    }

    /// Validates a `file:` URL.
    pub fn from_url(url: &Url) -> Result<Self, WatchError> {
        if url.scheme() != "file" {
            return Err(WatchError::InvalidUrlScheme {
                scheme: url.scheme().to_owned(),
            });
        }
        if cfg!(not(windows)) {
            if let Some(host) = url.host_str().filter(|h| !h.is_empty() && *h != "localhost") {
                return Err(WatchError::InvalidFileUrlHost {
                    host: host.to_owned(),
                });
            }
        }
        let path = url
            .to_file_path()
            .map_err(|()| WatchError::InvalidFileUrlPath)?;
        Self::new(path)
    }

    /// Validates an untyped value.
    ///
    /// Only JSON strings are paths. `false`, `1`, `{}`, `[]`, `null`, and a
    /// missing value all fail with `ERR_INVALID_ARG_TYPE`.
    pub fn from_value(value: Option<&Value>) -> Result<Self, WatchError> {
        let received = match value {
            Some(Value::String(s)) => return Self::new(s),
            Some(Value::Bool(_)) => ReceivedType::Boolean,
            Some(Value::Number(_)) => ReceivedType::Number,
            Some(Value::Object(_)) => ReceivedType::Object,
            Some(Value::Array(_)) => ReceivedType::Array,
            Some(Value::Null) => ReceivedType::Null,
            None => ReceivedType::Undefined,
        };
        Err(WatchError::invalid_arg_type(received))
    }

    /// Returns the path as supplied.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the final component of the path.
    #[must_use]
    pub fn leaf_name(&self) -> Option<&OsStr> {
        self.path.file_name()
    }

    /// Resolves the target against the filesystem.
    ///
    /// The path is canonicalized so that backend-reported paths (which some
    /// platforms report with symlinks resolved) share its prefix. The leaf
    /// name reported for the target itself stays the one the caller gave, so
    /// a watch through a symlink reports the link's name. `recursive` only
    /// applies to directories.
    pub fn resolve(&self, recursive: bool) -> Result<ResolvedTarget, WatchError> {
        let path = std::fs::canonicalize(&self.path)
            .map_err(|err| WatchError::from_io(err, &self.path))?;
        let kind = if path.is_dir() {
            TargetKind::Directory
        } else {
            TargetKind::File
        };
        let resolved = ResolvedTarget::new(path, kind, recursive);
        Ok(match self.leaf_name() {
            Some(leaf) => resolved.with_display_leaf(leaf),
            None => resolved,
        })
    }
}

/// Whether a resolved target is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// A single file (or any non-directory entry).
    File,
    /// A directory whose entries are observed.
    Directory,
}

/// A target bound to a concrete filesystem entry.
///
/// This is what the normalizer attributes events against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedTarget {
    /// Canonical path, matched against backend-reported paths.
    path: PathBuf,
    kind: TargetKind,
    recursive: bool,
    /// Name reported for the target itself.
    display_leaf: Option<OsString>,
}

impl ResolvedTarget {
    /// Creates a resolved target without touching the filesystem.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: TargetKind, recursive: bool) -> Self {
        let path = path.into();
        let display_leaf = path.file_name().map(OsStr::to_os_string);
        Self {
            path,
            kind,
            recursive: recursive && kind == TargetKind::Directory,
            display_leaf,
        }
    }

    /// Reports `leaf` as the target's own name instead of the resolved
    /// path's final component.
    #[must_use]
    pub fn with_display_leaf(mut self, leaf: impl Into<OsString>) -> Self {
        self.display_leaf = Some(leaf.into());
        self
    }

    /// Returns the resolved path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether this is a file or a directory.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Returns `true` if the subtree of a directory is watched.
    #[inline]
    #[must_use]
    pub const fn recursive(&self) -> bool {
        self.recursive
    }

    /// Returns the name reported for the target itself.
    ///
    /// This is the final component of the path as the caller supplied it,
    /// which differs from [`path`](Self::path)'s when the target was reached
    /// through a symlink.
    #[must_use]
    pub fn leaf_name(&self) -> Option<&OsStr> {
        self.display_leaf.as_deref()
    }
}

/// Conversion into a validated [`WatchTarget`].
///
/// Implemented for every accepted path representation, so
/// [`watch`](crate::watch) can be called with any of them.
pub trait IntoWatchTarget {
    /// Validates `self` as a watch target.
    fn into_watch_target(self) -> Result<WatchTarget, WatchError>;
}

impl IntoWatchTarget for WatchTarget {
    fn into_watch_target(self) -> Result<WatchTarget, WatchError> {
        Ok(self)
    }
}

impl IntoWatchTarget for &str {
    fn into_watch_target(self) -> Result<WatchTarget, WatchError> {
        WatchTarget::new(self)
    }
}

impl IntoWatchTarget for String {
    fn into_watch_target(self) -> Result<WatchTarget, WatchError> {
        WatchTarget::new(self)
    }
}

impl IntoWatchTarget for &Path {
    fn into_watch_target(self) -> Result<WatchTarget, WatchError> {
        WatchTarget::new(self)
    }
}

impl IntoWatchTarget for PathBuf {
    fn into_watch_target(self) -> Result<WatchTarget, WatchError> {
        WatchTarget::new(self)
    }
}

impl IntoWatchTarget for OsString {
    fn into_watch_target(self) -> Result<WatchTarget, WatchError> {
        WatchTarget::new(self)
    }
}

impl IntoWatchTarget for &[u8] {
    fn into_watch_target(self) -> Result<WatchTarget, WatchError> {
        WatchTarget::from_bytes(self)
    }
}

impl IntoWatchTarget for Vec<u8> {
    fn into_watch_target(self) -> Result<WatchTarget, WatchError> {
        WatchTarget::from_bytes(self)
    }
}

impl IntoWatchTarget for &Url {
    fn into_watch_target(self) -> Result<WatchTarget, WatchError> {
        WatchTarget::from_url(self)
    }
}

impl IntoWatchTarget for Url {
    fn into_watch_target(self) -> Result<WatchTarget, WatchError> {
        WatchTarget::from_url(&self)
    }
}

impl IntoWatchTarget for &Value {
    fn into_watch_target(self) -> Result<WatchTarget, WatchError> {
        WatchTarget::from_value(Some(self))
    }
}

impl IntoWatchTarget for Option<&Value> {
    fn into_watch_target(self) -> Result<WatchTarget, WatchError> {
        WatchTarget::from_value(self)
    }
}

/// Raw bytes of an OS string.
#[cfg(unix)]
pub(crate) fn os_bytes(s: &OsStr) -> std::borrow::Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    std::borrow::Cow::Borrowed(s.as_bytes())
}

/// Raw bytes of an OS string.
#[cfg(not(unix))]
pub(crate) fn os_bytes(s: &OsStr) -> std::borrow::Cow<'_, [u8]> {
    match s.to_string_lossy() {
        std::borrow::Cow::Borrowed(text) => std::borrow::Cow::Borrowed(text.as_bytes()),
        std::borrow::Cow::Owned(text) => std::borrow::Cow::Owned(text.into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejected_shapes() {
        let cases = [
            (Some(json!(false)), ReceivedType::Boolean),
            (Some(json!(1)), ReceivedType::Number),
            (Some(json!({})), ReceivedType::Object),
            (Some(json!([])), ReceivedType::Array),
            (Some(Value::Null), ReceivedType::Null),
            (None, ReceivedType::Undefined),
        ];

        for (value, expected) in cases {
            let err = WatchTarget::from_value(value.as_ref()).unwrap_err();
            assert_eq!(err.code(), "ERR_INVALID_ARG_TYPE");
            assert_eq!(
                err.to_string(),
                "The \"filename\" argument must be one of type string, Buffer, or URL"
            );
            match err {
                WatchError::InvalidArgType { received } => assert_eq!(received, expected),
                other => panic!("expected InvalidArgType, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_string_value_accepted() {
        let target = WatchTarget::from_value(Some(&json!("watch1"))).unwrap();
        assert_eq!(target.path(), Path::new("watch1"));
    }

    #[test]
    fn test_accepted_representations() {
        let from_str = "dir/foo".into_watch_target().unwrap();
        let from_string = String::from("dir/foo").into_watch_target().unwrap();
        let from_path = Path::new("dir/foo").into_watch_target().unwrap();
        let from_buf = PathBuf::from("dir/foo").into_watch_target().unwrap();
        let from_os = OsString::from("dir/foo").into_watch_target().unwrap();
        let from_bytes = b"dir/foo".as_slice().into_watch_target().unwrap();
        let from_vec = b"dir/foo".to_vec().into_watch_target().unwrap();

        for target in [from_string, from_path, from_buf, from_os, from_bytes, from_vec] {
            assert_eq!(target, from_str);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_file_url_accepted() {
        let url = Url::parse("file:///tmp/watch1").unwrap();
        let target = (&url).into_watch_target().unwrap();
        assert_eq!(target.path(), Path::new("/tmp/watch1"));

        let localhost = Url::parse("file://localhost/tmp/watch1").unwrap();
        assert_eq!(
            WatchTarget::from_url(&localhost).unwrap().path(),
            Path::new("/tmp/watch1")
        );
    }

    #[test]
    fn test_non_file_url_rejected() {
        let url = Url::parse("https://example.com/watch1").unwrap();
        let err = url.into_watch_target().unwrap_err();
        assert_eq!(err.code(), "ERR_INVALID_URL_SCHEME");
    }

    #[cfg(unix)]
    #[test]
    fn test_remote_file_url_rejected() {
        let url = Url::parse("file://fileserver/share/watch1").unwrap();
        let err = WatchTarget::from_url(&url).unwrap_err();
        assert_eq!(err.code(), "ERR_INVALID_FILE_URL_HOST");
    }

    #[test]
    fn test_empty_and_nul_paths_rejected() {
        let err = "".into_watch_target().unwrap_err();
        assert_eq!(err.code(), "ERR_INVALID_ARG_VALUE");
        assert_eq!(err.to_string(), "The argument 'filename' must not be empty");

        let err = "watch\0me".into_watch_target().unwrap_err();
        assert_eq!(err.code(), "ERR_INVALID_ARG_VALUE");

        let err = Vec::<u8>::new().into_watch_target().unwrap_err();
        assert_eq!(err.code(), "ERR_INVALID_ARG_VALUE");
    }

    #[test]
    fn test_leaf_name() {
        let target = WatchTarget::new("a/b/bar").unwrap();
        assert_eq!(target.leaf_name(), Some(OsStr::new("bar")));

        let trailing = WatchTarget::new("a/watch1/").unwrap();
        assert_eq!(trailing.leaf_name(), Some(OsStr::new("watch1")));
    }

    #[test]
    fn test_resolve_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bar");
        std::fs::write(&file, "x").unwrap();

        let resolved = WatchTarget::new(dir.path()).unwrap().resolve(true).unwrap();
        assert_eq!(resolved.kind(), TargetKind::Directory);
        assert!(resolved.recursive());

        let resolved = WatchTarget::new(&file).unwrap().resolve(true).unwrap();
        assert_eq!(resolved.kind(), TargetKind::File);
        assert!(!resolved.recursive());
        assert_eq!(resolved.leaf_name(), Some(OsStr::new("bar")));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_through_symlink_keeps_link_name() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real_bar");
        let link = dir.path().join("bar");
        std::fs::write(&real, "x").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let resolved = WatchTarget::new(&link).unwrap().resolve(false).unwrap();
        assert_eq!(resolved.kind(), TargetKind::File);
        assert_eq!(resolved.path(), real.canonicalize().unwrap().as_path());
        assert_eq!(resolved.leaf_name(), Some(OsStr::new("bar")));
    }

    #[test]
    fn test_resolve_dot_falls_back_to_canonical_leaf() {
        let resolved = WatchTarget::new(".").unwrap().resolve(false).unwrap();
        let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
        assert_eq!(resolved.leaf_name(), cwd.file_name());
    }

    #[test]
    fn test_resolve_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");

        let err = WatchTarget::new(&missing).unwrap().resolve(false).unwrap_err();
        assert_eq!(err.code(), "ENOENT");
        assert_eq!(err.path(), Some(missing.as_path()));
    }
}
