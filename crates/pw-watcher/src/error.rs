//! Error types for the pw-watcher crate.
//!
//! This module provides the [`WatchError`] type. Every variant carries a
//! stable, machine-readable [`code`](WatchError::code) so callers can match on
//! failures without parsing messages.
//!
//! # Error Categories
//!
//! - **Argument errors** ([`is_argument`](WatchError::is_argument)): the target
//!   is not an accepted path representation. Raised synchronously, before any
//!   native resource is touched.
//! - **Lifecycle errors** ([`is_lifecycle`](WatchError::is_lifecycle)):
//!   `start` or `close` called out of sequence. Raised synchronously, the
//!   handle state is unchanged.
//! - **Backend errors** ([`is_backend`](WatchError::is_backend)): the native
//!   registration failed. Returned from `start`, or delivered once through the
//!   event stream after which the handle is closed.
//!
//! Nothing is retried internally.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Shape of a value rejected as a watch target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceivedType {
    /// `true` / `false`.
    Boolean,
    /// Any JSON number.
    Number,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
    /// An explicit `null`.
    Null,
    /// No value at all.
    Undefined,
}

impl ReceivedType {
    /// Returns the lowercase type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Object => "object",
            Self::Array => "array",
            Self::Null => "null",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for ReceivedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while constructing, starting, running, or closing a
/// watch.
///
/// # Examples
///
/// ```
/// use pw_watcher::WatchError;
///
/// let err = WatchError::AlreadyStarted;
/// assert_eq!(err.code(), "ERR_FS_WATCHER_ALREADY_STARTED");
/// assert_eq!(err.to_string(), "The watcher has already been started");
/// assert!(err.is_lifecycle());
/// ```
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WatchError {
    /// The target is not a text path, binary path, or URL.
    #[error("The \"filename\" argument must be one of type string, Buffer, or URL")]
    InvalidArgType {
        /// What was supplied instead.
        received: ReceivedType,
    },

    /// The target has an accepted type but an unusable value.
    #[error("The argument 'filename' {reason}")]
    InvalidArgValue {
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// A URL target whose scheme is not `file`.
    #[error("The URL must be of scheme file")]
    InvalidUrlScheme {
        /// The scheme that was supplied.
        scheme: String,
    },

    /// A `file:` URL naming a remote host.
    #[error("File URL host must be \"localhost\" or empty on {}", std::env::consts::OS)]
    InvalidFileUrlHost {
        /// The host that was supplied.
        host: String,
    },

    /// A `file:` URL that does not map to a local path.
    #[error("File URL path must be absolute")]
    InvalidFileUrlPath,

    /// `start` was called on a handle that is running or was already used.
    #[error("The watcher has already been started")]
    AlreadyStarted,

    /// `close` was called on a handle that is not running.
    #[error("The watcher has not been started")]
    NotStarted,

    /// The native backend failed.
    #[error("{code}: {description}, watch '{}'", .path.display())]
    Backend {
        /// errno-style code (`ENOENT`, `EACCES`, ...).
        code: &'static str,
        /// Human-readable description of the failure.
        description: String,
        /// Path the failure concerns.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl WatchError {
    /// Creates an [`InvalidArgType`](Self::InvalidArgType) error.
    #[inline]
    #[must_use]
    pub const fn invalid_arg_type(received: ReceivedType) -> Self {
        Self::InvalidArgType { received }
    }

    /// Creates a [`Backend`](Self::Backend) error from a notify failure.
    #[must_use]
    pub fn from_notify(err: notify::Error, fallback_path: &Path) -> Self {
        let path = err
            .paths
            .first()
            .cloned()
            .unwrap_or_else(|| fallback_path.to_path_buf());
        let (code, description) = match &err.kind {
            notify::ErrorKind::PathNotFound => ("ENOENT", "no such file or directory".to_owned()),
            notify::ErrorKind::MaxFilesWatch => (
                "ENOSPC",
                "system limit for number of file watchers reached".to_owned(),
            ),
            notify::ErrorKind::WatchNotFound => ("EINVAL", "watch not found".to_owned()),
            notify::ErrorKind::InvalidConfig(_) => ("EINVAL", "invalid argument".to_owned()),
            notify::ErrorKind::Io(io_err) => describe_io(io_err),
            notify::ErrorKind::Generic(message) => ("EIO", message.clone()),
        };
        Self::Backend {
            code,
            description,
            path,
            source: Box::new(err),
        }
    }

    /// Creates a [`Backend`](Self::Backend) error from an I/O failure.
    #[must_use]
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        let (code, description) = describe_io(&err);
        Self::Backend {
            code,
            description,
            path: path.to_path_buf(),
            source: Box::new(err),
        }
    }

    /// Replaces an empty backend path with `path`.
    ///
    /// Backends opened before a path is known report failures against an
    /// empty path; the handle fills in its target.
    #[must_use]
    pub fn with_path(mut self, path: &Path) -> Self {
        if let Self::Backend { path: current, .. } = &mut self {
            if current.as_os_str().is_empty() {
                *current = path.to_path_buf();
            }
        }
        self
    }

    /// Returns the stable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgType { .. } => "ERR_INVALID_ARG_TYPE",
            Self::InvalidArgValue { .. } => "ERR_INVALID_ARG_VALUE",
            Self::InvalidUrlScheme { .. } => "ERR_INVALID_URL_SCHEME",
            Self::InvalidFileUrlHost { .. } => "ERR_INVALID_FILE_URL_HOST",
            Self::InvalidFileUrlPath => "ERR_INVALID_FILE_URL_PATH",
            Self::AlreadyStarted => "ERR_FS_WATCHER_ALREADY_STARTED",
            Self::NotStarted => "ERR_FS_WATCHER_NOT_STARTED",
            Self::Backend { code, .. } => *code,
        }
    }

    /// Returns `true` for target validation failures.
    #[must_use]
    pub const fn is_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgType { .. }
                | Self::InvalidArgValue { .. }
                | Self::InvalidUrlScheme { .. }
                | Self::InvalidFileUrlHost { .. }
                | Self::InvalidFileUrlPath
        )
    }

    /// Returns `true` for `start`/`close` sequencing failures.
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        matches!(self, Self::AlreadyStarted | Self::NotStarted)
    }

    /// Returns `true` for native backend failures.
    #[must_use]
    pub const fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }

    /// Returns the path associated with a backend failure, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Backend { path, .. } => Some(path),
            _ => None,
        }
    }
}

fn describe_io(err: &io::Error) -> (&'static str, String) {
    match err.kind() {
        io::ErrorKind::NotFound => ("ENOENT", "no such file or directory".to_owned()),
        io::ErrorKind::PermissionDenied => ("EACCES", "permission denied".to_owned()),
        io::ErrorKind::InvalidInput => ("EINVAL", "invalid argument".to_owned()),
        _ => ("EIO", err.to_string()),
    }
}
