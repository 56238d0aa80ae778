//! Configuration structures for pathwatch.
//!
//! This module provides configuration types for the watcher and the CLI:
//!
//! - [`Encoding`] - How reported entry names are rendered as text
//! - [`BackendChoice`] - Native notification backend or stat polling
//! - [`WatchConfig`] - Options recognized when constructing a watch
//! - [`Config`] - Root configuration combining a target and its options
//!
//! All configuration types implement [`Default`] and deserialize with missing
//! fields filled from those defaults.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default interval between stat passes of the polling backend.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Shortest accepted interval between stat passes.
pub const MIN_POLL_INTERVAL_MS: u64 = 1;

/// Text encoding used for entry names reported with each event.
///
/// # Examples
///
/// ```
/// use pw_core::Encoding;
///
/// let encoding: Encoding = "hex".parse().unwrap();
/// assert_eq!(encoding.render(b"foo"), "666f6f");
/// assert_eq!(Encoding::default().render(b"foo"), "foo");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Encoding {
    /// UTF-8 text. Invalid sequences are replaced with U+FFFD.
    #[default]
    #[serde(alias = "utf-8")]
    Utf8,
    /// One character per byte (ISO-8859-1).
    #[serde(alias = "binary")]
    Latin1,
    /// Lowercase hexadecimal of the raw name bytes.
    Hex,
}

impl Encoding {
    /// Returns the canonical lowercase name of this encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "utf8",
            Self::Latin1 => "latin1",
            Self::Hex => "hex",
        }
    }

    /// Renders raw name bytes as text in this encoding.
    #[must_use]
    pub fn render(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Hex => {
                let mut out = String::with_capacity(bytes.len() * 2);
                for byte in bytes {
                    let _ = write!(out, "{byte:02x}");
                }
                out
            }
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "latin1" | "binary" => Ok(Self::Latin1),
            "hex" => Ok(Self::Hex),
            _ => Err(ConfigError::InvalidOption {
                option: "encoding".to_owned(),
                reason: format!("unknown encoding '{s}'"),
            }),
        }
    }
}

/// Which notification backend a watch registers with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendChoice {
    /// The platform's native mechanism (inotify, kqueue, `FSEvents`,
    /// `ReadDirectoryChangesW`).
    #[default]
    Native,
    /// Periodic stat comparison, for filesystems without native support.
    Poll {
        /// Milliseconds between stat passes.
        #[serde(default = "default_poll_interval")]
        interval_ms: u64,
    },
}

const fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl BackendChoice {
    /// Polling backend with the default interval.
    #[must_use]
    pub const fn poll() -> Self {
        Self::Poll {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Checks that a polling interval is at least [`MIN_POLL_INTERVAL_MS`].
    pub fn validate(self) -> Result<(), ConfigError> {
        match self {
            Self::Poll { interval_ms } if interval_ms < MIN_POLL_INTERVAL_MS => {
                Err(ConfigError::InvalidOption {
                    option: "backend.interval_ms".to_owned(),
                    reason: format!("must be at least {MIN_POLL_INTERVAL_MS}, got {interval_ms}"),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Options recognized when constructing a watch.
///
/// # Examples
///
/// ```
/// use pw_core::{BackendChoice, Encoding, WatchConfig};
///
/// let config = WatchConfig::default();
/// assert!(config.persistent);
/// assert!(!config.recursive);
/// assert_eq!(config.encoding, Encoding::Utf8);
/// assert_eq!(config.backend, BackendChoice::Native);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Keep the owner alive while the watch is running.
    ///
    /// A library handle has no event loop to hold open, so this is only
    /// carried through; the CLI exits after the first event when it is off.
    pub persistent: bool,

    /// Watch the whole subtree of a directory target.
    pub recursive: bool,

    /// Encoding of reported entry names.
    pub encoding: Encoding,

    /// Backend used for the native registration.
    pub backend: BackendChoice,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            persistent: true,
            recursive: false,
            encoding: Encoding::Utf8,
            backend: BackendChoice::Native,
        }
    }
}

impl WatchConfig {
    /// Sets the recursive flag.
    #[must_use]
    pub const fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Sets the name encoding.
    #[must_use]
    pub const fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the backend.
    #[must_use]
    pub const fn with_backend(mut self, backend: BackendChoice) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the persistent flag.
    #[must_use]
    pub const fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Checks option values that deserialize but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backend.validate()
    }
}

/// Root configuration for pathwatch.
///
/// `target` is kept as an untyped JSON value: whether it is an acceptable
/// path is decided by the watcher, which reports a wrongly-typed target as
/// `ERR_INVALID_ARG_TYPE` rather than as a parse error.
///
/// # Examples
///
/// ```
/// use pw_core::Config;
///
/// let config = Config::from_json(r#"{"target": "/tmp", "watch": {"recursive": true}}"#).unwrap();
/// assert!(config.watch.recursive);
/// assert_eq!(config.target.as_ref().and_then(|v| v.as_str()), Some("/tmp"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The path to watch, as written in the configuration file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<serde_json::Value>,

    /// Watch options.
    pub watch: WatchConfig,
}

impl Config {
    /// Parses a configuration from JSON text.
    ///
    /// Option values are validated after parsing.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.watch.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
