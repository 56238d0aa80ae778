//! Core configuration types and errors for pathwatch.
//!
//! This crate provides the foundational types shared across the workspace:
//!
//! - [`WatchConfig`] - the recognized construction options of a watch
//!   (`persistent`, `recursive`, `encoding`, backend selection)
//! - [`Config`] - root configuration loadable from a JSON file
//! - [`ConfigError`] - configuration loading and parsing failures

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;

pub use config::{BackendChoice, Config, Encoding, WatchConfig};
pub use error::ConfigError;
