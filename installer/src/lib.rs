//! anyinstall installer library.
//!
//! The host side of `anyinstall`: the production collaborators the
//! resolution core calls through traits, the download and install units, and
//! the command-line flow that wires them together. It is used by the
//! `anyinstall` binary and by behaviour tests that swap collaborators for
//! stubs.
//!
//! # Modules
//!
//! - [`cleanup`] - Scratch directories and removal with permission fallback
//! - [`cli`] - Command-line argument definitions
//! - [`confirm`] - Confirmation prompts
//! - [`dirs`] - Platform directory resolution
//! - [`download`] - The download unit and SHA-256 digests
//! - [`error`] - Error types with recovery hints
//! - [`executor`] - Subprocess execution with timeouts
//! - [`extract`] - Archive extraction with path validation
//! - [`http`] - GitHub release metadata, page fetches, and downloads
//! - [`install`] - One install unit per install method
//! - [`install_flow`] - Resolve, install, and update runs
//! - [`list`] - The `list` command
//! - [`output`] - Selection, success, and listing text
//! - [`settings`] - Loading resolver configuration
//! - [`store`] - Persisted install records

pub mod cleanup;
pub mod cli;
pub mod confirm;
pub mod dirs;
pub mod download;
pub mod error;
pub mod executor;
pub mod extract;
pub mod http;
pub mod install;
pub mod install_flow;
pub mod list;
pub mod output;
pub mod settings;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
