//! Leaf helpers shared by the anyinstall resolver and installer.
//!
//! - [`platform`] - host OS/architecture profile and filename alias vocabularies
//! - [`extension`] - extension normalization and the install-format table
//! - [`capability`] - detection of locally available helper tools

pub mod capability;
pub mod extension;
pub mod platform;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use capability::{CapabilityProbe, CapabilitySet, WhichProbe};
pub use extension::{InstallFormat, get_extension, is_companion_file};
pub use platform::{Arch, Os, PlatformError, PlatformProfile};
