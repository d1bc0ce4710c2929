//! Standalone Windows, OS X and Linux players of a Unity project, built
//! through the editor's batch mode and zipped per platform.

pub mod archiver;
pub mod builder;
pub mod config;
pub mod editor;
pub mod error;
pub mod host_path;
pub mod log_util;
mod permissions;
pub mod platform;

#[cfg(all(test, unix))]
mod test_tools;

pub use archiver::{Archiver, ArchiverKind};
pub use builder::{BuildOptions, BuildReport, Tools, Unity3DBuilder};
pub use editor::UnityEditor;
pub use error::{BuildError, BuildResult, PlatformFailure, Step};
pub use platform::Platform;
