use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::platform::Platform;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("project directory not found: {}", .0.display())]
    ProjectNotFound(PathBuf),

    #[error("cannot read Unity version from {}: {message}", .path.display())]
    ProjectVersion { path: PathBuf, message: String },

    #[error("project {} lies inside {}, which the build cleans", .project.display(), .path.display())]
    DestinationOverlapsProject { project: PathBuf, path: PathBuf },

    #[error("Unity editor not found ({message})")]
    EditorNotFound { message: String },

    #[error("7-Zip not found ({message})")]
    ArchiverNotFound { message: String },

    #[error("Unity build failed for {platform} (exit code: {})", fmt_code(.code))]
    Build { platform: Platform, code: Option<i32> },

    #[error("Unity reported success for {platform} but {} does not exist", .path.display())]
    MissingOutput { platform: Platform, path: PathBuf },

    #[error("archiving failed for {platform} (exit code: {})", fmt_code(.code))]
    Archive { platform: Platform, code: Option<i32> },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{} platform(s) failed: {}", .0.len(), fmt_failures(.0))]
    Platforms(Vec<PlatformFailure>),
}

impl BuildError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        BuildError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Step of a platform run that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Build,
    Permissions,
    Archive,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Build => "build",
            Step::Permissions => "permissions",
            Step::Archive => "archive",
        })
    }
}

#[derive(Debug)]
pub struct PlatformFailure {
    pub platform: Platform,
    pub step: Step,
    pub error: BuildError,
}

impl fmt::Display for PlatformFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}] {}", self.platform, self.step, self.error)
    }
}

fn fmt_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "terminated by signal".to_string(),
    }
}

fn fmt_failures(failures: &[PlatformFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
