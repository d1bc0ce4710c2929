//! Builds a Unity project's standalone players one platform at a time and
//! zips each result into the destination directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::archiver::Archiver;
use crate::editor::UnityEditor;
use crate::error::{BuildError, BuildResult, PlatformFailure, Step};
use crate::host_path;
use crate::permissions::ensure_executable;
use crate::platform::{in_build_order, Platform};

/// Editor logs and the run log, under the destination directory.
pub const LOGS_DIR: &str = "logs";
/// Per-platform build output, removed once zipped.
pub const STAGING_DIR: &str = ".staging";

/// External programs a build run depends on.
#[derive(Debug, Clone)]
pub struct Tools {
    pub editor: UnityEditor,
    pub archiver: Archiver,
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub platforms: Vec<Platform>,
    /// Stop at the first failed platform instead of trying the rest.
    pub fail_fast: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            platforms: Platform::ALL.to_vec(),
            fail_fast: false,
        }
    }
}

/// Zip produced for each platform, in build order.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub archives: Vec<(Platform, PathBuf)>,
}

pub struct Unity3DBuilder {
    project_path: PathBuf,
    project_name: String,
    dest_dir: PathBuf,
    tools: Tools,
    options: BuildOptions,
}

impl Unity3DBuilder {
    pub fn new(project_path: &str, dest_dir: &str, tools: Tools) -> BuildResult<Self> {
        let project_path = host_path::resolve(project_path)
            .map_err(|e| BuildError::io(format!("resolve {}", project_path), e))?;
        if !project_path.is_dir() {
            return Err(BuildError::ProjectNotFound(project_path));
        }
        let project_name = project_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| BuildError::ProjectNotFound(project_path.clone()))?;

        let dest_dir = host_path::resolve(dest_dir)
            .map_err(|e| BuildError::io(format!("resolve {}", dest_dir), e))?;
        // both folders get cleaned, the project must not be one of them
        for reserved in [dest_dir.join(STAGING_DIR), dest_dir.join(LOGS_DIR)] {
            if project_path.starts_with(&reserved) {
                return Err(BuildError::DestinationOverlapsProject {
                    project: project_path,
                    path: reserved,
                });
            }
        }

        if !dest_dir.is_dir() {
            fs::create_dir_all(&dest_dir)
                .map_err(|e| BuildError::io(format!("create {}", dest_dir.display()), e))?;
        }

        tracing::info!("project_path: {}", project_path.display());
        tracing::info!("dest_dir: {}", dest_dir.display());

        Ok(Unity3DBuilder {
            project_path,
            project_name,
            dest_dir,
            tools,
            options: BuildOptions::default(),
        })
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    pub fn zip_path(&self, platform: Platform) -> PathBuf {
        self.dest_dir.join(platform.zip_name(&self.project_name))
    }

    fn staging_root(&self) -> PathBuf {
        self.dest_dir.join(STAGING_DIR)
    }

    fn platform_dir(&self, platform: Platform) -> PathBuf {
        self.staging_root().join(platform.name())
    }

    /// `.staging/<Platform>/<Name>`, becomes the zip's top level folder.
    fn build_dir(&self, platform: Platform) -> PathBuf {
        self.platform_dir(platform).join(&self.project_name)
    }

    fn log_file(&self, platform: Platform) -> PathBuf {
        self.dest_dir
            .join(LOGS_DIR)
            .join(format!("{}_{}.log", self.project_name, platform.name()))
    }

    /// Builds and archives every configured platform. Failed platforms are
    /// collected and returned together once the run is over.
    pub async fn create(&self) -> BuildResult<BuildReport> {
        let mut report = BuildReport::default();
        let mut failures = Vec::new();

        for platform in in_build_order(&self.options.platforms) {
            match self.create_platform(platform).await {
                Ok(zip_file) => {
                    tracing::info!("{} done: {}", platform, zip_file.display());
                    report.archives.push((platform, zip_file));
                }
                Err((step, error)) => {
                    tracing::error!("{} {} failed: {}", platform, step, error);
                    failures.push(PlatformFailure {
                        platform,
                        step,
                        error,
                    });
                    if self.options.fail_fast {
                        break;
                    }
                }
            }
        }

        // only succeeds once every platform folder is gone
        if fs::remove_dir(self.staging_root()).is_ok() {
            tracing::debug!("removed {}", self.staging_root().display());
        }

        if failures.is_empty() {
            tracing::info!("all {} platform(s) built", report.archives.len());
            Ok(report)
        } else {
            Err(BuildError::Platforms(failures))
        }
    }

    async fn create_platform(&self, platform: Platform) -> Result<PathBuf, (Step, BuildError)> {
        let exe_path = self
            .create_build(platform)
            .await
            .map_err(|e| (Step::Build, e))?;
        ensure_executable(platform, &exe_path).map_err(|e| (Step::Permissions, e))?;
        self.zip(platform).await.map_err(|e| (Step::Archive, e))
    }

    /// Runs the editor for one platform, returns the built executable.
    pub async fn create_build(&self, platform: Platform) -> BuildResult<PathBuf> {
        let platform_dir = self.platform_dir(platform);
        if platform_dir.exists() {
            fs::remove_dir_all(&platform_dir)
                .map_err(|e| BuildError::io(format!("remove {}", platform_dir.display()), e))?;
        }
        let build_dir = self.build_dir(platform);
        fs::create_dir_all(&build_dir)
            .map_err(|e| BuildError::io(format!("create {}", build_dir.display()), e))?;

        let log_file = self.log_file(platform);
        if let Some(parent) = log_file.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| BuildError::io(format!("create {}", parent.display()), e))?;
        }

        let exe_path = build_dir.join(platform.executable_name(&self.project_name));
        let status = self
            .tools
            .editor
            .build(&self.project_path, platform, &exe_path, &log_file)
            .await?;

        if !status.success() {
            tracing::info!("build failed - {}", platform);
            return Err(BuildError::Build {
                platform,
                code: status.code(),
            });
        }
        if !exe_path.exists() {
            return Err(BuildError::MissingOutput {
                platform,
                path: exe_path,
            });
        }

        tracing::info!("build success - {}", platform);
        Ok(exe_path)
    }

    /// Zips `.staging/<Platform>/<Name>` as `dest/<Name>_<Platform>.zip`
    /// with `<Name>/` as the top level folder.
    pub async fn zip(&self, platform: Platform) -> BuildResult<PathBuf> {
        let build_dir = self.build_dir(platform);
        let zip_file = self.zip_path(platform);
        self.tools
            .archiver
            .archive(platform, &build_dir, &zip_file)
            .await?;

        // 7z -sdel already removes the build folder
        let platform_dir = self.platform_dir(platform);
        if platform_dir.exists() {
            fs::remove_dir_all(&platform_dir)
                .map_err(|e| BuildError::io(format!("remove {}", platform_dir.display()), e))?;
        }

        Ok(zip_file)
    }
}
