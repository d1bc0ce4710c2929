use std::fs;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::error::{BuildError, BuildResult};
use crate::platform::Platform;

const PROJECT_VERSION_FILE: &str = "ProjectSettings/ProjectVersion.txt";
const EDITOR_VERSION_KEY: &str = "m_EditorVersion:";

/// Reads the editor version a project was last saved with.
pub fn read_unity_version(project_path: &Path) -> BuildResult<String> {
    let path = project_path.join(PROJECT_VERSION_FILE);
    let content = fs::read_to_string(&path).map_err(|e| BuildError::ProjectVersion {
        path: path.clone(),
        message: e.to_string(),
    })?;
    parse_unity_version(&content).ok_or_else(|| BuildError::ProjectVersion {
        path,
        message: format!("no {} line", EDITOR_VERSION_KEY),
    })
}

fn parse_unity_version(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix(EDITOR_VERSION_KEY))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Where Unity Hub installs a given editor version on this host.
pub fn hub_editor_path(version: &str) -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        Some(PathBuf::from(format!(
            "C:/Program Files/Unity/Hub/Editor/{}/Editor/Unity.exe",
            version
        )))
    }
    #[cfg(target_os = "macos")]
    {
        Some(PathBuf::from(format!(
            "/Applications/Unity/Hub/Editor/{}/Unity.app/Contents/MacOS/Unity",
            version
        )))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        crate::host_path::home_dir().map(|home| {
            home.join("Unity")
                .join("Hub")
                .join("Editor")
                .join(version)
                .join("Editor")
                .join("Unity")
        })
    }
}

/// Finds the editor binary: configured path, then the Unity Hub install
/// matching the project's version, then `PATH`.
pub fn locate_editor(project_path: &Path, configured: Option<&Path>) -> BuildResult<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() || path.is_dir() {
            return Ok(path.to_path_buf());
        }
        return Err(BuildError::EditorNotFound {
            message: format!("configured path {} does not exist", path.display()),
        });
    }

    match read_unity_version(project_path) {
        Ok(version) => {
            tracing::info!("project Unity version: {}", version);
            if let Some(path) = hub_editor_path(&version) {
                if path.is_file() {
                    return Ok(path);
                }
                tracing::warn!("no Unity Hub editor at {}", path.display());
            }
        }
        Err(e) => tracing::warn!("{}", e),
    }

    for name in ["Unity", "unity-editor"] {
        if let Ok(path) = which::which(name) {
            return Ok(path);
        }
    }

    Err(BuildError::EditorNotFound {
        message: "not configured, not installed by Unity Hub, not on PATH".to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct UnityEditor {
    path: PathBuf,
}

impl UnityEditor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        UnityEditor { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn build_args(
        project_path: &Path,
        platform: Platform,
        exe_path: &Path,
        log_file: &Path,
    ) -> Vec<String> {
        vec![
            "-quit".to_string(),
            "-batchmode".to_string(),
            "-nographics".to_string(),
            "-projectPath".to_string(),
            project_path.display().to_string(),
            platform.build_flag().to_string(),
            exe_path.display().to_string(),
            "-logFile".to_string(),
            log_file.display().to_string(),
        ]
    }

    /// Runs a headless player build and waits for the editor to exit.
    pub async fn build(
        &self,
        project_path: &Path,
        platform: Platform,
        exe_path: &Path,
        log_file: &Path,
    ) -> BuildResult<ExitStatus> {
        if log_file.is_file() {
            fs::remove_file(log_file)
                .map_err(|e| BuildError::io(format!("remove {}", log_file.display()), e))?;
        }

        tracing::info!("start building - {}", platform);
        let args = Self::build_args(project_path, platform, exe_path, log_file);
        tracing::debug!("{} {}", self.path.display(), args.join(" "));

        let (status, _) = self.run_tailed(&args, log_file).await;
        status.map_err(|e| BuildError::io(format!("spawn {}", self.path.display()), e))
    }

    /// Runs the editor while echoing its log, returns the exit status and
    /// the number of log lines echoed.
    async fn run_tailed(
        &self,
        args: &[String],
        log_file: &Path,
    ) -> (std::io::Result<ExitStatus>, usize) {
        let echoed = Arc::new(AtomicUsize::new(0));
        let tail = tail_log(log_file.to_path_buf(), echoed.clone());
        let status = Command::new(&self.path)
            .args(args)
            .stdout(Stdio::inherit())
            .status()
            .await;
        tail.abort();
        let _ = tail.await;
        // the editor writes its result last, flush what the tail missed
        echo_new_lines(log_file, &echoed).await;

        (status, echoed.load(Ordering::SeqCst))
    }
}

// every second echo lines the editor appended to its log
fn tail_log(log_file: PathBuf, echoed: Arc<AtomicUsize>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(1));
        loop {
            interval.tick().await;
            echo_new_lines(&log_file, &echoed).await;
        }
    })
}

/// Echoes the lines past `echoed` and returns how many were new.
async fn echo_new_lines(log_file: &Path, echoed: &AtomicUsize) -> usize {
    let Ok(content) = tokio::fs::read_to_string(log_file).await else {
        return 0;
    };
    let start = echoed.load(Ordering::SeqCst);
    let mut count = 0;
    for (i, line) in content.lines().enumerate().skip(start) {
        tracing::info!("[{}] {}", i, line);
        echoed.store(i + 1, Ordering::SeqCst);
        count += 1;
    }
    count
}
