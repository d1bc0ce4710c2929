use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use zip::write::SimpleFileOptions;

use crate::error::{BuildError, BuildResult};
use crate::platform::Platform;

#[cfg(target_os = "windows")]
const SEVEN_ZIP_DEFAULT: &str = "C:/Program Files/7-Zip/7z.exe";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiverKind {
    /// 7-Zip when it can be found, builtin otherwise
    #[default]
    Auto,
    SevenZip,
    Builtin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Archiver {
    SevenZip(PathBuf),
    Builtin,
}

impl Archiver {
    pub fn select(kind: ArchiverKind, seven_zip: Option<&Path>) -> BuildResult<Archiver> {
        match kind {
            ArchiverKind::Builtin => Ok(Archiver::Builtin),
            ArchiverKind::SevenZip => locate_seven_zip(seven_zip).map(Archiver::SevenZip),
            ArchiverKind::Auto => match locate_seven_zip(seven_zip) {
                Ok(path) => Ok(Archiver::SevenZip(path)),
                Err(e) => {
                    tracing::warn!("{}, using builtin zip writer", e);
                    Ok(Archiver::Builtin)
                }
            },
        }
    }

    /// Compresses `src_dir` into `des_file`; entries keep `src_dir`'s
    /// name as their top level folder.
    pub async fn archive(
        &self,
        platform: Platform,
        src_dir: &Path,
        des_file: &Path,
    ) -> BuildResult<()> {
        if des_file.exists() {
            fs::remove_file(des_file)
                .map_err(|e| BuildError::io(format!("remove {}", des_file.display()), e))?;
        }

        match self {
            Archiver::SevenZip(seven_zip) => {
                #[cfg(target_os = "windows")]
                if platform.needs_exec_bit() {
                    tracing::warn!(
                        "7-Zip on Windows does not record execute bits, {} players may need chmod after unpacking",
                        platform
                    );
                }
                let args = seven_zip_args(src_dir, des_file);
                tracing::info!("{} {}", seven_zip.display(), args.join(" "));
                let status = Command::new(seven_zip)
                    .args(&args)
                    .stdout(Stdio::inherit())
                    .status()
                    .await
                    .map_err(|e| BuildError::io(format!("spawn {}", seven_zip.display()), e))?;
                if !status.success() {
                    return Err(BuildError::Archive {
                        platform,
                        code: status.code(),
                    });
                }
                Ok(())
            }
            Archiver::Builtin => {
                tracing::info!(
                    "zip {} -> {} ({})",
                    src_dir.display(),
                    des_file.display(),
                    platform
                );
                compress_dir(src_dir, des_file)
            }
        }
    }
}

pub(crate) fn seven_zip_args(src_dir: &Path, des_file: &Path) -> Vec<String> {
    vec![
        "a".to_string(),
        "-r".to_string(),
        des_file.display().to_string(),
        src_dir.display().to_string(),
        "-sdel".to_string(),
    ]
}

fn locate_seven_zip(configured: Option<&Path>) -> BuildResult<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(BuildError::ArchiverNotFound {
            message: format!("configured path {} is not a file", path.display()),
        });
    }
    for name in ["7z", "7za"] {
        if let Ok(path) = which::which(name) {
            return Ok(path);
        }
    }
    #[cfg(target_os = "windows")]
    {
        let default = Path::new(SEVEN_ZIP_DEFAULT);
        if default.is_file() {
            return Ok(default.to_path_buf());
        }
    }
    Err(BuildError::ArchiverNotFound {
        message: "no 7z on PATH".to_string(),
    })
}

pub(crate) fn compress_dir(src_dir: &Path, des_file: &Path) -> BuildResult<()> {
    let root = src_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| {
            BuildError::io(
                format!("archive {}", src_dir.display()),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no folder name"),
            )
        })?;

    // execute bits are recorded for every entry so POSIX players survive
    // a build made on a Windows host
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o755);

    let file = File::create(des_file)
        .map_err(|e| BuildError::io(format!("create {}", des_file.display()), e))?;
    let mut zip_writer = zip::ZipWriter::new(file);

    zip_writer.add_directory(root.as_str(), options)?;

    let mut buffer = Vec::new();
    for entry in walkdir::WalkDir::new(src_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            BuildError::io(format!("walk {}", src_dir.display()), e.into())
        })?;
        let path = entry.path();
        let relative = match path.strip_prefix(src_dir) {
            Ok(r) => r,
            Err(_) => continue,
        };
        // zip entries always use forward slashes
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .fold(root.clone(), |acc, part| format!("{}/{}", acc, part));

        if entry.file_type().is_dir() {
            tracing::debug!("adding dir {name:?} ...");
            zip_writer.add_directory(name, options)?;
        } else {
            tracing::debug!("adding file {path:?} as {name:?} ...");
            zip_writer.start_file(name, options)?;
            let mut f = File::open(path)
                .map_err(|e| BuildError::io(format!("open {}", path.display()), e))?;
            f.read_to_end(&mut buffer)
                .map_err(|e| BuildError::io(format!("read {}", path.display()), e))?;
            zip_writer
                .write_all(&buffer)
                .map_err(|e| BuildError::io(format!("write {}", des_file.display()), e))?;
            buffer.clear();
        }
    }
    zip_writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn entry_names(zip_path: &Path) -> Vec<String> {
        let archive = zip::ZipArchive::new(File::open(zip_path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(|n| n.to_string()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_compress_dir_keeps_root_folder() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("Demo");
        fs::create_dir_all(src.join("Demo_Data").join("Managed")).unwrap();
        fs::write(src.join("Demo.x86_64"), b"elf").unwrap();
        fs::write(src.join("Demo_Data").join("Managed").join("a.dll"), b"dll").unwrap();

        let des = dir.path().join("Demo_Linux.zip");
        compress_dir(&src, &des).unwrap();

        assert_eq!(
            entry_names(&des),
            vec![
                "Demo/",
                "Demo/Demo.x86_64",
                "Demo/Demo_Data/",
                "Demo/Demo_Data/Managed/",
                "Demo/Demo_Data/Managed/a.dll",
            ]
        );
    }

    #[test]
    fn test_builtin_entries_are_executable() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("Demo");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("Demo.x86_64"), b"elf").unwrap();
        let des = dir.path().join("out.zip");
        compress_dir(&src, &des).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&des).unwrap()).unwrap();
        let file = archive.by_name("Demo/Demo.x86_64").unwrap();
        assert_eq!(file.unix_mode().map(|m| m & 0o777), Some(0o755));
    }

    #[tokio::test]
    async fn test_builtin_archive_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("Demo");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("new.txt"), b"new").unwrap();
        let des = dir.path().join("Demo_Windows.zip");
        fs::write(&des, b"stale, not a zip").unwrap();

        Archiver::Builtin
            .archive(Platform::Windows, &src, &des)
            .await
            .unwrap();
        assert_eq!(entry_names(&des), vec!["Demo/", "Demo/new.txt"]);
    }

    #[test]
    fn test_compress_root_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = compress_dir(Path::new("/"), &dir.path().join("root.zip")).unwrap_err();
        match err {
            BuildError::Io { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::InvalidInput)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_seven_zip_args() {
        let args = seven_zip_args(Path::new("/out/Demo"), Path::new("/out/Demo_OSX.zip"));
        assert_eq!(args, vec!["a", "-r", "/out/Demo_OSX.zip", "/out/Demo", "-sdel"]);
    }

    #[test]
    fn test_select_configured_seven_zip_missing() {
        let err = Archiver::select(
            ArchiverKind::SevenZip,
            Some(Path::new("/definitely/not/here/7z")),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::ArchiverNotFound { .. }));
    }

    #[test]
    fn test_select_builtin() {
        assert_eq!(
            Archiver::select(ArchiverKind::Builtin, None).unwrap(),
            Archiver::Builtin
        );
    }
}
