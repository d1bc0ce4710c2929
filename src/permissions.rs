use std::path::Path;

use crate::error::BuildResult;
use crate::platform::Platform;

/// Sets the execute bits a POSIX player needs. Windows targets and
/// non-unix hosts are left untouched; the builtin archiver records 0o755
/// on its entries for the latter.
pub(crate) fn ensure_executable(platform: Platform, exe_path: &Path) -> BuildResult<()> {
    if !platform.needs_exec_bit() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        if exe_path.is_dir() {
            // .app bundle, binaries live in Contents/MacOS
            let macos = exe_path.join("Contents").join("MacOS");
            if macos.is_dir() {
                for entry in walkdir::WalkDir::new(&macos) {
                    let entry = entry.map_err(|e| {
                        crate::error::BuildError::io(
                            format!("walk {}", macos.display()),
                            e.into(),
                        )
                    })?;
                    if entry.file_type().is_file() {
                        unix::add_exec_bits(entry.path())?;
                    }
                }
            }
        } else {
            unix::add_exec_bits(exe_path)?;
        }
    }

    #[cfg(not(unix))]
    {
        tracing::debug!(
            "skip permission fix-up for {} on this host: {}",
            platform,
            exe_path.display()
        );
    }

    Ok(())
}

#[cfg(unix)]
mod unix {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    use crate::error::{BuildError, BuildResult};

    pub(super) fn add_exec_bits(path: &Path) -> BuildResult<()> {
        let meta = fs::metadata(path)
            .map_err(|e| BuildError::io(format!("stat {}", path.display()), e))?;
        let mode = meta.permissions().mode() | 0o755;
        tracing::info!("chmod {:o} {}", mode & 0o7777, path.display());
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .map_err(|e| BuildError::io(format!("chmod {}", path.display()), e))
    }
}

#[cfg(all(test, unix))]
mod test {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn mode(path: &Path) -> u32 {
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[test]
    fn test_linux_binary_gets_exec_bits() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("Demo.x86_64");
        fs::write(&exe, b"elf").unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o600)).unwrap();

        ensure_executable(Platform::Linux, &exe).unwrap();
        assert_eq!(mode(&exe), 0o755);
    }

    #[test]
    fn test_app_bundle_binaries() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("Demo.app");
        let macos = app.join("Contents").join("MacOS");
        fs::create_dir_all(&macos).unwrap();
        let bin = macos.join("Demo");
        fs::write(&bin, b"macho").unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o644)).unwrap();
        let plist = app.join("Contents").join("Info.plist");
        fs::write(&plist, b"<plist/>").unwrap();
        fs::set_permissions(&plist, fs::Permissions::from_mode(0o644)).unwrap();

        ensure_executable(Platform::OSX, &app).unwrap();
        assert_eq!(mode(&bin), 0o755);
        assert_eq!(mode(&plist), 0o644);
    }

    #[test]
    fn test_windows_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("Demo.exe");
        fs::write(&exe, b"mz").unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o600)).unwrap();

        ensure_executable(Platform::Windows, &exe).unwrap();
        assert_eq!(mode(&exe), 0o600);
    }
}
