//! Stand-in editor and 7-Zip scripts for driving whole build runs.
//!
//! All scripts are written once, before any of them is executed, so no
//! test forks while another one still holds a script open for writing.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub(crate) struct FakeTools {
    _dir: tempfile::TempDir,
    /// Writes the requested player file and the log.
    pub editor_ok: PathBuf,
    /// Like `editor_ok`, exits 3 for the OSX player.
    pub editor_fail_osx: PathBuf,
    /// Exits 0 without producing anything.
    pub editor_noop: PathBuf,
    /// Creates the zip path and deletes the source like `-sdel`.
    pub seven_zip_ok: PathBuf,
    /// Exits 2.
    pub seven_zip_fail: PathBuf,
}

const EDITOR: &str = r#"#!/bin/sh
out=""
log=""
flag=""
while [ $# -gt 0 ]; do
    case "$1" in
        -buildWindows64Player|-buildOSXUniversalPlayer|-buildLinux64Player)
            flag="$1"; shift; out="$1" ;;
        -logFile)
            shift; log="$1" ;;
    esac
    shift
done
if [ -n "$log" ]; then
    echo "building $flag" > "$log"
fi
if [ "$flag" = "$FAIL_FLAG" ]; then
    exit 3
fi
echo player > "$out"
"#;

const SEVEN_ZIP_OK: &str = r#"#!/bin/sh
[ "$1" = "a" ] && [ "$2" = "-r" ] && [ "$5" = "-sdel" ] || exit 7
echo zip > "$3"
rm -rf "$4"
"#;

fn write_script(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub(crate) fn fake_tools() -> &'static FakeTools {
    static TOOLS: OnceLock<FakeTools> = OnceLock::new();
    TOOLS.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        FakeTools {
            editor_ok: write_script(root, "unity_ok", &EDITOR.replace("$FAIL_FLAG", "none")),
            editor_fail_osx: write_script(
                root,
                "unity_fail_osx",
                &EDITOR.replace("$FAIL_FLAG", "-buildOSXUniversalPlayer"),
            ),
            editor_noop: write_script(root, "unity_noop", "#!/bin/sh\nexit 0\n"),
            seven_zip_ok: write_script(root, "7z_ok", SEVEN_ZIP_OK),
            seven_zip_fail: write_script(root, "7z_fail", "#!/bin/sh\nexit 2\n"),
            _dir: dir,
        }
    })
}
