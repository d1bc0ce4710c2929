use std::path::{Path, PathBuf};

#[cfg(target_os = "windows")]
pub(crate) fn cyg_to_win(path: &str) -> String {
    path.replace("/cygdrive/c", "C:")
}

#[cfg(not(target_os = "windows"))]
pub(crate) fn cyg_to_win(path: &str) -> String {
    path.to_string()
}

/// Home directory of the invoking user.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .or_else(|| std::env::var_os("USERPROFILE").filter(|h| !h.is_empty()))
        .map(PathBuf::from)
}

/// Replaces a leading `~` with `home`. `~user` forms are left alone.
pub fn expand_home(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        return home.to_path_buf();
    }
    match path
        .strip_prefix("~/")
        .or_else(|| path.strip_prefix("~\\"))
    {
        Some(rest) => home.join(rest),
        None => PathBuf::from(path),
    }
}

/// Turns a user supplied path into an absolute one.
pub fn resolve(path: &str) -> std::io::Result<PathBuf> {
    let path = cyg_to_win(path);
    let path = match home_dir() {
        Some(home) => expand_home(&path, &home),
        None => PathBuf::from(path),
    };
    std::path::absolute(path)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_expand_home() {
        let home = Path::new("/home/dev");
        assert_eq!(expand_home("~", home), PathBuf::from("/home/dev"));
        assert_eq!(
            expand_home("~/Projects/Game", home),
            PathBuf::from("/home/dev/Projects/Game")
        );
        assert_eq!(expand_home("/opt/Game", home), PathBuf::from("/opt/Game"));
        assert_eq!(expand_home("~other/Game", home), PathBuf::from("~other/Game"));
        assert_eq!(expand_home("Game/~/x", home), PathBuf::from("Game/~/x"));
    }

    #[test]
    fn test_resolve_is_absolute() {
        let resolved = resolve("some/relative/dir").unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("some/relative/dir"));
    }

    #[test]
    fn test_resolve_expands_home() {
        let Some(home) = home_dir() else {
            return;
        };
        let resolved = resolve("~/builds").unwrap();
        assert_eq!(resolved, std::path::absolute(home.join("builds")).unwrap());
    }
}
