use serde::{Deserialize, Serialize};
use std::fmt;

/// Desktop targets a standalone player can be built for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[allow(clippy::upper_case_acronyms)]
pub enum Platform {
    Windows,
    #[value(name = "osx")]
    OSX,
    Linux,
}

impl Platform {
    /// Fixed build order.
    pub const ALL: [Platform; 3] = [Platform::Windows, Platform::OSX, Platform::Linux];

    pub fn name(self) -> &'static str {
        match self {
            Platform::Windows => "Windows",
            Platform::OSX => "OSX",
            Platform::Linux => "Linux",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            Platform::OSX => ".app",
            Platform::Linux => ".x86_64",
        }
    }

    /// Editor command line flag that builds a player for this target.
    pub fn build_flag(self) -> &'static str {
        match self {
            Platform::Windows => "-buildWindows64Player",
            Platform::OSX => "-buildOSXUniversalPlayer",
            Platform::Linux => "-buildLinux64Player",
        }
    }

    pub fn needs_exec_bit(self) -> bool {
        !matches!(self, Platform::Windows)
    }

    pub fn executable_name(self, project_name: &str) -> String {
        format!("{}{}", project_name, self.extension())
    }

    pub fn zip_name(self, project_name: &str) -> String {
        format!("{}_{}.zip", project_name, self.name())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Deduplicates `platforms` and puts them back into the fixed build order.
pub fn in_build_order(platforms: &[Platform]) -> Vec<Platform> {
    Platform::ALL
        .into_iter()
        .filter(|p| platforms.contains(p))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(Platform::Windows.zip_name("Demo"), "Demo_Windows.zip");
        assert_eq!(Platform::OSX.zip_name("Demo"), "Demo_OSX.zip");
        assert_eq!(Platform::Linux.executable_name("Demo"), "Demo.x86_64");
        assert_eq!(Platform::OSX.executable_name("Demo"), "Demo.app");
    }

    #[test]
    fn test_build_order() {
        let order = in_build_order(&[Platform::Linux, Platform::Windows, Platform::Linux]);
        assert_eq!(order, vec![Platform::Windows, Platform::Linux]);
    }

    #[test]
    fn test_serde_names() {
        #[derive(Deserialize)]
        struct Wrap {
            platforms: Vec<Platform>,
        }
        let w: Wrap = toml::from_str(r#"platforms = ["windows", "osx", "linux"]"#).unwrap();
        assert_eq!(w.platforms, Platform::ALL.to_vec());
    }
}
