use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::archiver::ArchiverKind;
use crate::platform::Platform;

pub const CONFIG_FILE_NAME: &str = ".builder_config.toml";

// comment written above each key of the default file
const KEY_COMMENTS: [(&str, &str); 5] = [
    (
        "editor_path",
        "Unity editor executable. Left out: the Unity Hub install matching\n\
         # ProjectSettings/ProjectVersion.txt, then Unity on PATH.",
    ),
    (
        "seven_zip_path",
        "7-Zip executable. Left out: 7z or 7za on PATH.",
    ),
    ("archiver", "\"auto\", \"seven-zip\" or \"builtin\"."),
    ("platforms", "Any of \"windows\", \"osx\", \"linux\". Built in that order."),
    (
        "fail_fast",
        "Stop at the first failed platform instead of building the rest.",
    ),
];

/// Optional per-project settings. Every field may be left out; command
/// line flags take precedence over the file.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct BuilderConfig {
    pub editor_path: Option<String>,
    pub seven_zip_path: Option<String>,
    pub archiver: Option<ArchiverKind>,
    pub platforms: Option<Vec<Platform>>,
    pub fail_fast: Option<bool>,
}

impl BuilderConfig {
    pub fn load(file: &Path) -> Result<BuilderConfig> {
        let content = fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", file.display()))?;
        Ok(config)
    }

    /// Loads `file` when it exists, otherwise returns the empty config.
    pub fn load_or_default(file: &Path) -> Result<BuilderConfig> {
        if file.is_file() {
            tracing::info!("using config {}", file.display());
            Self::load(file)
        } else {
            Ok(BuilderConfig::default())
        }
    }

    pub fn write_default(file: &Path) -> Result<()> {
        let default_config = BuilderConfig {
            editor_path: None,
            seven_zip_path: None,
            archiver: Some(ArchiverKind::Auto),
            platforms: Some(Platform::ALL.to_vec()),
            fail_fast: Some(false),
        };
        let values = toml::to_string(&default_config)?;

        let mut content = String::from("# unity3d-builder settings, command line flags win over this file\n");
        for (key, comment) in KEY_COMMENTS {
            content.push_str(&format!("\n# {}\n", comment));
            match values.lines().find(|l| l.starts_with(&format!("{} =", key))) {
                Some(line) => content.push_str(line),
                None => content.push_str(&format!("# {} = \"\"", key)),
            }
            content.push('\n');
        }
        fs::write(file, content).with_context(|| format!("failed to write {}", file.display()))?;
        Ok(())
    }
}
