//! Highlighting configuration.
//!
//! The engine takes a [`HighlightConfig`] by value and never touches the filesystem; the loaders
//! here are for hosts that want the project-level defaults:
//!
//! - `.strpsql.yaml` next to the source file:
//!
//!   ```yaml
//!   enabled_by_default: false
//!   ```
//!
//! - the nearest `*.csproj`, via
//!   `<ProjectExtensions><PostgreSqlInAString><Enabled>false</Enabled></PostgreSqlInAString></ProjectExtensions>`.

use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// File name of the per-directory configuration file.
pub const CONFIG_FILE_NAME: &str = ".strpsql.yaml";

static PROJECT_EXTENSIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<ProjectExtensions\b[^>]*>(.*?)</ProjectExtensions\s*>")
        .expect("project extensions pattern is valid")
});

static EXTENSION_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<PostgreSqlInAString\b[^>]*>(.*?)</PostgreSqlInAString\s*>")
        .expect("extension element pattern is valid")
});

static ENABLED_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<Enabled\b[^>]*>(.*?)</Enabled\s*>").expect("enabled element pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Per-buffer highlighting configuration.
pub struct HighlightConfig {
    /// Whether literals outside any directive region are highlighted.
    pub enabled_by_default: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enabled_by_default: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    enabled_by_default: Option<Value>,
}

impl HighlightConfig {
    /// A configuration with the given default.
    pub fn new(enabled_by_default: bool) -> Self {
        Self { enabled_by_default }
    }

    /// Parse a `.strpsql.yaml` document.
    ///
    /// `enabled_by_default` accepts a YAML boolean or one of the strings `true`, `false`, `on`,
    /// `off` (any case). A missing key or an empty document keeps the default.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let raw: Option<RawConfig> = serde_yaml::from_str(yaml)?;
        let Some(value) = raw.and_then(|raw| raw.enabled_by_default) else {
            return Ok(Self::default());
        };

        let enabled_by_default = match &value {
            Value::Bool(enabled) => *enabled,
            Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "on" => true,
                "false" | "off" => false,
                _ => return Err(ConfigError::InvalidEnabledValue(text.clone())),
            },
            other => {
                let text = serde_yaml::to_string(other)?;
                return Err(ConfigError::InvalidEnabledValue(text.trim().to_string()));
            }
        };

        Ok(Self { enabled_by_default })
    }

    /// Read the setting from the text of an MSBuild project file.
    ///
    /// Only the first `<PostgreSqlInAString>` inside `<ProjectExtensions>` counts; its last
    /// `<Enabled>` child wins. The value is enabled only when it reads `true` (any case).
    pub fn from_project_xml(xml: &str) -> Self {
        let enabled = PROJECT_EXTENSIONS
            .captures(xml)
            .and_then(|extensions| {
                let body = extensions.get(1)?.as_str();
                EXTENSION_ELEMENT.captures(body)
            })
            .and_then(|element| {
                let body = element.get(1)?.as_str();
                ENABLED_ELEMENT
                    .captures_iter(body)
                    .filter_map(|enabled| enabled.get(1))
                    .last()
                    .map(|value| value.as_str().trim().eq_ignore_ascii_case("true"))
            });

        match enabled {
            Some(enabled_by_default) => Self { enabled_by_default },
            None => Self::default(),
        }
    }

    /// Read the setting from an MSBuild project file on disk.
    pub fn from_project_file(path: &Path) -> Result<Self, ConfigError> {
        let xml = std::fs::read_to_string(path)?;
        Ok(Self::from_project_xml(&xml))
    }

    /// Resolve the configuration for a source file.
    ///
    /// A `.strpsql.yaml` in the source's directory wins; otherwise the nearest `*.csproj` found
    /// walking up from that directory is used; otherwise the default applies.
    pub fn load_for_source(source: &Path) -> Result<Self, ConfigError> {
        let Some(dir) = source.parent() else {
            return Ok(Self::default());
        };

        let local = dir.join(CONFIG_FILE_NAME);
        if local.is_file() {
            log::debug!("reading highlighting config from {}", local.display());
            let yaml = std::fs::read_to_string(&local)?;
            return Self::from_yaml_str(&yaml);
        }

        match find_project_file(dir)? {
            Some(project) => {
                log::debug!("reading highlighting config from {}", project.display());
                Self::from_project_file(&project)
            }
            None => Ok(Self::default()),
        }
    }
}

/// The first `*.csproj` (by name) in `dir` or its closest ancestor that has one.
pub fn find_project_file(dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    for ancestor in dir.ancestors() {
        // `Path::new("")` is the parent of a bare relative file name.
        let listing = if ancestor.as_os_str().is_empty() {
            Path::new(".")
        } else {
            ancestor
        };
        let Ok(entries) = std::fs::read_dir(listing) else {
            continue;
        };

        let mut projects = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "csproj") {
                projects.push(path);
            }
        }
        projects.sort();

        if let Some(project) = projects.into_iter().next() {
            return Ok(Some(project));
        }
    }

    Ok(None)
}
