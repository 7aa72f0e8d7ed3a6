//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("output scheme '{scheme}' references undefined placeholder '{placeholder}'")]
    Scheme { scheme: String, placeholder: String },

    #[error("no resources directory configured for unit type '{0}'")]
    MissingResources(String),

    #[error("unknown recipe kind '{kind}' for tag <{tag}>")]
    UnknownRecipe { tag: String, kind: String },
}

/// Main configuration struct matching the makecourse.yml schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// XML course description, relative to the config file.
    pub course: PathBuf,

    /// Destination scheme for produced documents, expanded with each
    /// unit's attributes (e.g. `generated/{type}/`).
    pub output: String,

    /// Import path schemes: tag name -> path template with `{#1}`-style
    /// positional and `{attr}`-style named placeholders.
    #[serde(default)]
    pub import_paths: HashMap<String, String>,

    /// Resource directories (templates, style files): unit type -> dir.
    #[serde(default)]
    pub resources: HashMap<String, PathBuf>,

    /// Recipe kind per tag name (e.g. `CM: lecture`, `TP: sheet`,
    /// `Exercice: fragment`).
    #[serde(default)]
    pub recipes: HashMap<String, String>,

    /// Whether the `Content` attribute is itself run through the
    /// template engine before the document template.
    #[serde(default = "default_true")]
    pub render_content: bool,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        // Remember where the config lives for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Build a config programmatically, rooted at `base_dir` (used by tests
    /// and embedders that do not go through a YAML file).
    pub fn rooted_at<P: AsRef<Path>>(mut self, base_dir: P) -> Self {
        self.config_path = Some(base_dir.as_ref().join("makecourse.yml"));
        self
    }

    /// The course XML file, resolved relative to the config file
    pub fn course_file(&self) -> PathBuf {
        self.resolve_path(&self.course)
    }

    /// Base directory every relative path is resolved against
    pub fn base_dir(&self) -> PathBuf {
        self.config_path
            .as_ref()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Import path scheme for a tag, empty when none is configured
    pub fn import_scheme(&self, tag: &str) -> &str {
        self.import_paths.get(tag).map(String::as_str).unwrap_or("")
    }

    /// Resource directory for a unit type, resolved relative to the config
    pub fn resource_dir(&self, unit_type: &str) -> Result<PathBuf, ConfigError> {
        self.resources
            .get(unit_type)
            .map(|p| self.resolve_path(p))
            .ok_or_else(|| ConfigError::MissingResources(unit_type.to_string()))
    }

    /// Resolve a path relative to the config file location
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir().join(path)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            course: PathBuf::from("course.xml"),
            output: String::from("generated/{type}/"),
            import_paths: HashMap::new(),
            resources: HashMap::new(),
            recipes: HashMap::new(),
            render_content: true,
            config_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_yaml() {
        let yaml = "course: course.xml\noutput: 'generated/{type}/'\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.course, PathBuf::from("course.xml"));
        assert!(config.render_content);
        assert!(config.import_paths.is_empty());
    }

    #[test]
    fn resolves_relative_to_config_dir() {
        let config = Config::default().rooted_at("/srv/courses/info101");
        assert_eq!(
            config.course_file(),
            PathBuf::from("/srv/courses/info101/course.xml")
        );
    }

    #[test]
    fn missing_resources_is_an_error() {
        let config = Config::default();
        assert!(matches!(
            config.resource_dir("TP"),
            Err(ConfigError::MissingResources(_))
        ));
    }
}
