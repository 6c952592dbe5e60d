use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::index::DEFAULT_WALK_BUDGET;

pub const CONFIG_FILE_NAME: &str = "wrena.toml";

/// Extra search paths, separated like `PATH`.
pub const SEARCH_PATH_ENV: &str = "WRENA_PATH";

/// Settings for one analysis session. Layers apply in order: config file,
/// `WRENA_PATH`, then explicit additions from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub search_paths: Vec<PathBuf>,
    pub walk_budget: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            walk_budget: DEFAULT_WALK_BUDGET,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    search_paths: Vec<PathBuf>,
    #[serde(default)]
    walk_budget: Option<usize>,
}

impl AnalyzerConfig {
    /// Relative search paths are taken relative to `base_dir`.
    pub fn from_toml_str(text: &str, base_dir: &Path) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text).context("invalid analyzer configuration")?;
        let mut config = Self::default();
        for path in file.search_paths {
            config.add_search_path(base_dir.join(path));
        }
        if let Some(budget) = file.walk_budget.filter(|v| *v > 0) {
            config.walk_budget = budget;
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&text, base_dir).with_context(|| format!("failed to load {}", path.display()))
    }

    /// Nearest `wrena.toml` in `start` or one of its ancestors.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Appends the entries of a `PATH`-style list.
    pub fn merge_path_list(&mut self, list: &OsStr) {
        for path in std::env::split_paths(list) {
            if !path.as_os_str().is_empty() {
                self.add_search_path(path);
            }
        }
    }

    pub fn merge_env(&mut self) {
        if let Some(list) = std::env::var_os(SEARCH_PATH_ENV) {
            self.merge_path_list(&list);
        }
    }

    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.search_paths.contains(&path) {
            self.search_paths.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml() {
        let config = AnalyzerConfig::from_toml_str(
            "search-paths = [\"lib\", \"/opt/wren\"]\nwalk-budget = 500\n",
            Path::new("/proj"),
        )
        .unwrap();
        assert_eq!(
            config.search_paths,
            vec![PathBuf::from("/proj/lib"), PathBuf::from("/opt/wren")]
        );
        assert_eq!(config.walk_budget, 500);
    }

    #[test]
    fn test_defaults_and_zero_budget() {
        let config = AnalyzerConfig::from_toml_str("walk-budget = 0", Path::new(".")).unwrap();
        assert_eq!(config, AnalyzerConfig::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = AnalyzerConfig::from_toml_str("serach-paths = []", Path::new(".")).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid analyzer configuration"));
    }

    #[test]
    fn test_path_list_merge_dedupes() {
        let mut config = AnalyzerConfig::default();
        config.add_search_path("/a");
        let joined = std::env::join_paths(["/a", "/b"]).unwrap();
        config.merge_path_list(&joined);
        assert_eq!(config.search_paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
    }

    #[test]
    fn test_load_and_discover() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("src/deep");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "search-paths = [\"vendor\"]").unwrap();

        let found = AnalyzerConfig::discover(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE_NAME));

        let config = AnalyzerConfig::load(&found).unwrap();
        assert_eq!(config.search_paths, vec![dir.path().join("vendor")]);
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = AnalyzerConfig::load(Path::new("/definitely/not/here/wrena.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
