use anyhow::{Context, Result};
use directories::ProjectDirs;
use repofinder_core::domain::{RepositoryMatcher, SearchScope, GIT_MARKER};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::adapters::discovery::DiscoveryOptions;
use crate::adapters::git::git_repository_matcher;
use crate::cli::{CliArgs, MatcherArg};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Config {
    pub version: u32,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Directories to search; empty means every local root
    pub scopes: Vec<PathBuf>,
    /// Roots searched when no scopes are given
    pub local_roots: Vec<PathBuf>,
    /// Keep watching after the initial scan; `--watch` forces it on
    pub live_updates: bool,
    pub rescan_interval_secs: u64,
    pub batch_size: usize,
    pub follow_links: bool,
    pub max_depth: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    /// Any of the marker directories exists
    #[default]
    Marker,
    /// git2 can open the directory as a repository
    Git,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(default)]
pub struct MatcherConfig {
    pub kind: MatcherKind,
    pub markers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            search: SearchConfig::default(),
            matcher: MatcherConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            scopes: Vec::new(),
            local_roots: dirs::home_dir().into_iter().collect(),
            live_updates: false,
            rescan_interval_secs: 5,
            batch_size: 64,
            follow_links: false,
            max_depth: None,
        }
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            kind: MatcherKind::Marker,
            markers: vec![GIT_MARKER.to_string()],
        }
    }
}

pub fn get_default_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "repofinder")
        .context("Failed to determine project directories")?;

    let config_dir = proj_dirs.config_dir();
    Ok(config_dir.join("repofinder.toml"))
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p,
            None => get_default_config_path()?,
        };

        if !path.exists() {
            let default_config = Config::default();
            // Create directory if it doesn't exist
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
            default_config.save(&path)?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn from_cli_and_file(cli_args: &CliArgs) -> Result<Self> {
        let mut config = Self::load(cli_args.config.clone())?;

        // CLI args override config file
        if !cli_args.scope.is_empty() {
            config.search.scopes = cli_args.scope.clone();
        }
        if let Some(matcher) = cli_args.matcher {
            config.matcher.kind = match matcher {
                MatcherArg::Marker => MatcherKind::Marker,
                MatcherArg::Git => MatcherKind::Git,
            };
        }
        if cli_args.watch {
            config.search.live_updates = true;
        }

        Ok(config)
    }

    pub fn scopes(&self) -> Vec<SearchScope> {
        self.search
            .scopes
            .iter()
            .map(|path| SearchScope::directory(path.clone()))
            .collect()
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            local_roots: self.search.local_roots.clone(),
            live_updates: self.search.live_updates,
            rescan_interval: Duration::from_secs(self.search.rescan_interval_secs.max(1)),
            batch_size: self.search.batch_size.max(1),
            follow_links: self.search.follow_links,
            max_depth: self.search.max_depth,
        }
    }

    pub fn repository_matcher(&self) -> RepositoryMatcher {
        match self.matcher.kind {
            MatcherKind::Git => git_repository_matcher(),
            MatcherKind::Marker if self.matcher.markers.is_empty() => RepositoryMatcher::default(),
            MatcherKind::Marker => RepositoryMatcher::with_markers(self.matcher.markers.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.version, 1);
        assert!(config.search.scopes.is_empty());
        assert!(!config.search.live_updates);
        assert_eq!(config.matcher.kind, MatcherKind::Marker);
        assert_eq!(config.matcher.markers, vec![".git".to_string()]);
    }

    #[test]
    fn test_config_parses_partial_file() -> Result<()> {
        let config: Config = toml::from_str(
            r#"
version = 1

[search]
scopes = ["/home/alice/projects"]
rescan_interval_secs = 30

[matcher]
kind = "git"
"#,
        )?;

        assert_eq!(config.search.scopes, vec![PathBuf::from("/home/alice/projects")]);
        assert_eq!(config.search.rescan_interval_secs, 30);
        assert_eq!(config.search.batch_size, 64);
        assert_eq!(config.matcher.kind, MatcherKind::Git);
        assert_eq!(config.matcher.markers, vec![".git".to_string()]);
        Ok(())
    }

    #[test]
    fn test_config_load_nonexistent_creates_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nested").join("repofinder.toml");

        let config = Config::load(Some(config_path.clone()))?;

        assert_eq!(config, Config::default());
        assert!(config_path.exists());
        Ok(())
    }

    #[test]
    fn test_config_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("test.toml");

        let mut config = Config::default();
        config.search.scopes = vec![PathBuf::from("/custom/path")];
        config.search.max_depth = Some(4);
        config.matcher.markers.push(".hg".to_string());

        config.save(&config_path)?;
        let loaded_config = Config::load(Some(config_path))?;

        assert_eq!(config, loaded_config);
        Ok(())
    }

    #[test]
    fn test_cli_override() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("test.toml");

        let mut original_config = Config::default();
        original_config.search.scopes = vec![PathBuf::from("/original/path")];
        original_config.save(&config_path)?;

        let config_arg = config_path.to_string_lossy().to_string();
        let cli_args = CliArgs::parse_from([
            "repofinder",
            "--scope",
            "/override/path",
            "--matcher",
            "git",
            "--config",
            config_arg.as_str(),
        ]);

        let final_config = Config::from_cli_and_file(&cli_args)?;
        assert_eq!(final_config.search.scopes, vec![PathBuf::from("/override/path")]);
        assert_eq!(final_config.matcher.kind, MatcherKind::Git);
        assert!(!final_config.search.live_updates);
        Ok(())
    }

    #[test]
    fn test_file_live_updates_survive_without_watch_flag() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("test.toml");

        let mut original_config = Config::default();
        original_config.search.live_updates = true;
        original_config.save(&config_path)?;

        let config_arg = config_path.to_string_lossy().to_string();
        let cli_args = CliArgs::parse_from(["repofinder", "--config", config_arg.as_str()]);

        let final_config = Config::from_cli_and_file(&cli_args)?;
        assert!(final_config.search.live_updates);
        Ok(())
    }

    #[test]
    fn test_watch_flag_enables_live_updates() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("test.toml");
        Config::default().save(&config_path)?;

        let config_arg = config_path.to_string_lossy().to_string();
        let cli_args =
            CliArgs::parse_from(["repofinder", "--watch", "--config", config_arg.as_str()]);

        let final_config = Config::from_cli_and_file(&cli_args)?;
        assert!(final_config.search.live_updates);
        Ok(())
    }

    #[test]
    fn test_discovery_options_from_config() {
        let mut config = Config::default();
        config.search.rescan_interval_secs = 0;
        config.search.batch_size = 0;
        config.search.local_roots = vec![PathBuf::from("/data")];

        let options = config.discovery_options();
        assert_eq!(options.rescan_interval, Duration::from_secs(1));
        assert_eq!(options.batch_size, 1);
        assert_eq!(options.local_roots, vec![PathBuf::from("/data")]);
    }

    #[test]
    fn test_scopes_and_matcher_from_config() {
        let mut config = Config::default();
        config.search.scopes = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        config.matcher.markers = vec![".git".to_string(), ".hg".to_string()];

        assert_eq!(
            config.scopes(),
            vec![SearchScope::directory("/a"), SearchScope::directory("/b")]
        );
        assert_eq!(config.repository_matcher().description(), "markers .git, .hg");

        config.matcher.kind = MatcherKind::Git;
        assert_eq!(config.repository_matcher().description(), "git repository");
    }

    #[test]
    fn test_get_default_config_path() -> Result<()> {
        let path = get_default_config_path()?;
        assert!(path.ends_with("repofinder.toml"));
        Ok(())
    }
}
