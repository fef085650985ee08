//! Configuration handling for splitpack
//!
//! Parses `splitpack.toml` and derives the options the pipeline runs with.

mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::ChunkNaming;

pub use schema::*;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "splitpack.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Host inputs
    #[serde(default)]
    pub app: AppSection,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Shared chunk settings
    #[serde(default)]
    pub chunks: ChunksConfig,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// Load configuration from a file path.
    ///
    /// A missing [`DEFAULT_CONFIG_FILE`] yields the defaults, rooted at the
    /// current directory. Any other path must exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        if !canonical_path.exists() && path == Path::new(DEFAULT_CONFIG_FILE) {
            debug!("No config at {}, using defaults", canonical_path.display());
            return Ok(Self {
                root: std::env::current_dir()?,
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read config file: {}", canonical_path.display()))?;

        let mut config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse splitpack.toml")?;

        // Set root directory to the directory containing the config file
        config.root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        for (field, ext) in [
            ("script_ext", &self.output.script_ext),
            ("style_ext", &self.output.style_ext),
        ] {
            if ext.is_empty() || ext.contains('.') || ext.contains('/') {
                anyhow::bail!("output.{} must be a bare extension, got '{}'", field, ext);
            }
        }

        if self.chunks.runtime_chunks.iter().any(String::is_empty) {
            anyhow::bail!("chunks.runtime_chunks contains an empty name");
        }

        Ok(())
    }

    /// Get the absolute app declaration path
    pub fn app_config_path(&self) -> PathBuf {
        self.root.join(&self.app.config)
    }

    /// Get the absolute module graph path
    pub fn graph_path(&self) -> PathBuf {
        self.root.join(&self.app.graph)
    }

    /// Get the absolute output directory path
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output.dir)
    }

    /// Options for the splitting pipeline
    pub fn split_options(&self) -> SplitOptions {
        SplitOptions {
            naming: ChunkNaming::from_readable_flag(self.chunks.readable_names),
            script_ext: self.output.script_ext.clone(),
            style_ext: self.output.style_ext.clone(),
            runtime_chunks: self.chunks.runtime_chunks.clone(),
        }
    }
}

/// Options the splitting pipeline is constructed with
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Chunk name rendering
    pub naming: ChunkNaming,

    /// Script extension without the dot
    pub script_ext: String,

    /// Stylesheet extension without the dot
    pub style_ext: String,

    /// Runtime chunks that stay in the build root
    pub runtime_chunks: Vec<String>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Config::default().split_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SplitOptions::default();
        assert_eq!(options.naming, ChunkNaming::Hashed);
        assert_eq!(options.script_ext, "js");
        assert_eq!(options.style_ext, "wxss");
        assert_eq!(options.runtime_chunks, vec!["taro", "common", "vendors"]);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splitpack.toml");
        fs::write(
            &path,
            r#"
[output]
dir = "build/weapp"

[chunks]
readable_names = true
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.output_dir(), dir.path().join("build/weapp"));
        assert_eq!(config.app_config_path(), dir.path().join("src/app.json"));
        assert_eq!(config.split_options().naming, ChunkNaming::Readable);
        assert_eq!(config.output.style_ext, "wxss");
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("typo.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_rejects_dotted_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splitpack.toml");
        fs::write(&path, "[output]\nstyle_ext = \".wxss\"\n").unwrap();

        assert!(Config::load(&path).is_err());
    }
}
