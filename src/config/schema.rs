//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Where the host leaves its inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSection {
    /// App declaration (JSON, config macros already stripped)
    #[serde(default = "default_app_config")]
    pub config: String,

    /// Module graph snapshot written by the host
    #[serde(default = "default_graph")]
    pub graph: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            config: default_app_config(),
            graph: default_graph(),
        }
    }
}

fn default_app_config() -> String {
    "src/app.json".to_string()
}

fn default_graph() -> String {
    "module-graph.json".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Extension of emitted scripts
    #[serde(default = "default_script_ext")]
    pub script_ext: String,

    /// Extension of the platform's compiled stylesheets
    #[serde(default = "default_style_ext")]
    pub style_ext: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            script_ext: default_script_ext(),
            style_ext: default_style_ext(),
        }
    }
}

fn default_output_dir() -> String {
    "dist".to_string()
}

fn default_script_ext() -> String {
    "js".to_string()
}

fn default_style_ext() -> String {
    "wxss".to_string()
}

/// Shared chunk configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunksConfig {
    /// Name chunks after their page ids instead of a hash
    #[serde(default)]
    pub readable_names: bool,

    /// Runtime chunks that always stay in the build root
    #[serde(default = "default_runtime_chunks")]
    pub runtime_chunks: Vec<String>,
}

impl Default for ChunksConfig {
    fn default() -> Self {
        Self {
            readable_names: false,
            runtime_chunks: default_runtime_chunks(),
        }
    }
}

fn default_runtime_chunks() -> Vec<String> {
    ["taro", "common", "vendors"]
        .iter()
        .map(|name| name.to_string())
        .collect()
}
