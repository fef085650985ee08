//! Raw app declaration as written by the project

use serde::{Deserialize, Serialize};

/// The app declaration (`app.json` after config macros have been stripped).
///
/// Only the page layout matters here; window, tab bar and other keys are
/// ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Main package pages, e.g. `pages/index/index`
    #[serde(default)]
    pub pages: Option<Vec<String>>,

    /// Subpackage declarations
    #[serde(default, alias = "subpackages")]
    pub sub_packages: Option<Vec<SubPackageConfig>>,
}

/// One subpackage declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubPackageConfig {
    /// Subpackage directory, e.g. `pages/dog`
    pub root: String,

    /// Pages relative to `root`, e.g. `beagle/beagle`
    #[serde(default)]
    pub pages: Vec<String>,
}
