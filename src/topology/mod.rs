//! App topology
//!
//! Turns the raw page/subpackage declaration into normalized page and
//! subpackage records plus the list of every root directory.

mod schema;

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{Result, SplitError};
use crate::types::{FilePath, ModuleId, PageEntryPath, PageRoot};
use crate::utils::clean_path;

pub use schema::*;

/// Extension and query suffix of a module id (`.tsx`, `.vue?vue&type=script`)
static MODULE_SUFFIX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\.[^./?]+)?(?:\?.*)?$").unwrap());

/// A page entry and the directory it lives in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: PageEntryPath,
    pub root: PageRoot,
}

/// A subpackage root and its member pages, prefixed with the root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubPackageInfo {
    pub root: PageRoot,
    pub pages: Vec<PageEntryPath>,
}

/// Normalized page layout of the app
#[derive(Debug, Clone, Default, Serialize)]
pub struct Topology {
    /// Every page, main package first
    pub page_info_list: Vec<PageInfo>,

    /// Pages declared in the main package
    pub main_page_info_list: Vec<PageInfo>,

    /// Subpackages in declaration order
    pub sub_packages: Vec<SubPackageInfo>,

    /// Main page roots followed by subpackage roots, deduplicated
    pub page_root_list: Vec<PageRoot>,
}

impl Topology {
    /// Normalize a parsed app declaration
    pub fn normalize(app: &AppConfig) -> Result<Self> {
        let pages = app.pages.as_ref().ok_or(SplitError::MissingPages)?;

        let main_page_info_list: Vec<PageInfo> = pages
            .iter()
            .map(|page| page_info(PageEntryPath::new(clean_path(page))))
            .collect();

        let sub_packages: Vec<SubPackageInfo> = app
            .sub_packages
            .iter()
            .flatten()
            .map(|sub| {
                let root = clean_path(&sub.root);
                SubPackageInfo {
                    pages: sub
                        .pages
                        .iter()
                        .map(|page| PageEntryPath::new(clean_path(&format!("{}/{}", root, page))))
                        .collect(),
                    root: PageRoot::new(root),
                }
            })
            .collect();

        let mut page_info_list = main_page_info_list.clone();
        for sub in &sub_packages {
            page_info_list.extend(sub.pages.iter().cloned().map(page_info));
        }

        // Nested pages share their subpackage root, so only the root itself is listed
        let mut page_root_list: Vec<PageRoot> = Vec::new();
        let roots = main_page_info_list
            .iter()
            .map(|info| &info.root)
            .chain(sub_packages.iter().map(|sub| &sub.root));
        for root in roots {
            if !page_root_list.contains(root) {
                page_root_list.push(root.clone());
            }
        }

        Ok(Self {
            page_info_list,
            main_page_info_list,
            sub_packages,
            page_root_list,
        })
    }

    /// Read and normalize a JSON app declaration
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SplitError::ReadAppConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let app: AppConfig =
            serde_json::from_str(&content).map_err(|source| SplitError::ParseAppConfig {
                path: path.to_path_buf(),
                source,
            })?;
        Self::normalize(&app)
    }

    /// Whether the module is the entry module of any page
    pub fn is_page_module(&self, module_id: &ModuleId) -> bool {
        self.page_info_list
            .iter()
            .any(|info| module_matches_page(module_id, &info.page))
    }

    /// Whether the module is the entry module of a main package page
    pub fn is_main_page_module(&self, module_id: &ModuleId) -> bool {
        self.main_page_info_list
            .iter()
            .any(|info| module_matches_page(module_id, &info.page))
    }

    /// First root in `page_root_list` that contains the module.
    ///
    /// Roots are prefix-disjoint, so the first hit is the only one.
    pub fn page_root_of(&self, module_id: &ModuleId) -> Option<&PageRoot> {
        self.page_root_list
            .iter()
            .filter(|root| !root.as_str().is_empty())
            .find(|root| module_id.as_str().contains(&format!("{}/", root)))
    }

    pub fn is_subpackage_root(&self, root: &PageRoot) -> bool {
        self.sub_packages.iter().any(|sub| &sub.root == root)
    }

    /// Subpackage root an output file lives under, if any
    pub fn subpackage_root_of_file(&self, file_name: &FilePath) -> Option<&PageRoot> {
        self.sub_packages
            .iter()
            .map(|sub| &sub.root)
            .find(|root| file_name.as_str().starts_with(&format!("{}/", root)))
    }

    /// Every subpackage page entry that lives under `root`
    pub fn subpackage_entries(&self, root: &PageRoot) -> Vec<&PageEntryPath> {
        let prefix = format!("{}/", root);
        self.sub_packages
            .iter()
            .flat_map(|sub| sub.pages.iter())
            .filter(|page| page.as_str().starts_with(&prefix))
            .collect()
    }
}

fn page_info(page: PageEntryPath) -> PageInfo {
    let root = match page.as_str().rfind('/') {
        Some(idx) => PageRoot::new(&page.as_str()[..idx]),
        None => PageRoot::new(""),
    };
    PageInfo { page, root }
}

/// `/app/src/pages/dog/index.tsx` is the entry module of `pages/dog/index`
fn module_matches_page(module_id: &ModuleId, page: &PageEntryPath) -> bool {
    let stem = MODULE_SUFFIX_REGEX.replace(module_id.as_str(), "");
    let page = page.as_str();
    stem == page || stem.ends_with(&format!("/{}", page))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_app() -> AppConfig {
        serde_json::from_str(
            r#"{
                "pages": ["pages/index/index"],
                "window": { "navigationBarTitleText": "WeChat" },
                "subPackages": [
                    { "root": "pages/cat", "pages": ["cat"] },
                    { "root": "pages/dog/", "pages": ["index", "beagle/beagle", "beagle/snoopy/snoopy"] }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_demo_app() {
        let topology = Topology::normalize(&demo_app()).unwrap();

        assert_eq!(topology.main_page_info_list.len(), 1);
        assert_eq!(topology.main_page_info_list[0].root.as_str(), "pages/index");
        assert_eq!(topology.page_info_list.len(), 5);

        let dog = &topology.sub_packages[1];
        assert_eq!(dog.root.as_str(), "pages/dog");
        assert_eq!(dog.pages[1].as_str(), "pages/dog/beagle/beagle");

        let roots: Vec<&str> = topology.page_root_list.iter().map(|r| r.as_str()).collect();
        assert_eq!(roots, vec!["pages/index", "pages/cat", "pages/dog"]);
    }

    #[test]
    fn test_nested_pages_do_not_duplicate_roots() {
        let app: AppConfig = serde_json::from_str(
            r#"{
                "pages": ["pages/index/index", "pages/index/other"],
                "subpackages": [{ "root": "pages/dog", "pages": ["index", "husky"] }]
            }"#,
        )
        .unwrap();
        let topology = Topology::normalize(&app).unwrap();
        assert_eq!(topology.page_root_list.len(), 2);
    }

    #[test]
    fn test_missing_pages_is_an_error() {
        let app: AppConfig = serde_json::from_str(r#"{ "subPackages": [] }"#).unwrap();
        assert!(matches!(Topology::normalize(&app), Err(SplitError::MissingPages)));
    }

    #[test]
    fn test_page_module_matching() {
        let topology = Topology::normalize(&demo_app()).unwrap();

        assert!(topology.is_page_module(&ModuleId::from("/app/src/pages/dog/beagle/beagle.tsx")));
        assert!(topology.is_page_module(&ModuleId::from("/app/src/pages/cat/cat.vue?vue&type=script")));
        assert!(!topology.is_page_module(&ModuleId::from("/app/src/pages/dog/index-helper.ts")));

        assert!(topology.is_main_page_module(&ModuleId::from("/app/src/pages/index/index.tsx")));
        assert!(!topology.is_main_page_module(&ModuleId::from("/app/src/pages/dog/index.tsx")));
    }

    #[test]
    fn test_root_queries() {
        let topology = Topology::normalize(&demo_app()).unwrap();

        let root = topology.page_root_of(&ModuleId::from("/app/src/pages/dog/beagle/beagle.tsx"));
        assert_eq!(root.map(|r| r.as_str()), Some("pages/dog"));
        assert!(topology.page_root_of(&ModuleId::from("/app/src/utils/shared.ts")).is_none());

        let file = FilePath::from("pages/dog/beagle/beagle.js");
        assert_eq!(topology.subpackage_root_of_file(&file).map(|r| r.as_str()), Some("pages/dog"));
        assert!(topology.subpackage_root_of_file(&FilePath::from("pages/index/index.js")).is_none());

        assert!(topology.is_subpackage_root(&PageRoot::from("pages/cat")));
        assert!(!topology.is_subpackage_root(&PageRoot::from("pages/index")));
        assert_eq!(topology.subpackage_entries(&PageRoot::from("pages/dog")).len(), 3);
    }
}
