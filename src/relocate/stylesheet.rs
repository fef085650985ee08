//! Stylesheet import injection
//!
//! Relocated shared stylesheets are not referenced by anything the bundler
//! emits. Each page of an owning subpackage gets an `@import` line at the top
//! of its entry stylesheet instead.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, error, info};

use super::OutputBundle;
use crate::analyzer::ChunkPlan;
use crate::error::{Result, SplitError};
use crate::types::{ChunkName, FilePath, PageEntryPath, PageRoot};
use crate::utils::relative_level;

/// Outcome of one injection pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionReport {
    /// Page stylesheets that received a new import
    pub linked: usize,

    /// Page stylesheets that already carried the import
    pub unchanged: usize,

    /// Page stylesheets that could not be read or written
    pub failed: usize,
}

/// Links relocated shared stylesheets into subpackage pages
#[derive(Debug, Clone)]
pub struct StylesheetInjector {
    style_ext: String,
}

impl StylesheetInjector {
    pub fn new(style_ext: impl Into<String>) -> Self {
        Self {
            style_ext: style_ext.into(),
        }
    }

    /// Inject imports for every relocated stylesheet in `bundle`, already
    /// written below `dist`.
    pub fn inject(&self, plan: &ChunkPlan, dist: &Path, bundle: &OutputBundle) -> InjectionReport {
        let mut report = InjectionReport::default();

        // Each copy of a relocated stylesheet shows up once per owner
        let mut stylesheets: BTreeMap<&ChunkName, &str> = BTreeMap::new();
        for file in bundle.iter() {
            if file.file_name.extension() != Some(self.style_ext.as_str()) {
                continue;
            }
            if let Some(chunk) = plan.relocatable_chunk_for_file(&file.file_name) {
                stylesheets.entry(chunk).or_insert_with(|| file.file_name.base_name());
            }
        }

        for (chunk, base_name) in stylesheets {
            let Some(owners) = plan.owners(chunk) else {
                continue;
            };
            for root in owners {
                for entry in plan.topology.subpackage_entries(root) {
                    match self.link_page(dist, root, entry, base_name) {
                        Ok(true) => report.linked += 1,
                        Ok(false) => report.unchanged += 1,
                        Err(err) => {
                            error!("{}: {}", err, error_cause(&err));
                            report.failed += 1;
                        }
                    }
                }
            }
        }

        report
    }

    /// Prepend the import to one page stylesheet. `Ok(false)` when the exact
    /// line is already present.
    fn link_page(
        &self,
        dist: &Path,
        root: &PageRoot,
        entry: &PageEntryPath,
        chunk_file: &str,
    ) -> Result<bool> {
        let page_file = format!("{}.{}", entry, self.style_ext);
        let stylesheet = dist.join(&page_file);
        let path_in_root = &page_file[root.as_str().len()..];
        let import_line = format!("@import \"{}{}\";\n", relative_level(path_in_root), chunk_file);

        let io_error = |source: io::Error| SplitError::StylesheetIo {
            chunk: FilePath::from(format!("{}/{}", root, chunk_file)),
            stylesheet: stylesheet.clone(),
            source,
        };

        let existing = match fs::read_to_string(&stylesheet) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(io_error(err)),
        };
        if existing.contains(&import_line) {
            debug!("{} already imports {}", page_file, chunk_file);
            return Ok(false);
        }

        write_stylesheet(&stylesheet, &format!("{}{}", import_line, existing)).map_err(io_error)?;
        info!("Linked {} into {}", chunk_file, page_file);
        Ok(true)
    }
}

fn write_stylesheet(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

fn error_cause(err: &SplitError) -> String {
    std::error::Error::source(err)
        .map(|source| source.to_string())
        .unwrap_or_default()
}
