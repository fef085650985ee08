//! Emitted output files

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::Result;
use crate::types::FilePath;
use crate::utils::to_slash_path;

/// Content of one emitted file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputKind {
    /// Script produced from modules
    Chunk { code: String },
    /// Anything else: stylesheets, source maps, images
    Asset { source: Vec<u8> },
}

/// One emitted file and the path it will be written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub file_name: FilePath,
    pub kind: OutputKind,
}

impl OutputFile {
    pub fn chunk(file_name: impl Into<FilePath>, code: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            kind: OutputKind::Chunk { code: code.into() },
        }
    }

    pub fn asset(file_name: impl Into<FilePath>, source: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            kind: OutputKind::Asset {
                source: source.into(),
            },
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match &self.kind {
            OutputKind::Chunk { code } => code.as_bytes(),
            OutputKind::Asset { source } => source,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes().len()
    }
}

/// Emitted files keyed by output path
#[derive(Debug, Clone, Default)]
pub struct OutputBundle {
    files: BTreeMap<FilePath, OutputFile>,
}

impl OutputBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every file under `dir`. Files with `script_ext` become chunks.
    pub fn from_dir(dir: &Path, script_ext: &str) -> Result<Self> {
        let mut bundle = Self::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
            let file_name = FilePath::new(to_slash_path(relative));

            let source = fs::read(entry.path())?;
            let file = if file_name.extension() == Some(script_ext) {
                match String::from_utf8(source) {
                    Ok(code) => OutputFile::chunk(file_name, code),
                    Err(err) => {
                        debug!("{} is not UTF-8, keeping it as an asset", file_name);
                        OutputFile::asset(file_name, err.into_bytes())
                    }
                }
            } else {
                OutputFile::asset(file_name, source)
            };
            bundle.insert(file);
        }

        debug!("Loaded {} files from {}", bundle.len(), dir.display());
        Ok(bundle)
    }

    /// Write the files of the bundle under `dir` and delete the files in
    /// `previous` that are no longer part of it.
    ///
    /// Files whose content on disk is already identical are left untouched.
    /// Returns the number of files written.
    pub fn write_to_dir(&self, dir: &Path, previous: &BTreeSet<FilePath>) -> Result<usize> {
        let mut written = 0;
        for file in self.files.values() {
            let path = dir.join(file.file_name.as_str());
            if fs::read(&path).is_ok_and(|existing| existing == file.bytes()) {
                continue;
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, file.bytes())?;
            written += 1;
        }

        for stale in previous.iter().filter(|name| !self.files.contains_key(*name)) {
            let path = dir.join(stale.as_str());
            debug!("Removing {}", path.display());
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }

        debug!("Wrote {} files to {}", written, dir.display());
        Ok(written)
    }

    pub fn insert(&mut self, file: OutputFile) -> Option<OutputFile> {
        self.files.insert(file.file_name.clone(), file)
    }

    pub fn remove(&mut self, file_name: &FilePath) -> Option<OutputFile> {
        self.files.remove(file_name)
    }

    pub fn get(&self, file_name: &str) -> Option<&OutputFile> {
        self.files.get(file_name)
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.files.contains_key(file_name)
    }

    pub fn file_names(&self) -> BTreeSet<FilePath> {
        self.files.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputFile> {
        self.files.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut OutputFile> {
        self.files.values_mut()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FromIterator<OutputFile> for OutputBundle {
    fn from_iter<I: IntoIterator<Item = OutputFile>>(iter: I) -> Self {
        let mut bundle = Self::new();
        for file in iter {
            bundle.insert(file);
        }
        bundle
    }
}
