//! Plugin system
//!
//! Rollup-style build hooks. The host bundler drives them in build order:
//! `build_start`, `module_parsed` per module, `build_end`, `manual_chunk`
//! while chunking, `render_chunk` per emitted script, `generate_bundle`
//! before writing and `write_bundle` after the files are on disk.

mod split_chunk;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::analyzer::ManualChunkFn;
use crate::relocate::{OutputBundle, OutputKind};
use crate::types::{ChunkName, FilePath, ModuleId};

pub use split_chunk::SplitChunkPlugin;

/// Plugin hook context
pub struct PluginContext {
    /// Project root directory
    pub root: PathBuf,

    /// Directory the bundle is written to
    pub dist: PathBuf,
}

/// A module as reported by the host once it has been parsed
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub id: ModuleId,
    pub imported_ids: Vec<ModuleId>,
}

/// Result of a render_chunk hook
pub enum RenderResult {
    /// Continue to next plugin (code unchanged)
    Skip,
    /// Rewritten code
    Rendered { code: String },
}

/// Plugin trait
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin name for logging and debugging
    fn name(&self) -> &str;

    /// Called when the build starts
    async fn build_start(&self, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Called once per parsed module
    async fn module_parsed(&self, _module: &ModuleInfo, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Called when the module graph is complete
    async fn build_end(&self, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Force a module into a named chunk. `None` lets the next rule decide.
    fn manual_chunk(&self, _module_id: &ModuleId) -> Option<ChunkName> {
        None
    }

    /// Rewrite the code of an emitted script
    async fn render_chunk(
        &self,
        _code: &str,
        _file_name: &FilePath,
        _ctx: &PluginContext,
    ) -> Result<RenderResult> {
        Ok(RenderResult::Skip)
    }

    /// Adjust the emitted files before they are written
    async fn generate_bundle(&self, _bundle: &mut OutputBundle, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Called after the bundle has been written to `ctx.dist`
    async fn write_bundle(&self, _bundle: &OutputBundle, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }
}

/// Plugin manager
pub struct PluginManager {
    plugins: Vec<Arc<dyn Plugin>>,
    context: PluginContext,
    /// Chunk rule configured before any plugin was installed
    fallback_manual_chunks: Option<ManualChunkFn>,
}

impl PluginManager {
    /// Create a new plugin manager
    pub fn new(root: PathBuf, dist: PathBuf) -> Self {
        Self {
            plugins: Vec::new(),
            context: PluginContext { root, dist },
            fallback_manual_chunks: None,
        }
    }

    /// Keep a previously configured chunk rule as the last resort
    pub fn with_manual_chunks(mut self, fallback: ManualChunkFn) -> Self {
        self.fallback_manual_chunks = Some(fallback);
        self
    }

    /// Register a plugin
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Run build_start hooks
    pub async fn run_build_start(&self) -> Result<()> {
        for plugin in &self.plugins {
            plugin.build_start(&self.context).await?;
        }
        Ok(())
    }

    /// Run module_parsed hooks
    pub async fn module_parsed(&self, module: &ModuleInfo) -> Result<()> {
        for plugin in &self.plugins {
            plugin.module_parsed(module, &self.context).await?;
        }
        Ok(())
    }

    /// Run build_end hooks
    pub async fn run_build_end(&self) -> Result<()> {
        for plugin in &self.plugins {
            plugin.build_end(&self.context).await?;
        }
        Ok(())
    }

    /// First forced chunk any plugin reports, then the fallback rule
    pub fn manual_chunk(&self, module_id: &ModuleId) -> Option<ChunkName> {
        self.plugins
            .iter()
            .find_map(|plugin| plugin.manual_chunk(module_id))
            .or_else(|| {
                self.fallback_manual_chunks
                    .as_ref()
                    .and_then(|fallback| fallback(module_id))
            })
    }

    /// Run render_chunk hooks over every script in the bundle.
    ///
    /// Returns the number of scripts whose code changed.
    pub async fn render_chunks(&self, bundle: &mut OutputBundle) -> Result<usize> {
        let mut changed = 0;

        for file in bundle.iter_mut() {
            let OutputKind::Chunk { code } = &mut file.kind else {
                continue;
            };
            let mut current_code: Option<String> = None;

            for plugin in &self.plugins {
                let input = current_code.as_deref().unwrap_or(code.as_str());
                match plugin.render_chunk(input, &file.file_name, &self.context).await? {
                    RenderResult::Skip => continue,
                    RenderResult::Rendered { code: rendered } => {
                        debug!("{} rendered {}", plugin.name(), file.file_name);
                        current_code = Some(rendered);
                    }
                }
            }

            if let Some(new_code) = current_code {
                *code = new_code;
                changed += 1;
            }
        }

        Ok(changed)
    }

    /// Run generate_bundle hooks
    pub async fn run_generate_bundle(&self, bundle: &mut OutputBundle) -> Result<()> {
        for plugin in &self.plugins {
            plugin.generate_bundle(bundle, &self.context).await?;
        }
        Ok(())
    }

    /// Run write_bundle hooks
    pub async fn run_write_bundle(&self, bundle: &OutputBundle) -> Result<()> {
        for plugin in &self.plugins {
            plugin.write_bundle(bundle, &self.context).await?;
        }
        Ok(())
    }
}
