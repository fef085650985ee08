//! Subpackage shared chunk plugin
//!
//! Collects the module graph while the host parses modules, analyzes it at
//! build end, forces grouped modules into their shared chunks, then moves
//! those chunks into the owning subpackages and links shared stylesheets.
//!
//! Nothing here fails the host build. Without a topology or a plan every hook
//! passes its input through unchanged.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{info, warn};

use super::{ModuleInfo, Plugin, PluginContext, RenderResult};
use crate::analyzer::{compose_manual_chunks, ChunkPlan, DependencyAnalyzer, ManualChunkFn, ModuleGraph};
use crate::config::SplitOptions;
use crate::relocate::{relocate_bundle, rewrite_chunk_code, OutputBundle, StylesheetInjector};
use crate::topology::Topology;
use crate::types::{ChunkName, FilePath, ModuleId};

pub struct SplitChunkPlugin {
    /// Normalized app layout; `None` when the declaration could not be loaded
    topology: Option<Arc<Topology>>,

    options: SplitOptions,

    /// Import edges of the current build
    graph: RwLock<ModuleGraph>,

    /// Analysis result of the current build
    plan: Arc<RwLock<Option<Arc<ChunkPlan>>>>,

    injector: StylesheetInjector,
}

impl SplitChunkPlugin {
    pub fn new(topology: Topology, options: SplitOptions) -> Self {
        Self::with_topology(Some(Arc::new(topology)), options)
    }

    /// Load the app declaration from disk. A declaration that cannot be read
    /// or lacks its page list disables the plugin for every build.
    pub fn from_app_config(path: &Path, options: SplitOptions) -> Self {
        let topology = match Topology::from_path(path) {
            Ok(topology) => {
                info!("Loaded app declaration {}", path.display());
                Some(Arc::new(topology))
            }
            Err(err) => {
                warn!("Failed to load {}: {}; shared chunks stay in place", path.display(), err);
                None
            }
        };
        Self::with_topology(topology, options)
    }

    fn with_topology(topology: Option<Arc<Topology>>, options: SplitOptions) -> Self {
        let injector = StylesheetInjector::new(options.style_ext.clone());
        Self {
            topology,
            options,
            graph: RwLock::new(ModuleGraph::new()),
            plan: Arc::new(RwLock::new(None)),
            injector,
        }
    }

    /// Plan produced by the last `build_end`
    pub fn plan(&self) -> Option<Arc<ChunkPlan>> {
        self.plan.read().clone()
    }

    /// Chunk rule for hosts that take a single function: this plugin's
    /// decision first, then `fallback`.
    pub fn manual_chunks(&self, fallback: Option<ManualChunkFn>) -> ManualChunkFn {
        let plan = Arc::clone(&self.plan);
        let primary: ManualChunkFn = Arc::new(move |module_id: &ModuleId| {
            plan.read().as_ref().and_then(|plan| plan.manual_chunk(module_id))
        });
        compose_manual_chunks(primary, fallback)
    }
}

#[async_trait]
impl Plugin for SplitChunkPlugin {
    fn name(&self) -> &str {
        "split-chunk"
    }

    async fn build_start(&self, _ctx: &PluginContext) -> Result<()> {
        self.graph.write().clear();
        *self.plan.write() = None;
        Ok(())
    }

    async fn module_parsed(&self, module: &ModuleInfo, _ctx: &PluginContext) -> Result<()> {
        self.graph
            .write()
            .record(module.id.clone(), module.imported_ids.clone());
        Ok(())
    }

    async fn build_end(&self, _ctx: &PluginContext) -> Result<()> {
        let Some(topology) = &self.topology else {
            warn!("No app declaration, skipping dependency analysis");
            return Ok(());
        };

        let plan = {
            let graph = self.graph.read();
            DependencyAnalyzer::new(&graph, Arc::clone(topology), self.options.naming).analyze()
        };
        info!("Planned {} shared chunks", plan.stats.chunk_count);
        *self.plan.write() = Some(Arc::new(plan));
        Ok(())
    }

    fn manual_chunk(&self, module_id: &ModuleId) -> Option<ChunkName> {
        self.plan.read().as_ref()?.manual_chunk(module_id)
    }

    async fn render_chunk(
        &self,
        code: &str,
        file_name: &FilePath,
        _ctx: &PluginContext,
    ) -> Result<RenderResult> {
        let Some(plan) = self.plan() else {
            return Ok(RenderResult::Skip);
        };
        Ok(match rewrite_chunk_code(&plan, &self.options, file_name, code) {
            Some(rewritten) => {
                info!("Updated chunk requires in {}", file_name);
                RenderResult::Rendered { code: rewritten }
            }
            None => RenderResult::Skip,
        })
    }

    async fn generate_bundle(&self, bundle: &mut OutputBundle, _ctx: &PluginContext) -> Result<()> {
        let Some(plan) = self.plan() else {
            warn!("Dependency analysis did not run, leaving output in place");
            return Ok(());
        };
        let relocations = relocate_bundle(&plan, bundle);
        info!("Relocated {} shared files", relocations.len());
        Ok(())
    }

    async fn write_bundle(&self, bundle: &OutputBundle, ctx: &PluginContext) -> Result<()> {
        let Some(plan) = self.plan() else {
            return Ok(());
        };
        let report = self.injector.inject(&plan, &ctx.dist, bundle);
        if report.failed > 0 {
            warn!("{} page stylesheets could not be linked", report.failed);
        }
        info!(
            "Linked shared stylesheets into {} pages ({} already linked)",
            report.linked, report.unchanged
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ChunkNaming;
    use crate::plugins::PluginManager;
    use crate::relocate::OutputFile;
    use crate::topology::AppConfig;
    use std::fs;

    fn topology() -> Topology {
        let app: AppConfig = serde_json::from_str(
            r#"{
                "pages": ["pages/index/index"],
                "subPackages": [
                    { "root": "pages/cat", "pages": ["cat"] },
                    { "root": "pages/dog", "pages": ["index", "beagle/beagle"] }
                ]
            }"#,
        )
        .unwrap();
        Topology::normalize(&app).unwrap()
    }

    fn readable() -> SplitOptions {
        SplitOptions {
            naming: ChunkNaming::Readable,
            ..SplitOptions::default()
        }
    }

    fn module(id: &str, imports: &[&str]) -> ModuleInfo {
        ModuleInfo {
            id: ModuleId::from(id),
            imported_ids: imports.iter().map(|i| ModuleId::from(*i)).collect(),
        }
    }

    async fn run_build(manager: &PluginManager) {
        manager.run_build_start().await.unwrap();
        for info in [
            module("/src/pages/index/index.tsx", &["/src/utils/main.ts"]),
            module("/src/pages/cat/cat.tsx", &["/src/utils/share.ts", "/src/styles/share.scss"]),
            module("/src/pages/dog/index.tsx", &["/src/utils/share.ts", "/src/styles/share.scss"]),
            module("/src/pages/dog/beagle/beagle.tsx", &["/src/utils/share.ts"]),
            module("/src/utils/share.ts", &[]),
            module("/src/styles/share.scss", &[]),
            module("/src/utils/main.ts", &[]),
        ] {
            manager.module_parsed(&info).await.unwrap();
        }
        manager.run_build_end().await.unwrap();
    }

    #[tokio::test]
    async fn test_end_to_end_build() {
        let dist = tempfile::tempdir().unwrap();
        let plugin = Arc::new(SplitChunkPlugin::new(topology(), readable()));
        let mut manager = PluginManager::new(dist.path().to_path_buf(), dist.path().to_path_buf());
        manager.register(plugin.clone());

        run_build(&manager).await;

        // page1 = pages/cat, page2 = pages/dog
        let shared = manager.manual_chunk(&ModuleId::from("/src/utils/share.ts"));
        assert_eq!(shared, Some(ChunkName::from("page1_page2")));
        assert_eq!(manager.manual_chunk(&ModuleId::from("/src/utils/main.ts")), None);

        let mut bundle: OutputBundle = [
            OutputFile::chunk("page1_page2.js", "var t = require('./taro.js');"),
            OutputFile::asset("page1_page2.wxss", ".share {}"),
            OutputFile::chunk("pages/cat/cat.js", "require('../../page1_page2.js');"),
            OutputFile::chunk("pages/dog/index.js", "require('../../page1_page2.js');"),
            OutputFile::chunk("pages/dog/beagle/beagle.js", "require('../../../page1_page2.js');"),
            OutputFile::chunk("taro.js", "runtime"),
        ]
        .into_iter()
        .collect();
        let before = bundle.file_names();

        assert_eq!(manager.render_chunks(&mut bundle).await.unwrap(), 4);
        manager.run_generate_bundle(&mut bundle).await.unwrap();
        bundle.write_to_dir(dist.path(), &before).unwrap();
        manager.run_write_bundle(&bundle).await.unwrap();

        for root in ["pages/cat", "pages/dog"] {
            let chunk = fs::read_to_string(dist.path().join(root).join("page1_page2.js")).unwrap();
            assert_eq!(chunk, "var t = require('../../taro.js');");
        }
        assert!(!dist.path().join("page1_page2.js").exists());
        assert!(dist.path().join("taro.js").exists());

        let beagle = fs::read_to_string(dist.path().join("pages/dog/beagle/beagle.js")).unwrap();
        assert_eq!(beagle, "require('../page1_page2.js');");
        let cat = fs::read_to_string(dist.path().join("pages/cat/cat.js")).unwrap();
        assert_eq!(cat, "require('./page1_page2.js');");

        let dog_style = fs::read_to_string(dist.path().join("pages/dog/index.wxss")).unwrap();
        assert_eq!(dog_style, "@import \"./page1_page2.wxss\";\n");

        // A rebuild over the already modified output adds nothing
        run_build(&manager).await;
        manager.run_write_bundle(&bundle).await.unwrap();
        let dog_style = fs::read_to_string(dist.path().join("pages/dog/index.wxss")).unwrap();
        assert_eq!(dog_style.matches("@import").count(), 1);
    }

    #[tokio::test]
    async fn test_fallback_rule_applies_to_unplanned_modules() {
        let plugin = Arc::new(SplitChunkPlugin::new(topology(), readable()));
        let vendors: ManualChunkFn = Arc::new(|id: &ModuleId| {
            id.as_str()
                .contains("node_modules")
                .then(|| ChunkName::from("vendors"))
        });
        let mut manager = PluginManager::new(".".into(), "dist".into()).with_manual_chunks(vendors.clone());
        manager.register(plugin.clone());
        run_build(&manager).await;

        let decide = plugin.manual_chunks(Some(vendors));
        let lodash = ModuleId::from("/node_modules/lodash/index.js");
        assert_eq!(decide(&lodash), Some(ChunkName::from("vendors")));
        assert_eq!(manager.manual_chunk(&lodash), Some(ChunkName::from("vendors")));
        assert_eq!(
            decide(&ModuleId::from("/src/utils/share.ts")),
            Some(ChunkName::from("page1_page2"))
        );
    }

    #[tokio::test]
    async fn test_missing_app_declaration_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = Arc::new(SplitChunkPlugin::from_app_config(
            &dir.path().join("missing.json"),
            SplitOptions::default(),
        ));
        let mut manager = PluginManager::new(dir.path().to_path_buf(), dir.path().to_path_buf());
        manager.register(plugin.clone());
        run_build(&manager).await;

        assert!(plugin.plan().is_none());
        assert_eq!(manager.manual_chunk(&ModuleId::from("/src/utils/share.ts")), None);

        let mut bundle: OutputBundle = [OutputFile::chunk("pages/cat/cat.js", "require('../../x.js');")]
            .into_iter()
            .collect();
        assert_eq!(manager.render_chunks(&mut bundle).await.unwrap(), 0);
        manager.run_generate_bundle(&mut bundle).await.unwrap();
        assert!(bundle.contains("pages/cat/cat.js"));
    }
}
