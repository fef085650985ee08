//! Dependency analysis
//!
//! Runs once the module graph of a build is complete. Decides which modules
//! leave default bundler placement and which shared chunk each one goes to.

mod chunk;
mod graph;
mod reachability;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::topology::Topology;
use crate::types::{ChunkName, FilePath, ModuleId, PageId, PageRoot};
use crate::utils::file_name_without_ext;

pub use chunk::{ChunkNaming, PageIds};
pub use graph::ModuleGraph;
pub use reachability::{collect_dependency_records, DependencyRecord};

/// Chunk assignment callback used by the host: `Some(name)` forces the module
/// into that chunk, `None` leaves the decision to the next rule.
pub type ManualChunkFn = Arc<dyn Fn(&ModuleId) -> Option<ChunkName> + Send + Sync>;

/// Try `primary` first and fall back to a previously configured rule
pub fn compose_manual_chunks(primary: ManualChunkFn, fallback: Option<ManualChunkFn>) -> ManualChunkFn {
    match fallback {
        None => primary,
        Some(fallback) => Arc::new(move |module_id: &ModuleId| {
            primary(module_id).or_else(|| fallback(module_id))
        }),
    }
}

/// Counters reported after analysis
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisStats {
    /// Modules recorded in the graph
    pub module_count: usize,

    /// Modules not reachable from the main package
    pub relocatable_count: usize,

    /// Distinct shared chunks
    pub chunk_count: usize,
}

/// Result of one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct ChunkPlan {
    /// Module id -> shared chunk it is forced into
    pub sub_chunk_map: BTreeMap<ModuleId, ChunkName>,

    /// Shared chunk -> sorted page roots that depend on it
    pub chunk_page_map: BTreeMap<ChunkName, Vec<PageRoot>>,

    pub page_id_map: BTreeMap<PageRoot, PageId>,

    pub id_page_map: BTreeMap<PageId, PageRoot>,

    pub stats: AnalysisStats,

    #[serde(skip)]
    pub topology: Arc<Topology>,
}

impl ChunkPlan {
    /// Forced chunk for a module, if analysis grouped it
    pub fn manual_chunk(&self, module_id: &ModuleId) -> Option<ChunkName> {
        self.sub_chunk_map.get(module_id).cloned()
    }

    /// Page roots that own a chunk
    pub fn owners(&self, chunk: &ChunkName) -> Option<&[PageRoot]> {
        self.chunk_page_map.get(chunk).map(Vec::as_slice)
    }

    /// A chunk moves out of the build root when every owner is a subpackage
    pub fn is_relocatable_chunk(&self, chunk: &ChunkName) -> bool {
        self.owners(chunk).is_some_and(|roots| {
            !roots.is_empty() && roots.iter().all(|root| self.topology.is_subpackage_root(root))
        })
    }

    /// Chunk an output file belongs to (`page2.js`, `page2.wxss`, `page2.js.map`)
    pub fn chunk_for_file(&self, file_name: &FilePath) -> Option<&ChunkName> {
        let stem = file_name_without_ext(file_name.as_str());
        self.chunk_page_map.get_key_value(stem).map(|(name, _)| name)
    }

    /// Like [`chunk_for_file`](Self::chunk_for_file), restricted to relocatable chunks
    pub fn relocatable_chunk_for_file(&self, file_name: &FilePath) -> Option<&ChunkName> {
        self.chunk_for_file(file_name)
            .filter(|chunk| self.is_relocatable_chunk(chunk))
    }

    pub fn chunk_names(&self) -> impl Iterator<Item = &ChunkName> {
        self.chunk_page_map.keys()
    }
}

/// Builds a [`ChunkPlan`] from a module graph and the app topology
pub struct DependencyAnalyzer<'a> {
    graph: &'a ModuleGraph,
    topology: Arc<Topology>,
    naming: ChunkNaming,
}

impl<'a> DependencyAnalyzer<'a> {
    pub fn new(graph: &'a ModuleGraph, topology: Arc<Topology>, naming: ChunkNaming) -> Self {
        Self {
            graph,
            topology,
            naming,
        }
    }

    pub fn analyze(&self) -> ChunkPlan {
        if !self.topology.sub_packages.is_empty() {
            info!("Subpackages enabled: {}", self.topology.sub_packages.len());
        }

        let records = collect_dependency_records(self.graph, &self.topology);
        let page_ids = PageIds::assign(self.topology.page_root_list.iter());
        debug!("pageIdMap: {:?}", page_ids.page_id_map);

        let mut sub_chunk_map = BTreeMap::new();
        let mut chunk_page_map = BTreeMap::new();

        for (module_id, record) in &records {
            let mut roots: Vec<PageRoot> = record
                .page_importers
                .iter()
                .filter_map(|page| self.topology.page_root_of(page))
                .cloned()
                .collect();
            // Imported only by non-page files, e.g. app.ts
            if roots.is_empty() {
                continue;
            }
            // Ids are numbered in root order, so this is also page id order
            roots.sort();
            roots.dedup();

            let ids: Vec<&PageId> = roots.iter().filter_map(|root| page_ids.id_of(root)).collect();
            let chunk_name = self.naming.chunk_name(&ids);

            chunk_page_map.insert(chunk_name.clone(), roots);
            sub_chunk_map.insert(module_id.clone(), chunk_name);
        }

        let stats = AnalysisStats {
            module_count: self.graph.len(),
            relocatable_count: records.len(),
            chunk_count: chunk_page_map.len(),
        };
        info!("Modules in app: {}", stats.module_count);
        info!("Modules eligible for subpackage chunks: {}", stats.relocatable_count);
        debug!("subChunkMap: {:?}", sub_chunk_map);

        ChunkPlan {
            sub_chunk_map,
            chunk_page_map,
            page_id_map: page_ids.page_id_map,
            id_page_map: page_ids.id_page_map,
            stats,
            topology: Arc::clone(&self.topology),
        }
    }
}
