//! Page reachability
//!
//! Walks the import graph from every page entry module and records, per
//! module, which pages reach it and through which importers.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::ModuleGraph;
use crate::topology::Topology;
use crate::types::ModuleId;

/// Who reaches a module during one build
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    /// Modules on the paths from a page down to this module
    pub importers: BTreeSet<ModuleId>,

    /// Page entry modules this module is transitively reachable from
    pub page_importers: BTreeSet<ModuleId>,
}

/// Compute a record for every module reachable from some page.
///
/// Modules reachable from a main package page are dropped: the main bundle
/// loads them anyway.
pub fn collect_dependency_records(
    graph: &ModuleGraph,
    topology: &Topology,
) -> BTreeMap<ModuleId, DependencyRecord> {
    let page_modules: Vec<&ModuleId> = graph
        .module_ids()
        .into_iter()
        .filter(|id| topology.is_page_module(id))
        .collect();
    debug!("Found {} page entry modules", page_modules.len());

    let mut records: BTreeMap<ModuleId, DependencyRecord> = BTreeMap::new();
    for page in page_modules {
        walk_page(graph, page, &mut records);
    }

    let total = records.len();
    records.retain(|_, record| {
        !record
            .page_importers
            .iter()
            .any(|page| topology.is_main_page_module(page))
    });
    debug!(
        "{} of {} reachable modules are not loaded by the main package",
        records.len(),
        total
    );

    records
}

/// Depth-first walk from one page.
///
/// A module already reached by this page is only descended into again when
/// the revisit grew its importers, so new importers reach every descendant.
/// Importer sets only grow and are bounded by the graph, which terminates
/// cycles. Other pages still visit the module on their own walks.
fn walk_page(
    graph: &ModuleGraph,
    page: &ModuleId,
    records: &mut BTreeMap<ModuleId, DependencyRecord>,
) {
    let mut stack: Vec<(&ModuleId, &ModuleId)> = graph
        .imported_ids(page)
        .iter()
        .rev()
        .map(|id| (page, id))
        .collect();

    while let Some((parent, current)) = stack.pop() {
        let parent_importers = records
            .get(parent)
            .map(|record| record.importers.clone())
            .unwrap_or_default();

        let record = records.entry(current.clone()).or_default();
        let known_importers = record.importers.len();
        record.importers.insert(parent.clone());
        record.importers.extend(parent_importers);

        let first_visit = record.page_importers.insert(page.clone());
        if !first_visit && record.importers.len() == known_importers {
            continue;
        }

        stack.extend(graph.imported_ids(current).iter().rev().map(|id| (current, id)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::AppConfig;

    fn topology() -> Topology {
        let app: AppConfig = serde_json::from_str(
            r#"{
                "pages": ["pages/index/index"],
                "subPackages": [
                    { "root": "pages/cat", "pages": ["cat"] },
                    { "root": "pages/dog", "pages": ["index"] }
                ]
            }"#,
        )
        .unwrap();
        Topology::normalize(&app).unwrap()
    }

    fn graph(edges: &[(&str, &[&str])]) -> ModuleGraph {
        edges
            .iter()
            .map(|(id, imports)| {
                (
                    ModuleId::from(*id),
                    imports.iter().map(|i| ModuleId::from(*i)).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_shared_module_collects_both_pages() {
        let graph = graph(&[
            ("/src/pages/cat/cat.tsx", &["/src/utils/share.ts"]),
            ("/src/pages/dog/index.tsx", &["/src/utils/share.ts"]),
            ("/src/utils/share.ts", &[]),
        ]);
        let records = collect_dependency_records(&graph, &topology());

        let share = &records[&ModuleId::from("/src/utils/share.ts")];
        assert_eq!(share.page_importers.len(), 2);
    }

    #[test]
    fn test_main_reachable_modules_are_dropped() {
        let graph = graph(&[
            ("/src/pages/index/index.tsx", &["/src/utils/deep.ts"]),
            ("/src/pages/cat/cat.tsx", &["/src/utils/mid.ts"]),
            ("/src/utils/mid.ts", &["/src/utils/deep.ts"]),
            ("/src/utils/deep.ts", &[]),
        ]);
        let records = collect_dependency_records(&graph, &topology());

        assert!(records.contains_key(&ModuleId::from("/src/utils/mid.ts")));
        assert!(!records.contains_key(&ModuleId::from("/src/utils/deep.ts")));
    }

    #[test]
    fn test_cycles_terminate_and_propagate_importers() {
        let graph = graph(&[
            ("/src/pages/cat/cat.tsx", &["/src/a.ts"]),
            ("/src/a.ts", &["/src/b.ts"]),
            ("/src/b.ts", &["/src/a.ts", "/src/c.ts"]),
            ("/src/c.ts", &[]),
        ]);
        let records = collect_dependency_records(&graph, &topology());

        let c = &records[&ModuleId::from("/src/c.ts")];
        let importers: Vec<&str> = c.importers.iter().map(|id| id.as_str()).collect();
        assert_eq!(importers, vec!["/src/a.ts", "/src/b.ts", "/src/pages/cat/cat.tsx"]);
        assert_eq!(c.page_importers.len(), 1);
    }

    #[test]
    fn test_importers_merge_across_paths_of_one_page() {
        let graph = graph(&[
            ("/src/pages/cat/cat.tsx", &["/src/x.ts", "/src/y.ts"]),
            ("/src/x.ts", &["/src/z.ts"]),
            ("/src/y.ts", &["/src/z.ts"]),
            ("/src/z.ts", &[]),
        ]);
        let records = collect_dependency_records(&graph, &topology());

        let z = &records[&ModuleId::from("/src/z.ts")];
        let importers: Vec<&str> = z.importers.iter().map(|id| id.as_str()).collect();
        assert_eq!(importers, vec!["/src/pages/cat/cat.tsx", "/src/x.ts", "/src/y.ts"]);
    }

    #[test]
    fn test_importers_reach_descendants_of_a_meeting_point() {
        let graph = graph(&[
            ("/src/pages/cat/cat.tsx", &["/src/x.ts", "/src/y.ts"]),
            ("/src/x.ts", &["/src/p.ts"]),
            ("/src/y.ts", &["/src/p.ts"]),
            ("/src/p.ts", &["/src/c.ts"]),
            ("/src/c.ts", &["/src/leaf.ts"]),
            ("/src/leaf.ts", &[]),
        ]);
        let records = collect_dependency_records(&graph, &topology());

        let importers = |id: &str| -> Vec<String> {
            records[&ModuleId::from(id)]
                .importers
                .iter()
                .map(|id| id.to_string())
                .collect()
        };
        assert_eq!(
            importers("/src/c.ts"),
            vec!["/src/p.ts", "/src/pages/cat/cat.tsx", "/src/x.ts", "/src/y.ts"]
        );
        assert_eq!(
            importers("/src/leaf.ts"),
            vec!["/src/c.ts", "/src/p.ts", "/src/pages/cat/cat.tsx", "/src/x.ts", "/src/y.ts"]
        );
        assert_eq!(records[&ModuleId::from("/src/leaf.ts")].page_importers.len(), 1);
    }

    #[test]
    fn test_unreached_modules_have_no_record() {
        let graph = graph(&[
            ("/src/pages/cat/cat.tsx", &[]),
            ("/src/app.ts", &["/src/orphan.ts"]),
            ("/src/orphan.ts", &[]),
        ]);
        let records = collect_dependency_records(&graph, &topology());
        assert!(records.is_empty());
    }
}
