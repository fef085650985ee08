//! Output relocation
//!
//! After the bundler has emitted its files, shared chunks owned only by
//! subpackages are moved into each owning subpackage and every require that
//! pointed at the old location is fixed up.

mod bundle;
mod rewrite;
mod stylesheet;

use tracing::info;

use crate::analyzer::ChunkPlan;
use crate::types::FilePath;

pub use bundle::{OutputBundle, OutputFile, OutputKind};
pub use rewrite::{rewrite_chunk_code, RELOCATED_CHUNK_PREFIX};
pub use stylesheet::{InjectionReport, StylesheetInjector};

/// One shared file moved out of the build root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub from: FilePath,
    pub to: Vec<FilePath>,
}

/// Move every relocatable chunk file into its owning subpackages.
///
/// Subpackages cannot import each other's files, so a chunk owned by several
/// subpackages gets one copy per owner. The flat copy is removed. Files that
/// already live in a subpackage are left where they are.
pub fn relocate_bundle(plan: &ChunkPlan, bundle: &mut OutputBundle) -> Vec<Relocation> {
    let mut relocations = Vec::new();

    for file_name in bundle.file_names() {
        if plan.topology.subpackage_root_of_file(&file_name).is_some() {
            continue;
        }
        let Some(owners) = plan
            .relocatable_chunk_for_file(&file_name)
            .and_then(|chunk| plan.owners(chunk))
        else {
            continue;
        };
        let Some(file) = bundle.remove(&file_name) else {
            continue;
        };

        let mut targets = Vec::with_capacity(owners.len());
        for root in owners {
            let target = FilePath::new(format!("{}/{}", root, file_name.base_name()));
            info!("Moving chunk {} to {}", file_name, target);

            let mut copy = file.clone();
            copy.file_name = target.clone();
            bundle.insert(copy);
            targets.push(target);
        }

        relocations.push(Relocation {
            from: file_name,
            to: targets,
        });
    }

    relocations
}
