//! Shared chunk naming

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ChunkName, PageId, PageRoot};
use crate::utils::hash_content;

/// How shared chunk names are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkNaming {
    /// Underscore-joined page ids, e.g. `page2_page3`
    Readable,
    /// Hash of the readable name, fixed length
    #[default]
    Hashed,
}

impl ChunkNaming {
    pub fn from_readable_flag(readable: bool) -> Self {
        if readable {
            ChunkNaming::Readable
        } else {
            ChunkNaming::Hashed
        }
    }

    /// Name of the chunk owned by `page_ids`, which must already be sorted
    pub fn chunk_name(&self, page_ids: &[&PageId]) -> ChunkName {
        let joined = page_ids
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join("_");
        match self {
            ChunkNaming::Readable => ChunkName::new(joined),
            ChunkNaming::Hashed => ChunkName::new(hash_content(joined.as_bytes())),
        }
    }
}

/// Stable short ids for page roots.
///
/// Roots are sorted before numbering so the same topology always yields the
/// same ids, and therefore the same chunk names.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageIds {
    pub page_id_map: BTreeMap<PageRoot, PageId>,
    pub id_page_map: BTreeMap<PageId, PageRoot>,
}

impl PageIds {
    pub fn assign<'a>(roots: impl IntoIterator<Item = &'a PageRoot>) -> Self {
        let mut sorted: Vec<&PageRoot> = roots.into_iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut ids = Self::default();
        for (index, root) in sorted.into_iter().enumerate() {
            let id = PageId::new(format!("page{}", index + 1));
            ids.page_id_map.insert(root.clone(), id.clone());
            ids.id_page_map.insert(id, root.clone());
        }
        ids
    }

    pub fn id_of(&self, root: &PageRoot) -> Option<&PageId> {
        self.page_id_map.get(root)
    }
}
