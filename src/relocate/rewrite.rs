//! Require path rewriting for relocated chunks

use regex::Regex;
use tracing::{debug, warn};

use crate::analyzer::ChunkPlan;
use crate::config::SplitOptions;
use crate::types::{ChunkName, FilePath, PageRoot};
use crate::utils::relative_level;

/// A relocated chunk sits at `<build root>/<subpackage root>/<chunk>`, two
/// levels below the runtime chunks.
pub const RELOCATED_CHUNK_PREFIX: &str = "../../";

/// Rewrite the requires of one emitted script so they still resolve once
/// shared chunks are moved into their subpackages.
///
/// Returns `None` when the code needs no change.
pub fn rewrite_chunk_code(
    plan: &ChunkPlan,
    options: &SplitOptions,
    file_name: &FilePath,
    code: &str,
) -> Option<String> {
    if plan.relocatable_chunk_for_file(file_name).is_some() {
        let rewritten = rewrite_runtime_requires(code, options);
        return (rewritten != code).then_some(rewritten);
    }

    let root = plan.topology.subpackage_root_of_file(file_name)?;
    let rewritten = rewrite_shared_chunk_requires(plan, options, root, file_name, code);
    (rewritten != code).then_some(rewritten)
}

/// `require('./vendors.js')` -> `require('../../vendors.js')` for every runtime chunk
fn rewrite_runtime_requires(code: &str, options: &SplitOptions) -> String {
    let mut rewritten = code.to_string();
    for name in &options.runtime_chunks {
        for quote in ['\'', '"'] {
            let from = format!("require({q}./{name}.{ext}{q})", q = quote, name = name, ext = options.script_ext);
            let to = format!(
                "require({q}{prefix}{name}.{ext}{q})",
                q = quote,
                prefix = RELOCATED_CHUNK_PREFIX,
                name = name,
                ext = options.script_ext
            );
            rewritten = rewritten.replace(&from, &to);
        }
    }
    rewritten
}

/// Point requires of shared chunks owned by `root` at the copy inside `root`
fn rewrite_shared_chunk_requires(
    plan: &ChunkPlan,
    options: &SplitOptions,
    root: &PageRoot,
    file_name: &FilePath,
    code: &str,
) -> String {
    let path_in_root = &file_name.as_str()[root.as_str().len()..];
    let prefix = relative_level(path_in_root);

    let mut rewritten = code.to_string();
    for chunk in plan.chunk_names() {
        if !rewritten.contains(chunk.as_str()) || !plan.is_relocatable_chunk(chunk) {
            continue;
        }
        let owned_here = plan
            .owners(chunk)
            .is_some_and(|owners| owners.contains(root));
        if !owned_here {
            continue;
        }

        let pattern = match require_pattern(chunk, &options.script_ext) {
            Ok(pattern) => pattern,
            Err(err) => {
                warn!("Skipping require rewrite for {}: {}", chunk, err);
                continue;
            }
        };
        let replacement = format!("require('{}{}.{}')", prefix, chunk, options.script_ext);
        let next = pattern.replace_all(&rewritten, regex::NoExpand(&replacement));
        if next != rewritten {
            debug!("Rewrote requires of {} in {}", chunk, file_name);
            rewritten = next.into_owned();
        }
    }
    rewritten
}

/// Matches `require('<prefix><chunk>.<ext>')` where the prefix is `./` or any
/// number of `../`, in either quote style
fn require_pattern(chunk: &ChunkName, ext: &str) -> Result<Regex, regex::Error> {
    let target = format!(
        r"(?:\./|(?:\.\./)+){}\.{}",
        regex::escape(chunk.as_str()),
        regex::escape(ext)
    );
    Regex::new(&format!(r#"require\((?:'{target}'|"{target}")\)"#, target = target))
}
