//! Utility functions and helpers

use std::path::Path;

use sha2::{Digest, Sha256};

/// Generate a hash of the given content
pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    hex::encode(&result[..8])
}

/// Clean a path by removing . and .. components
pub fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }

    if path.starts_with('/') {
        format!("/{}", parts.join("/"))
    } else {
        parts.join("/")
    }
}

/// Convert a file system path to the forward-slash form used in bundle keys
pub fn to_slash_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

/// File name without directory and extension.
///
/// Source maps keep their double extension, so `page2.js.map` yields `page2`
/// like the chunk it belongs to.
pub fn file_name_without_ext(file_name: &str) -> &str {
    const JS_MAP_EXT: &str = ".js.map";

    let base = file_name.rsplit('/').next().unwrap_or(file_name);
    if let Some(stem) = base.strip_suffix(JS_MAP_EXT) {
        return stem;
    }
    match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    }
}

/// Relative prefix a file needs to reach the root directory it lives in.
///
/// `path_in_root` is the file's path below that root: `index.js` sits in the
/// root itself (`./`), `beagle/beagle.js` is one level down (`../`).
pub fn relative_level(path_in_root: &str) -> String {
    let depth = path_in_root.split('/').filter(|s| !s.is_empty()).count();
    if depth <= 1 {
        "./".to_string()
    } else {
        "../".repeat(depth - 1)
    }
}

/// Format bytes as human-readable size
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    const GB: usize = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f64();

    if secs >= 60.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining_secs = secs - (mins as f64 * 60.0);
        format!("{}m {:.2}s", mins, remaining_secs)
    } else if secs >= 1.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.0}ms", secs * 1000.0)
    }
}
