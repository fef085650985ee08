//! Typed identifiers
//!
//! Module ids, chunk names, page roots and output paths are all strings at
//! the bundler boundary. Each category gets its own wrapper so a chunk name
//! can never be handed to something expecting a page root.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Module id as reported by the bundler, usually an absolute source path
    /// such as `/app/src/pages/dog/index.tsx`
    ModuleId
);

string_id!(
    /// Name of a shared chunk, e.g. `page2_page3` or its hashed form
    ChunkName
);

string_id!(
    /// Directory a page or subpackage lives in, e.g. `pages/cat`
    PageRoot
);

string_id!(
    /// Short stable id of a page root, e.g. `page1`
    PageId
);

string_id!(
    /// Page entry path without extension, e.g. `pages/dog/beagle/beagle`
    PageEntryPath
);

string_id!(
    /// Output file path relative to the build root, with extension,
    /// e.g. `pages/dog/index.js`
    FilePath
);

impl FilePath {
    /// Final path segment (`pages/dog/page2.js` -> `page2.js`)
    pub fn base_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Extension of the final segment, without the dot
    pub fn extension(&self) -> Option<&str> {
        let base = self.base_name();
        base.rfind('.').filter(|&idx| idx > 0).map(|idx| &base[idx + 1..])
    }
}
