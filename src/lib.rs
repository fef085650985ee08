//! Splitpack library
//!
//! Subpackage-aware shared chunk splitting for mini-program builds: finds the
//! modules only subpackages depend on, groups them into shared chunks and
//! moves those chunks into the subpackages that use them.

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod plugins;
pub mod relocate;
pub mod topology;
pub mod types;
pub mod utils;

pub use analyzer::{ChunkPlan, DependencyAnalyzer, ModuleGraph};
pub use cli::Cli;
pub use config::Config;
pub use error::{Result, SplitError};
pub use plugins::{Plugin, PluginManager, SplitChunkPlugin};
pub use topology::Topology;
