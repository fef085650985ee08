//! Analyze command implementation

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::analyzer::{ChunkNaming, DependencyAnalyzer, ModuleGraph};
use crate::config::Config;
use crate::topology::Topology;
use crate::types::{ChunkName, ModuleId};
use crate::utils::format_duration;

/// Print the shared chunk plan for a module graph
#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    /// App declaration (app.json)
    #[arg(short, long)]
    pub app: Option<PathBuf>,

    /// Module graph snapshot written by the host bundler
    #[arg(short, long)]
    pub graph: Option<PathBuf>,

    /// Use readable chunk names instead of hashes
    #[arg(long)]
    pub debug: bool,

    /// Print the plan as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let start = Instant::now();

        info!("Loading configuration from {}", config_path);
        let config = Config::load(config_path)?;

        let app_path = self.app.clone().unwrap_or_else(|| config.app_config_path());
        let graph_path = self.graph.clone().unwrap_or_else(|| config.graph_path());

        let topology = Topology::from_path(&app_path)
            .with_context(|| format!("Failed to load app declaration {}", app_path.display()))?;
        let graph = ModuleGraph::from_path(&graph_path)
            .with_context(|| format!("Failed to load module graph {}", graph_path.display()))?;

        let naming = if self.debug {
            ChunkNaming::Readable
        } else {
            config.split_options().naming
        };
        let plan = DependencyAnalyzer::new(&graph, Arc::new(topology), naming).analyze();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
            return Ok(());
        }

        eprintln!(
            "{} Analyzed {} modules in {}, {} only reachable from subpackages\n",
            "✓".green().bold(),
            plan.stats.module_count,
            format_duration(start.elapsed()),
            plan.stats.relocatable_count
        );

        for (root, id) in &plan.page_id_map {
            eprintln!("  {} {} {}", "•".dimmed(), id.as_str().cyan(), root);
        }
        eprintln!();

        let mut modules: BTreeMap<&ChunkName, Vec<&ModuleId>> = BTreeMap::new();
        for (module_id, chunk) in &plan.sub_chunk_map {
            modules.entry(chunk).or_default().push(module_id);
        }

        for (chunk, owners) in &plan.chunk_page_map {
            let owners: Vec<&str> = owners.iter().map(|root| root.as_str()).collect();
            let target = if plan.is_relocatable_chunk(chunk) {
                owners.join(", ").green()
            } else {
                "stays at build root".yellow()
            };
            eprintln!("  {} {} {}", "→".blue(), chunk.as_str().cyan().bold(), target);
            for module_id in modules.get(chunk).map(Vec::as_slice).unwrap_or(&[]) {
                eprintln!("      {}", module_id.as_str().dimmed());
            }
        }

        if plan.chunk_page_map.is_empty() {
            eprintln!("  {} No shared chunks", "•".dimmed());
        }
        eprintln!();

        Ok(())
    }
}
