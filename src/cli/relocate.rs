//! Relocate command implementation
//!
//! Plays the host bundler for an already emitted build: replays the module
//! graph through the plugin hooks, then renders, relocates and writes the
//! output directory in place.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::analyzer::{ChunkNaming, ModuleGraph};
use crate::config::Config;
use crate::plugins::{ModuleInfo, PluginManager, SplitChunkPlugin};
use crate::relocate::OutputBundle;
use crate::utils::{format_duration, format_size};

/// Move shared chunks of an emitted build into their subpackages
#[derive(Args, Debug)]
pub struct RelocateCommand {
    /// App declaration (app.json)
    #[arg(short, long)]
    pub app: Option<PathBuf>,

    /// Module graph snapshot written by the host bundler
    #[arg(short, long)]
    pub graph: Option<PathBuf>,

    /// Output directory of the build
    #[arg(short, long)]
    pub dist: Option<PathBuf>,

    /// The build was made with readable chunk names
    #[arg(long)]
    pub debug: bool,
}

impl RelocateCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let start = Instant::now();

        info!("Loading configuration from {}", config_path);
        let config = Config::load(config_path)?;

        let app_path = self.app.clone().unwrap_or_else(|| config.app_config_path());
        let graph_path = self.graph.clone().unwrap_or_else(|| config.graph_path());
        let dist = self.dist.clone().unwrap_or_else(|| config.output_dir());

        let mut options = config.split_options();
        if self.debug {
            options.naming = ChunkNaming::Readable;
        }
        let script_ext = options.script_ext.clone();

        let graph = ModuleGraph::from_path(&graph_path)
            .with_context(|| format!("Failed to load module graph {}", graph_path.display()))?;

        let plugin = Arc::new(SplitChunkPlugin::from_app_config(&app_path, options));
        let mut manager = PluginManager::new(config.root.clone(), dist.clone());
        manager.register(plugin.clone());

        eprintln!("{} Analyzing {} modules...", "→".blue(), graph.len());

        manager.run_build_start().await?;
        for module_id in graph.module_ids() {
            let module = ModuleInfo {
                id: module_id.clone(),
                imported_ids: graph.imported_ids(module_id).to_vec(),
            };
            manager.module_parsed(&module).await?;
        }
        manager.run_build_end().await?;

        let mut bundle = OutputBundle::from_dir(&dist, &script_ext)
            .with_context(|| format!("Failed to read build output {}", dist.display()))?;
        let previous = bundle.file_names();

        let rendered = manager.render_chunks(&mut bundle).await?;
        manager.run_generate_bundle(&mut bundle).await?;
        let written = bundle.write_to_dir(&dist, &previous)?;
        manager.run_write_bundle(&bundle).await?;

        let Some(plan) = plugin.plan() else {
            eprintln!(
                "\n{} No app declaration at {}, output left unchanged\n",
                "!".yellow().bold(),
                app_path.display()
            );
            return Ok(());
        };

        eprintln!(
            "\n{} Relocated {} shared chunk(s), rewrote {} script(s), wrote {} file(s) in {}\n",
            "✓".green().bold(),
            plan.chunk_page_map
                .keys()
                .filter(|chunk| plan.is_relocatable_chunk(chunk))
                .count(),
            rendered,
            written,
            format_duration(start.elapsed())
        );

        for file in bundle.iter() {
            let relocated = plan.relocatable_chunk_for_file(&file.file_name).is_some()
                && plan.topology.subpackage_root_of_file(&file.file_name).is_some();
            if !relocated {
                continue;
            }
            eprintln!(
                "  {} {} {}",
                "•".dimmed(),
                file.file_name.as_str().cyan(),
                format_size(file.size()).dimmed()
            );
        }

        eprintln!();

        Ok(())
    }
}
