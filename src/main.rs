use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use lazyimg::{
    lazify, DomTree, LazyLoader, LoaderConfig, NodeId, Rect, TransformOptions, Viewport,
};

#[derive(Parser)]
#[command(name = "lazyimg", version, about = "Lazy-image markup transform and load simulation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite image markup in an HTML file into its lazy form
    Transform {
        /// Input HTML file
        input: PathBuf,

        /// Placeholder URI applied as the src of deferred images
        #[arg(long)]
        placeholder: Option<String>,

        /// Skip the <noscript> fallback markup
        #[arg(long)]
        no_noscript: bool,

        /// Loader configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Attach the observer to an HTML file and scroll a synthetic layout
    /// through the viewport, reporting promotions per step
    Simulate {
        /// Input HTML file
        input: PathBuf,

        /// Viewport height in pixels
        #[arg(long, default_value_t = 720)]
        viewport_height: u32,

        /// Scroll step in pixels
        #[arg(long, default_value_t = 400)]
        step: u32,

        /// Promote everything eagerly (no watcher capability)
        #[arg(long)]
        eager: bool,

        /// Loader configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct SimulationReport {
    mode: &'static str,
    candidates: usize,
    promoted: usize,
    steps: Vec<StepReport>,
}

#[derive(Serialize)]
struct StepReport {
    scroll_y: i32,
    promoted: usize,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<LoaderConfig> {
    let config = match path {
        Some(p) => {
            let raw = fs::read_to_string(p)
                .with_context(|| format!("failed to read config file {}", p.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse config file {}", p.display()))?
        }
        None => LoaderConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run_transform(
    input: &PathBuf,
    placeholder: Option<String>,
    no_noscript: bool,
    config: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let html = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let mut dom = DomTree::parse_document(&html);
    let options = TransformOptions {
        placeholder,
        noscript_fallback: !no_noscript,
        ..TransformOptions::default()
    };
    let root = dom.root();
    let count = lazify(&mut dom, root, &config, &options);
    eprintln!("rewrote {} element(s)", count);
    println!("{}", dom.to_html());
    Ok(())
}

fn run_simulate(
    input: &PathBuf,
    viewport_height: u32,
    step: u32,
    eager: bool,
    config: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let mut config = load_config(config)?;
    config.observe_supported = !eager;

    let html = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let mut dom = DomTree::parse_document(&html);

    let candidates = unprocessed(&dom, &config);
    let already_loaded = loaded_count(&dom, &config);
    let mut loader = LazyLoader::new(config.clone())?;
    let root = dom.root();
    loader.attach(&mut dom, root);

    if eager {
        let report = SimulationReport {
            mode: "eager",
            candidates: candidates.len(),
            promoted: loaded_count(&dom, &config) - already_loaded,
            steps: Vec::new(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    // Synthetic vertical layout: candidates stacked down the page.
    let viewport = Viewport {
        width: 1280,
        height: viewport_height,
    };
    let spacing = viewport_height.max(1) as i32;
    let layout: HashMap<NodeId, Rect> = candidates
        .iter()
        .enumerate()
        .map(|(i, &id)| {
            (
                id,
                Rect {
                    x: 0,
                    y: i as i32 * spacing,
                    width: viewport.width,
                    height: spacing as u32 / 2,
                },
            )
        })
        .collect();
    let max_y = candidates.len() as i32 * spacing;

    let mut steps = Vec::new();
    let mut scroll_y = 0i32;
    while loader.registered_count() > 0 && scroll_y <= max_y {
        let before = loaded_count(&dom, &config);
        let entries = loader.sweep(&layout, viewport, scroll_y);
        loader.on_intersect(&mut dom, &entries);
        steps.push(StepReport {
            scroll_y,
            promoted: loaded_count(&dom, &config) - before,
        });
        scroll_y += step.max(1) as i32;
    }

    let report = SimulationReport {
        mode: "observe",
        candidates: candidates.len(),
        promoted: loaded_count(&dom, &config) - already_loaded,
        steps,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn unprocessed(dom: &DomTree, config: &LoaderConfig) -> Vec<NodeId> {
    dom.descendants(dom.root())
        .into_iter()
        .filter(|&n| {
            dom.has_class(n, &config.marker_class) && !dom.has_class(n, &config.loaded_class)
        })
        .collect()
}

fn loaded_count(dom: &DomTree, config: &LoaderConfig) -> usize {
    dom.descendants(dom.root())
        .into_iter()
        .filter(|&n| dom.has_class(n, &config.loaded_class))
        .count()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Transform {
            input,
            placeholder,
            no_noscript,
            config,
        } => run_transform(input, placeholder.clone(), *no_noscript, config.as_ref()),
        Command::Simulate {
            input,
            viewport_height,
            step,
            eager,
            config,
        } => run_simulate(input, *viewport_height, *step, *eager, config.as_ref()),
    }
}
