mod annotate;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cover_core::Frame;
use cover_engine::{
    load_frame, DisplayLoop, EngineBuilder, EngineConfig, OrbExtractor, RecognitionEngine, RecognitionScheduler,
    ReferenceDatabase, StaticCatalog,
};
use log::{info, warn};

#[derive(Parser)]
#[command(name = "coverscan", version, about = "Recognise book covers against a folder of reference images")]
struct Cli {
    /// Engine configuration file (.json or .toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Worker threads for extraction and matching
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the reference database and describe it
    Index {
        /// Folder with one sub-folder of cover images per label
        covers: PathBuf,
    },
    /// Recognise covers in still images
    Recognize {
        covers: PathBuf,
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// JSON file mapping labels to book metadata
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,
        /// Write copies with the detection box drawn into this folder
        #[arg(long, value_name = "DIR")]
        annotate: Option<PathBuf>,
    },
    /// Play a folder of frames through the display loop and scheduler
    Replay {
        covers: PathBuf,
        frames: PathBuf,
        #[arg(long, default_value_t = 1)]
        loops: usize,
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(threads) = cli.threads {
        config.extractor.n_threads = threads;
    }
    cover_core::init_thread_pool(config.extractor.n_threads.max(1)).context("starting thread pool")?;
    info!("{}", config.summary());

    match cli.command {
        Command::Index { covers } => index(&covers, &config),
        Command::Recognize {
            covers,
            images,
            catalog,
            annotate: annotate_dir,
        } => recognize(&covers, &images, catalog.as_deref(), annotate_dir.as_deref(), &config),
        Command::Replay {
            covers,
            frames,
            loops,
            catalog,
        } => replay(&covers, &frames, loops, catalog.as_deref(), &config),
    }
}

fn index(covers: &Path, config: &EngineConfig) -> Result<()> {
    let extractor = OrbExtractor::new(config.extractor.clone())?;
    let t0 = Instant::now();
    let database = ReferenceDatabase::build(covers, &extractor, config.label_policy)
        .with_context(|| format!("indexing {}", covers.display()))?;
    println!("Indexed {} labels in {:.2?}", database.len(), t0.elapsed());

    for entry in database.entries() {
        println!("{}: {} view(s), {} descriptors", entry.label(), entry.views().len(), entry.descriptor_count());
        for view in entry.views() {
            let source = view.source.as_deref().map(|p| p.display().to_string()).unwrap_or_default();
            println!(
                "    {}x{} {:>5} descriptors  {}",
                view.dimensions.0,
                view.dimensions.1,
                view.descriptors.len(),
                source
            );
        }
    }
    Ok(())
}

fn build_engine(covers: &Path, catalog: Option<&Path>, config: &EngineConfig) -> Result<RecognitionEngine> {
    let mut builder = EngineBuilder::from_config(config.clone());
    if let Some(path) = catalog {
        let catalog = StaticCatalog::load_json(path).with_context(|| format!("loading catalog {}", path.display()))?;
        info!("Loaded metadata for {} labels", catalog.len());
        builder = builder.metadata(catalog);
    }
    builder
        .build_from_directory(covers)
        .with_context(|| format!("building reference database from {}", covers.display()))
}

fn recognize(
    covers: &Path,
    images: &[PathBuf],
    catalog: Option<&Path>,
    annotate_dir: Option<&Path>,
    config: &EngineConfig,
) -> Result<()> {
    let engine = build_engine(covers, catalog, config)?;

    for path in images {
        let frame = match load_frame(path) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        let t0 = Instant::now();
        let result = engine.recognize(&frame);
        println!("{}: {} [{:.2?}]", path.display(), result, t0.elapsed());
        if let Some(metadata) = result.metadata() {
            for line in metadata.summary().lines() {
                println!("    {}", line);
            }
        }

        if let Some(dir) = annotate_dir {
            if let Some(out) = annotate::write_annotated(path, &result, dir)? {
                println!("    saved {}", out.display());
            }
        }
    }
    Ok(())
}

fn replay(covers: &Path, frames_dir: &Path, loops: usize, catalog: Option<&Path>, config: &EngineConfig) -> Result<()> {
    let engine = build_engine(covers, catalog, config)?;
    let frames = load_frames(frames_dir)?;
    anyhow::ensure!(!frames.is_empty(), "no readable frames in {}", frames_dir.display());
    info!("Replaying {} frames {} time(s)", frames.len(), loops);

    let scheduler = RecognitionScheduler::new(Arc::new(engine), &config.scheduler);
    let display = DisplayLoop::from_config(&config.scheduler);

    let source = frames.iter().cloned().cycle().take(frames.len() * loops);
    let mut shown = 0;
    let stats = display.run(source, &scheduler, |_, snapshot| {
        if snapshot.generation != shown {
            shown = snapshot.generation;
            info!("[{}] {}", shown, snapshot.result);
        }
    });

    scheduler.wait_idle();
    let last = scheduler.latest();
    println!("Final result [{}]: {}", last.generation, last.result);
    println!(
        "Frames {}: {} dispatched, {} decimated, {} busy, {} cooling down, {} failed to start",
        stats.frames, stats.dispatched, stats.decimated, stats.busy, stats.cooling_down, stats.spawn_failed
    );
    Ok(())
}

fn load_frames(dir: &Path) -> Result<Vec<Frame>> {
    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    paths.sort();

    Ok(paths
        .iter()
        .filter(|p| p.is_file())
        .filter_map(|p| match load_frame(p) {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!("{}", e);
                None
            }
        })
        .collect())
}
