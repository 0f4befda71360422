use anyhow::{Context, Result, bail};
use clap::Parser;
use codecanvas_app::{CanvasEngine, EngineSettings, SharedParser};
use codecanvas_core::{BlockId, Size};
use codecanvas_index::{check_syntax, parser_for_file};
use codecanvas_storage::SqliteStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Split a source file into canvas blocks", long_about = None)]
struct Args {
    /// Source file to lay out
    file: PathBuf,

    /// Path to the SQLite snapshot store
    #[arg(short, long, default_value = "codecanvas.db")]
    db: PathBuf,

    /// JSON settings file; missing keys use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Viewport size as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_size)]
    viewport: Option<Size>,

    /// Fit the camera to every block
    #[arg(long)]
    fit: bool,

    /// Center the camera on a block id
    #[arg(long)]
    focus: Option<String>,

    /// Hide a block id (repeatable)
    #[arg(long)]
    hide: Vec<String>,

    /// Include hidden blocks and connections in the output
    #[arg(long)]
    all: bool,

    /// Parse the file from disk even if the store holds a newer snapshot
    #[arg(long)]
    fresh: bool,
}

fn parse_size(value: &str) -> Result<Size, String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value}"))?;
    let width: f32 = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let height: f32 = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    if width <= 0.0 || height <= 0.0 {
        return Err("viewport dimensions must be positive".to_string());
    }
    Ok(Size::new(width, height))
}

/// Block ids are prefixed with the file's base name, not the path it was
/// opened from.
fn canvas_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let Some(file_name) = canvas_name(&args.file) else {
        bail!("{:?} does not name a file", args.file);
    };
    let Some(parser) = parser_for_file(&file_name) else {
        bail!("No block parser for {:?}", args.file);
    };
    let parser: SharedParser = Arc::from(parser);

    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {:?}", args.file))?;
    let settings = args
        .config
        .as_deref()
        .map(EngineSettings::load)
        .unwrap_or_default();
    let store = SqliteStore::open(&args.db)
        .with_context(|| format!("Failed to open store {:?}", args.db))?;

    let mut engine = CanvasEngine::new(file_name, parser, store, settings);
    if let Some(viewport) = args.viewport {
        engine.set_viewport(viewport);
    }

    let opened = if args.fresh {
        engine.on_code_change(&source)
    } else {
        engine.open(&source)
    };
    if let Err(e) = opened {
        for issue in check_syntax(engine.buffer()) {
            tracing::warn!("{}", issue);
        }
        return Err(e).context("Failed to derive blocks");
    }
    tracing::info!(
        "{} blocks, {} connections",
        engine.blocks().len(),
        engine.connections().len()
    );

    for id in &args.hide {
        if !engine.on_visibility_change(&BlockId::new(id.as_str()), false) {
            tracing::warn!("No block {}", id);
        }
    }
    if args.fit {
        engine.fit_to_bounds();
    }
    if let Some(id) = &args.focus
        && engine.on_block_select(&BlockId::new(id.as_str())).is_none()
    {
        bail!("No block {}", id);
    }

    let snapshot = engine.snapshot(!args.all);
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
