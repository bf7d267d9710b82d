//! Explorations AH - command-line front end.
//! - Headless still renders (PNG or terminal ASCII) and ffmpeg video export
//! - Persisted per-exploration state, change events and named snapshots
//! - Live preview window (feature `viewer`)

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};

use explorations::ascii::render_ascii;
use explorations::assets::{load_image, Assets};
use explorations::config::load_config_file;
use explorations::driver::ManualScheduler;
use explorations::export::{export_video_blocking, ExportSettings, VideoCodec};
use explorations::persistence::{storage_root, StateStore};
use explorations::snapshots::SnapshotBook;
use explorations::{Config, ConfigChange, Exploration, ImageSurface, Session};

// ------------------------- CLI -------------------------

#[derive(Parser)]
#[command(name = "explorations")]
#[command(about = "Generative-art explorations: render, export and tweak")]
struct Args {
    /// Where state and snapshots live (default: $XDG_CONFIG_HOME/explorations)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Directory holding source images
    #[arg(long, global = true, default_value = "assets")]
    assets: PathBuf,

    #[command(subcommand)]
    cmd: Cmd,
}

/// Config layering shared by `render` and `export`.
#[derive(clap::Args)]
struct ConfigArgs {
    /// JSON or TOML parameter overlay
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ignore the persisted state
    #[arg(long)]
    no_state: bool,

    /// Extra `key=value` changes, applied last
    #[arg(long = "set", value_name = "CHANGE")]
    changes: Vec<String>,
}

#[derive(Subcommand)]
enum Cmd {
    /// List the explorations
    List,
    /// Render one still frame
    Render {
        exploration: Exploration,
        #[command(flatten)]
        config: ConfigArgs,
        /// Seconds since start
        #[arg(short, long, default_value_t = 0.0)]
        time: f32,
        #[arg(long, default_value_t = 1280)]
        width: u32,
        #[arg(long, default_value_t = 720)]
        height: u32,
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Print as ASCII with this cell size instead of writing a PNG
        #[arg(long, num_args = 0..=1, default_missing_value = "8")]
        ascii: Option<u32>,
        /// Plain ASCII without color escapes
        #[arg(long)]
        mono: bool,
    },
    /// Render a clip and encode it with ffmpeg
    Export {
        exploration: Exploration,
        #[command(flatten)]
        config: ConfigArgs,
        #[arg(long, default_value_t = 5.0)]
        duration: f32,
        #[arg(long, default_value_t = 30)]
        fps: u32,
        #[arg(long, value_enum, default_value_t = VideoCodec::H264)]
        codec: VideoCodec,
        #[arg(long, default_value_t = 20)]
        crf: u8,
        #[arg(long, default_value_t = 1280)]
        width: u32,
        #[arg(long, default_value_t = 720)]
        height: u32,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Apply change events (`key=value` or JSON) to the stored state
    Set {
        exploration: Exploration,
        #[arg(required = true)]
        changes: Vec<String>,
    },
    /// Show the effective state, or clear it
    State {
        exploration: Exploration,
        #[arg(long)]
        reset: bool,
    },
    /// Dump every stored state as one JSON object
    States,
    /// Manage named snapshots
    Snapshot {
        exploration: Exploration,
        #[command(subcommand)]
        action: SnapshotCmd,
    },
    /// Open the live preview window; change events are read from stdin
    #[cfg(feature = "viewer")]
    View {
        exploration: Exploration,
        /// Render resolution relative to the window size
        #[arg(long, default_value_t = 0.5)]
        scale: f32,
    },
}

#[derive(Subcommand)]
enum SnapshotCmd {
    /// Save the current state as `Snapshot N`
    Save,
    List,
    Delete { index: usize },
    /// Merge a snapshot into the current state
    Load { index: usize },
}

// ------------------------- Helpers -------------------------

fn store(args: &Args) -> StateStore {
    StateStore::new(storage_root(args.state_dir.as_deref()))
}

/// defaults <- stored state <- config file <- `--set` changes
fn resolve_config(
    exploration: Exploration,
    store: &StateStore,
    layers: &ConfigArgs,
) -> Result<Config, Box<dyn Error>> {
    let mut cfg = exploration.defaults();
    if !layers.no_state {
        if let Some(saved) = store.load(exploration.id()) {
            cfg.merge(&saved);
        }
    }
    if let Some(path) = &layers.config {
        cfg.merge(&load_config_file(path)?);
    }
    for raw in &layers.changes {
        cfg.apply(&ConfigChange::parse(raw)?);
    }
    Ok(cfg)
}

fn load_assets(exploration: Exploration, cfg: &Config, dir: &Path) -> Result<Assets, Box<dyn Error>> {
    match exploration.image_name(cfg) {
        Some(name) => Ok(Assets::with_image(load_image(dir, &name)?)),
        None => Ok(Assets::default()),
    }
}

fn open_session(args: &Args, exploration: Exploration) -> Result<Session<ManualScheduler>, Box<dyn Error>> {
    Ok(Session::open(
        exploration,
        Some(store(args)),
        &args.assets,
        ManualScheduler::default(),
    )?)
}

// ------------------------- Commands -------------------------

#[allow(clippy::too_many_arguments)]
fn cmd_render(
    args: &Args,
    exploration: Exploration,
    layers: &ConfigArgs,
    time: f32,
    (width, height): (u32, u32),
    out: Option<&Path>,
    ascii: Option<u32>,
    mono: bool,
) -> Result<(), Box<dyn Error>> {
    let cfg = resolve_config(exploration, &store(args), layers)?;
    let assets = load_assets(exploration, &cfg, &args.assets)?;
    let (width, height) = exploration.frame_size(&assets, width, height);
    let mut surface = ImageSurface::new(width, height);
    let started = Instant::now();
    exploration.render(&cfg, &assets, time, &mut surface)?;
    log::info!(
        "{exploration}: {width}x{height} at t={time} in {:.0?}",
        started.elapsed()
    );

    // image treatment carries its own ASCII overlay settings
    let cell = ascii.or_else(|| {
        let size = cfg.num("asciiSize");
        (size >= 1.0).then_some(size as u32)
    });
    if let Some(cell) = cell {
        let colored = !mono && (cfg.get("asciiColor").is_none() || cfg.flag("asciiColor"));
        print!("{}", render_ascii(surface.image(), cell, colored));
        if out.is_none() {
            return Ok(());
        }
    }

    let path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("{}.png", exploration.id())));
    surface.save(&path)?;
    println!("wrote {}", path.display());
    Ok(())
}

fn cmd_set(args: &Args, exploration: Exploration, changes: &[String]) -> Result<(), Box<dyn Error>> {
    let mut session = open_session(args, exploration)?;
    for raw in changes {
        let change = ConfigChange::parse(raw)?;
        let transition = session.apply(&change)?;
        println!("{} -> {transition:?}", change.key);
    }
    println!("{exploration} is {:?}", session.driver().state());
    Ok(())
}

fn cmd_snapshot(args: &Args, exploration: Exploration, action: &SnapshotCmd) -> Result<(), Box<dyn Error>> {
    let root = storage_root(args.state_dir.as_deref());
    let mut book = SnapshotBook::open(&root, exploration.id())?;
    match action {
        SnapshotCmd::Save => {
            let session = open_session(args, exploration)?;
            println!("saved {}", book.save(session.config())?);
        }
        SnapshotCmd::List => {
            for (i, snap) in book.entries().iter().enumerate() {
                println!(
                    "{i:>3}  {:<14} {}",
                    snap.name,
                    snap.created_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
        SnapshotCmd::Delete { index } => {
            let removed = book.delete(*index)?;
            println!("deleted {}", removed.name);
        }
        SnapshotCmd::Load { index } => {
            let snap = book.get(*index)?;
            let mut session = open_session(args, exploration)?;
            let transition = session.load_snapshot(snap)?;
            println!("loaded {} -> {transition:?}", snap.name);
        }
    }
    Ok(())
}

#[cfg(feature = "viewer")]
fn cmd_view(args: &Args, exploration: Exploration, scale: f32) -> Result<(), Box<dyn Error>> {
    use explorations::viewer::{self, EguiScheduler, ViewerOptions};

    let session = Session::open(
        exploration,
        Some(store(args)),
        &args.assets,
        EguiScheduler::default(),
    )?;
    viewer::run(
        session,
        ViewerOptions {
            scale,
            snapshot_root: Some(storage_root(args.state_dir.as_deref())),
        },
    )?;
    Ok(())
}

// ------------------------- Entry -------------------------

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match &args.cmd {
        Cmd::List => {
            for e in Exploration::ALL {
                println!("{}  {:<16} {}", e.id(), e.slug(), e.title());
            }
        }
        Cmd::Render {
            exploration,
            config,
            time,
            width,
            height,
            out,
            ascii,
            mono,
        } => cmd_render(
            &args,
            *exploration,
            config,
            *time,
            (*width, *height),
            out.as_deref(),
            *ascii,
            *mono,
        )?,
        Cmd::Export {
            exploration,
            config,
            duration,
            fps,
            codec,
            crf,
            width,
            height,
            out,
        } => {
            let cfg = resolve_config(*exploration, &store(&args), config)?;
            let assets = load_assets(*exploration, &cfg, &args.assets)?;
            let settings = ExportSettings {
                width: *width,
                height: *height,
                fps: *fps,
                duration: *duration,
                crf: *crf,
                codec: *codec,
                out_path: out
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(format!("{}.mp4", exploration.id()))),
            };
            export_video_blocking(*exploration, &cfg, &assets, &settings)?;
            println!("wrote {}", settings.out_path.display());
        }
        Cmd::Set {
            exploration,
            changes,
        } => cmd_set(&args, *exploration, changes)?,
        Cmd::State { exploration, reset } => {
            let store = store(&args);
            if *reset {
                store.clear(exploration.id());
            } else {
                let mut cfg = exploration.defaults();
                if let Some(saved) = store.load(exploration.id()) {
                    cfg.merge(&saved);
                }
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            }
        }
        Cmd::States => {
            println!("{}", serde_json::to_string_pretty(&store(&args).export_all())?);
        }
        Cmd::Snapshot {
            exploration,
            action,
        } => cmd_snapshot(&args, *exploration, action)?,
        #[cfg(feature = "viewer")]
        Cmd::View { exploration, scale } => cmd_view(&args, *exploration, *scale)?,
    }
    Ok(())
}
