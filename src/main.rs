mod app;
mod input;
mod render;

use anyhow::Result;
use bubbleflask::config::{load_settings, project_paths, save_settings_atomic, Settings};
use clap::Parser;
use std::{fs::OpenOptions, path::Path, path::PathBuf};

#[derive(Parser, Debug, Clone)]
#[command(name = "bubbleflask")]
#[command(about = "Heat the flask until it explodes", long_about = None)]
struct Args {
    /// number of bubbles
    #[arg(long)]
    count: Option<usize>,

    /// bubble radius in flask units (the flask is 260x110 by default)
    #[arg(long)]
    radius: Option<f32>,

    /// render rate cap; physics runs at a fixed rate
    #[arg(long)]
    fps: Option<u32>,

    /// seconds of heating before the flask explodes
    #[arg(long)]
    fuse_secs: Option<f32>,

    /// rng seed, 0 for a fresh one each run
    #[arg(long)]
    seed: Option<u64>,

    /// settings file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// start with the HUD hidden
    #[arg(long, default_value_t = false)]
    no_hud: bool,
}

impl Args {
    fn apply(&self, s: &mut Settings) {
        if let Some(v) = self.count {
            s.count = v;
        }
        if let Some(v) = self.radius {
            s.radius = v;
        }
        if let Some(v) = self.fps {
            s.fps_cap = v;
        }
        if let Some(v) = self.fuse_secs {
            s.fuse_secs = v;
        }
        if let Some(v) = self.seed {
            s.seed = v;
        }
        if self.no_hud {
            s.show_hud = false;
        }
    }
}

fn init_logging(path: &Path) {
    // stderr belongs to the alternate screen, so logs go to a file
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        Err(e) => eprintln!("logging disabled, cannot open {}: {}", path.display(), e),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut paths = project_paths()?;
    if let Some(p) = &args.config {
        paths.settings_path = p.clone();
    }
    init_logging(&paths.log_path);

    let first_run = !paths.settings_path.exists();
    let mut settings = load_settings(&paths.settings_path);
    if first_run {
        if let Err(e) = save_settings_atomic(&paths.settings_path, &settings) {
            log::warn!("could not write default settings: {:#}", e);
        }
    }

    args.apply(&mut settings);
    let fixed = settings.sanitize();
    if !fixed.is_empty() {
        log::warn!("command line values out of range, adjusted: {}", fixed.join(", "));
    }

    app::run(settings, paths)
}
