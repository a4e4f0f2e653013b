use crate::model::{Bounds, FieldParams, DEFAULT_PADDING};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

pub const MAX_BUBBLES: usize = 64;
pub const MIN_RADIUS: f32 = 1.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub count: usize,
    pub radius: f32,
    pub width: f32,
    pub height: f32,
    pub padding: f32,
    pub fps_cap: u32,
    pub fuse_secs: f32,
    /// 0 picks a fresh seed every launch.
    pub seed: u64,
    pub enable_color: bool,
    pub show_hud: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            count: 6,
            radius: 12.0,
            width: 260.0,
            height: 110.0,
            padding: DEFAULT_PADDING,
            fps_cap: 60,
            fuse_secs: 8.0,
            seed: 0,
            enable_color: true,
            show_hud: true,
        }
    }
}

impl Settings {
    /// Pulls out-of-range values back into something playable.
    ///
    /// Returns the names of the fields that had to change.
    pub fn sanitize(&mut self) -> Vec<&'static str> {
        let mut fixed = Vec::new();
        if self.count > MAX_BUBBLES {
            self.count = MAX_BUBBLES;
            fixed.push("count");
        }
        if !self.radius.is_finite() || self.radius < MIN_RADIUS {
            self.radius = MIN_RADIUS;
            fixed.push("radius");
        }
        if !self.width.is_finite() || self.width <= 0.0 {
            self.width = Settings::default().width;
            fixed.push("width");
        }
        if !self.height.is_finite() || self.height <= 0.0 {
            self.height = Settings::default().height;
            fixed.push("height");
        }
        if !self.padding.is_finite() || self.padding < 0.0 {
            self.padding = DEFAULT_PADDING;
            fixed.push("padding");
        }
        let fps = self.fps_cap.clamp(10, 240);
        if fps != self.fps_cap {
            self.fps_cap = fps;
            fixed.push("fps_cap");
        }
        if !self.fuse_secs.is_finite() || self.fuse_secs < 0.5 {
            self.fuse_secs = 0.5;
            fixed.push("fuse_secs");
        }
        fixed
    }

    pub fn field_params(&self) -> FieldParams {
        FieldParams::new(self.count, Bounds::new(self.width, self.height), self.radius)
            .with_padding(self.padding)
    }

    pub fn fuse(&self) -> Duration {
        Duration::from_secs_f32(self.fuse_secs.max(0.0))
    }
}

pub struct Paths {
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
}

pub fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "bubbleflask", "BubbleFlask")
        .context("could not resolve project directories")?;
    let config_dir = proj.config_dir().to_path_buf();
    let data_dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating {}", config_dir.display()))?;
    fs::create_dir_all(&data_dir).with_context(|| format!("creating {}", data_dir.display()))?;
    Ok(Paths {
        settings_path: config_dir.join("settings.json"),
        log_path: data_dir.join("bubbleflask.log"),
    })
}

pub fn parse_settings(text: &str) -> Result<Settings> {
    let mut s: Settings = serde_json::from_str(text).context("invalid settings json")?;
    let fixed = s.sanitize();
    if !fixed.is_empty() {
        log::warn!("settings out of range, adjusted: {}", fixed.join(", "));
    }
    Ok(s)
}

/// Reads settings, falling back to defaults when the file is missing or broken.
pub fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(text) => match parse_settings(&text) {
            Ok(s) => {
                log::info!("loaded settings from {}", path.display());
                s
            }
            Err(e) => {
                log::warn!("{}: {:#}, using defaults", path.display(), e);
                Settings::default()
            }
        },
        Err(_) => {
            log::info!("no settings at {}, using defaults", path.display());
            Settings::default()
        }
    }
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    if path.exists() {
        let _ = fs::remove_file(path);
    }
    fs::rename(&tmp, path).with_context(|| format!("renaming onto {}", path.display()))?;
    Ok(())
}

/// Applies `edit` to the stored settings and writes them back.
///
/// A file that exists but does not parse is left as it is; returns whether
/// anything was written.
pub fn update_settings(path: &Path, edit: impl FnOnce(&mut Settings)) -> Result<bool> {
    let mut stored = match fs::read_to_string(path) {
        Ok(text) => match parse_settings(&text) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("{}: {:#}, not overwriting", path.display(), e);
                return Ok(false);
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => Settings::default(),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    edit(&mut stored);
    save_settings_atomic(path, &stored)?;
    Ok(true)
}
