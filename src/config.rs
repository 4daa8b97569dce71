use serde::Deserialize;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use anyhow::{Context, Result};
use std::fs;
use tiny_skia::Color;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub items: Vec<StaticItem>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct GeneralConfig {
    /// Command prefixed to entries that ask for a terminal, e.g. "foot -e".
    #[serde(default)]
    pub terminal: Option<String>,
    /// Moving past either end of the list jumps to the other end.
    #[serde(default)]
    pub wrap_selection: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 { 600 }
fn default_height() -> u32 { 400 }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RegistryConfig {
    /// Scan freedesktop application directories.
    #[serde(default = "default_true")]
    pub desktop: bool,
    #[serde(default)]
    pub extra_dirs: Vec<PathBuf>,
    /// Regex patterns; matching entries never enter the catalog.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_true() -> bool { true }

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            desktop: true,
            extra_dirs: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct StaticItem {
    pub name: String,
    pub command: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub terminal: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ThemeConfig {
    #[serde(default = "default_padding")]
    pub padding: f32,
    #[serde(default = "default_spacing")]
    pub spacing: f32,
    #[serde(default = "default_border_radius")]
    pub border_radius: f32,
    #[serde(default = "default_row_height")]
    pub row_height: f32,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_border_color")]
    pub border_color: String,
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    #[serde(default = "default_selection_background")]
    pub selection_background: String,
    #[serde(default = "default_selection_text")]
    pub selection_text: String,
}

fn default_padding() -> f32 { 16.0 }
fn default_spacing() -> f32 { 8.0 }
fn default_border_radius() -> f32 { 12.0 }
fn default_row_height() -> f32 { 40.0 }
fn default_background() -> String { "1e1e1eff".to_string() }
fn default_border_color() -> String { "3c3c50ff".to_string() }
fn default_text() -> String { "c8c8c8ff".to_string() }
fn default_placeholder() -> String { "646464ff".to_string() }
fn default_selection_background() -> String { "3c3c50ff".to_string() }
fn default_selection_text() -> String { "ffffffff".to_string() }

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            padding: default_padding(),
            spacing: default_spacing(),
            border_radius: default_border_radius(),
            row_height: default_row_height(),
            background: default_background(),
            border_color: default_border_color(),
            text: default_text(),
            placeholder: default_placeholder(),
            selection_background: default_selection_background(),
            selection_text: default_selection_text(),
        }
    }
}

impl ThemeConfig {
    /// Parses `RRGGBBAA`, with or without a leading `#`. Anything else is black.
    pub fn parse_color(hex: &str) -> Color {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 8 || !hex.is_ascii() {
            return Color::BLACK;
        }
        let channel = |range: std::ops::Range<usize>, fallback| {
            u8::from_str_radix(&hex[range], 16).unwrap_or(fallback)
        };

        Color::from_rgba8(channel(0..2, 0), channel(2..4, 0), channel(4..6, 0), channel(6..8, 255))
    }
}

pub fn default_config_path() -> PathBuf {
    match ProjectDirs::from("org", "overlay-launcher", "overlay-launcher") {
        Some(dirs) => dirs.config_dir().join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

pub fn load_config() -> Result<Config> {
    load_config_from(&default_config_path())
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::debug!("No config at {:?}, using defaults", path);
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&content).with_context(|| format!("parsing config {}", path.display()))
}

fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}
