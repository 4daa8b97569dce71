use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Sender, channel};
use std::thread;
use image::ImageReader;
use log::debug;
use tiny_skia::{IntSize, Pixmap, Transform};

/// Shown for entries without an icon or whose icon cannot be found.
pub const FALLBACK_ICON: &str = "application-x-executable";
pub const ICON_SIZE: u32 = 32;

const THEMES: [&str; 2] = ["hicolor", "Adwaita"];
const EXTENSIONS: [&str; 3] = ["png", "svg", "xpm"];

/// Icons resolved so far. Lookups that miss are queued to a loader thread
/// and show up later through the calloop channel handed to `new`.
pub struct IconCache {
    loaded: HashMap<String, Option<Pixmap>>,
    pending: HashSet<String>,
    requests: Sender<String>,
}

#[derive(PartialEq)]
enum Slot {
    Ready,
    Missing,
    Pending,
}

impl IconCache {
    pub fn new(delivered: calloop::channel::Sender<(String, Option<Pixmap>)>) -> Self {
        let (requests, incoming) = channel::<String>();
        let loader = IconLoader::new(icon_roots(), ICON_SIZE);

        thread::spawn(move || {
            while let Ok(name) = incoming.recv() {
                let pixmap = loader.load(&name);
                if delivered.send((name, pixmap)).is_err() {
                    break;
                }
            }
        });

        Self {
            loaded: HashMap::new(),
            pending: HashSet::new(),
            requests,
        }
    }

    /// Pixmap for `icon`, or the fallback icon when it is absent or missing.
    /// `None` while loading is still in flight.
    pub fn lookup(&mut self, icon: Option<&str>) -> Option<&Pixmap> {
        let wanted = icon.unwrap_or(FALLBACK_ICON);
        let name = match self.slot(wanted) {
            Slot::Ready => wanted,
            Slot::Missing if wanted != FALLBACK_ICON => FALLBACK_ICON,
            Slot::Missing | Slot::Pending => return None,
        };
        if name != wanted && self.slot(name) != Slot::Ready {
            return None;
        }
        self.loaded.get(name).and_then(Option::as_ref)
    }

    pub fn insert(&mut self, name: String, pixmap: Option<Pixmap>) {
        self.pending.remove(&name);
        self.loaded.insert(name, pixmap);
    }

    fn slot(&mut self, name: &str) -> Slot {
        match self.loaded.get(name) {
            Some(Some(_)) => Slot::Ready,
            Some(None) => Slot::Missing,
            None => {
                if self.pending.insert(name.to_string()) {
                    let _ = self.requests.send(name.to_string());
                }
                Slot::Pending
            }
        }
    }
}

fn icon_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(base_dirs) = directories::BaseDirs::new() {
        roots.push(base_dirs.data_dir().join("icons"));
        roots.push(base_dirs.home_dir().join(".icons"));
    }
    let data_dirs = env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
    for dir in data_dirs.split(':').filter(|d| !d.is_empty()) {
        roots.push(Path::new(dir).join("icons"));
    }
    roots.push(PathBuf::from("/usr/share/pixmaps"));
    roots
}

struct IconLoader {
    roots: Vec<PathBuf>,
    size: u32,
}

impl IconLoader {
    fn new(roots: Vec<PathBuf>, size: u32) -> Self {
        Self { roots, size }
    }

    fn load(&self, icon: &str) -> Option<Pixmap> {
        let Some(path) = self.find(icon) else {
            debug!("Icon {:?} not found", icon);
            return None;
        };
        let pixmap = match path.extension().and_then(|s| s.to_str()) {
            Some("svg") => load_svg(&path, self.size),
            _ => load_raster(&path, self.size),
        };
        if pixmap.is_none() {
            debug!("Icon {:?} at {:?} could not be decoded", icon, path);
        }
        pixmap
    }

    /// Absolute paths are used as-is; names are looked up per theme, exact
    /// size first, then larger sizes, then scalable, then the bare root.
    fn find(&self, icon: &str) -> Option<PathBuf> {
        let path = Path::new(icon);
        if path.is_absolute() {
            return path.is_file().then(|| path.to_path_buf());
        }

        let sizes = [self.size, 48, 64, 128, 256];
        let mut subdirs: Vec<String> = Vec::new();
        for theme in THEMES {
            subdirs.extend(sizes.iter().map(|s| format!("{theme}/{s}x{s}/apps")));
            subdirs.push(format!("{theme}/scalable/apps"));
        }
        subdirs.push(String::new());

        self.roots
            .iter()
            .filter(|root| root.is_dir())
            .flat_map(|root| subdirs.iter().map(move |sub| root.join(sub)))
            .flat_map(|dir| EXTENSIONS.iter().map(move |ext| dir.join(format!("{icon}.{ext}"))))
            .find(|candidate| candidate.is_file())
    }
}

fn load_raster(path: &Path, size: u32) -> Option<Pixmap> {
    let img = ImageReader::open(path).ok()?.with_guessed_format().ok()?.decode().ok()?;
    let mut rgba = img.resize(size, size, image::imageops::FilterType::Lanczos3).into_rgba8();

    // tiny-skia wants premultiplied alpha.
    for pixel in rgba.chunks_exact_mut(4) {
        let alpha = pixel[3] as u16;
        for channel in &mut pixel[..3] {
            *channel = ((*channel as u16 * alpha) / 255) as u8;
        }
    }

    let (width, height) = rgba.dimensions();
    Pixmap::from_vec(rgba.into_vec(), IntSize::from_wh(width, height)?)
}

fn load_svg(path: &Path, size: u32) -> Option<Pixmap> {
    let data = fs::read(path).ok()?;
    let tree = resvg::usvg::Tree::from_data(&data, &resvg::usvg::Options::default()).ok()?;

    let mut pixmap = Pixmap::new(size, size)?;
    let scale = Transform::from_scale(
        size as f32 / tree.size().width(),
        size as f32 / tree.size().height(),
    );
    resvg::render(&tree, scale, &mut pixmap.as_mut());
    Some(pixmap)
}
