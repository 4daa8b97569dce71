mod catalog;
mod config;
mod error;
mod executor;
mod input;
mod model;
mod registry;
mod search;
mod selection;
mod state;
mod ui;

use std::io::{self, Write};
use std::path::PathBuf;
use anyhow::{Context, Result};
use calloop::EventLoop;
use calloop_wayland_source::WaylandSource;
use clap::Parser;
use smithay_client_toolkit::shell::{
    WaylandSurface,
    wlr_layer::{Anchor, KeyboardInteractivity, Layer},
};
use wayland_client::{Connection, globals::registry_queue_init};
use crate::catalog::Catalog;
use crate::config::{Config, load_config, load_config_from};
use crate::executor::SpawnLauncher;
use crate::input::InputEvent;
use crate::registry::{Registry, desktop::DesktopRegistry, items::ItemsRegistry};
use crate::state::Session;
use crate::ui::icons::IconCache;
use crate::ui::render::Renderer;
use crate::ui::wayland::OverlayApp;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Read configuration from this file instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start with this search text already typed
    #[arg(short, long, default_value = "")]
    filter: String,

    /// Print the matching entries and exit without showing the overlay
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // 1. Load Config
    let config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    // 2. Fill the catalog before any input is accepted
    let catalog = Catalog::load(&registries(&config), &config.registry.exclude);
    if catalog.is_empty() {
        log::warn!("No applications found; the launcher list will be empty");
    }
    let mut session = Session::new(catalog, config.general.wrap_selection);
    let mut launcher = SpawnLauncher::new(config.general.terminal.as_deref());

    if !args.filter.is_empty() {
        session.dispatch(InputEvent::TextChanged(args.filter.clone()), &mut launcher)?;
    }

    if args.dry_run {
        return print_visible(&session, &mut io::stdout().lock()).context("writing entries");
    }

    run_overlay(session, launcher, config)
}

/// Config items come first, then desktop entries.
fn registries(config: &Config) -> Vec<Box<dyn Registry>> {
    let mut registries: Vec<Box<dyn Registry>> = Vec::new();
    if !config.items.is_empty() {
        registries.push(Box::new(ItemsRegistry::new(config.items.clone())));
    }
    if config.registry.desktop {
        registries.push(Box::new(DesktopRegistry::from_env(&config.registry.extra_dirs)));
    }
    registries
}

fn print_visible(session: &Session, out: &mut impl Write) -> io::Result<()> {
    for (position, entry) in session.visible_entries().enumerate() {
        let marker = if session.selection() == Some(position) { '>' } else { ' ' };
        writeln!(out, "{} {}", marker, entry.display_name)?;
    }
    Ok(())
}

fn run_overlay(session: Session, launcher: SpawnLauncher, config: Config) -> Result<()> {
    // 3. Setup Wayland Connection & Event Loop
    let mut event_loop: EventLoop<OverlayApp> = EventLoop::try_new()?;
    let conn = Connection::connect_to_env().context("connecting to the Wayland compositor")?;
    let (globals, event_queue) = registry_queue_init::<OverlayApp>(&conn)?;
    let qh = event_queue.handle();

    // 4. Init UI
    let (tx_icons, rx_icons) = calloop::channel::channel::<(String, Option<tiny_skia::Pixmap>)>();
    let renderer = Renderer::new(IconCache::new(tx_icons), config.theme.clone());
    let size = (config.window.width, config.window.height);
    let mut app = OverlayApp::new(&globals, &qh, session, launcher, renderer, size)?;

    // 5. Create Layer Surface
    let surface = app.compositor_state.create_surface(&qh);
    let layer_surface =
        app.layer_shell
            .create_layer_surface(&qh, surface, Layer::Overlay, Some("overlay-launcher"), None);
    layer_surface.set_anchor(Anchor::empty());
    layer_surface.set_size(size.0, size.1);
    layer_surface.set_keyboard_interactivity(KeyboardInteractivity::Exclusive);
    layer_surface.commit();
    app.layer_surface = Some(layer_surface);

    event_loop
        .handle()
        .insert_source(rx_icons, |event, _, app: &mut OverlayApp| {
            if let calloop::channel::Event::Msg((name, pixmap)) = event {
                app.renderer.insert_icon(name, pixmap);
                app.draw();
            }
        })
        .map_err(|err| err.error)
        .context("registering icon channel")?;

    WaylandSource::new(conn, event_queue)
        .insert(event_loop.handle())
        .map_err(|err| err.error)
        .context("registering Wayland source")?;

    // 6. Run Loop
    while !app.should_exit() {
        event_loop.dispatch(None, &mut app)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticItem;
    use crate::model::entry;

    #[test]
    fn dry_run_marks_the_selection() {
        let catalog = Catalog::new(vec![entry("Firefox"), entry("Files"), entry("Terminal")]);
        let mut session = Session::new(catalog, false);
        let mut launcher = SpawnLauncher::new(None);
        session.dispatch(InputEvent::TextChanged("fi".to_string()), &mut launcher).unwrap();

        let mut out = Vec::new();
        print_visible(&session, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "> Firefox\n  Files\n");
    }

    #[test]
    fn registries_follow_config() {
        let mut config = Config::default();
        assert_eq!(names(&registries(&config)), ["desktop"]);

        config.items.push(StaticItem {
            name: "Htop".to_string(),
            command: "htop".to_string(),
            icon: None,
            terminal: true,
        });
        config.registry.desktop = false;
        assert_eq!(names(&registries(&config)), ["items"]);
    }

    fn names(registries: &[Box<dyn Registry>]) -> Vec<&str> {
        registries.iter().map(|r| r.name()).collect()
    }

    #[test]
    fn cli_parses_flags() {
        let args = Args::parse_from(["overlay-launcher", "--filter", "fire", "--dry-run"]);
        assert_eq!(args.filter, "fire");
        assert!(args.dry_run);
        assert!(args.config.is_none());
    }
}
