use anyhow::{Context, Result};
use log::{debug, error};
use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    delegate_compositor, delegate_keyboard, delegate_layer, delegate_output, delegate_registry,
    delegate_seat, delegate_shm,
    output::{OutputHandler, OutputState},
    registry::{ProvidesRegistryState, RegistryState},
    registry_handlers,
    seat::{
        Capability, SeatHandler, SeatState,
        keyboard::{KeyEvent, KeyboardHandler, Keysym, Modifiers},
    },
    shell::{
        WaylandSurface,
        wlr_layer::{LayerShell, LayerShellHandler, LayerSurface, LayerSurfaceConfigure},
    },
    shm::{Shm, ShmHandler, slot::SlotPool},
};
use wayland_client::{
    Connection, QueueHandle,
    globals::GlobalList,
    protocol::{wl_keyboard, wl_output, wl_seat, wl_shm, wl_surface},
};
use crate::executor::SpawnLauncher;
use crate::input::{InputEvent, Phase};
use crate::state::{Outcome, Session};
use crate::ui::keys::KeyTranslator;
use crate::ui::render::Renderer;

/// Wayland client state: the overlay surface plus the session it presents.
pub struct OverlayApp {
    registry_state: RegistryState,
    seat_state: SeatState,
    output_state: OutputState,
    pub compositor_state: CompositorState,
    shm: Shm,
    pub layer_shell: LayerShell,

    pub layer_surface: Option<LayerSurface>,
    keyboard: Option<wl_keyboard::WlKeyboard>,
    pool: Option<SlotPool>,
    width: u32,
    height: u32,
    exit: bool,

    session: Session,
    keys: KeyTranslator,
    launcher: SpawnLauncher,
    pub renderer: Renderer,
}

impl OverlayApp {
    pub fn new(
        globals: &GlobalList,
        qh: &QueueHandle<Self>,
        session: Session,
        launcher: SpawnLauncher,
        renderer: Renderer,
        size: (u32, u32),
    ) -> Result<Self> {
        let keys = KeyTranslator::new(session.filter());
        Ok(Self {
            registry_state: RegistryState::new(globals),
            seat_state: SeatState::new(globals, qh),
            output_state: OutputState::new(globals, qh),
            compositor_state: CompositorState::bind(globals, qh).context("wl_compositor not available")?,
            shm: Shm::bind(globals, qh).context("wl_shm not available")?,
            layer_shell: LayerShell::bind(globals, qh).context("zwlr_layer_shell_v1 not available")?,
            layer_surface: None,
            keyboard: None,
            pool: None,
            width: size.0,
            height: size.1,
            exit: false,
            session,
            keys,
            launcher,
            renderer,
        })
    }

    pub fn should_exit(&self) -> bool {
        self.exit
    }

    pub fn draw(&mut self) {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 {
            return;
        }
        let (Some(layer_surface), Some(pool)) = (&self.layer_surface, self.pool.as_mut()) else {
            return;
        };

        let stride = width as i32 * 4;
        let (buffer, canvas) =
            match pool.create_buffer(width as i32, height as i32, stride, wl_shm::Format::Argb8888) {
                Ok(created) => created,
                Err(err) => {
                    error!("Cannot allocate a {}x{} buffer: {}", width, height, err);
                    return;
                }
            };

        let Some(mut pixmap) = tiny_skia::PixmapMut::from_bytes(canvas, width, height) else {
            return;
        };
        self.renderer.draw(&mut pixmap, &self.session);

        // tiny-skia writes RGBA; wl_shm Argb8888 is BGRA in memory.
        for px in canvas.chunks_exact_mut(4) {
            px.swap(0, 2);
        }

        let surface = layer_surface.wl_surface();
        if let Err(err) = buffer.attach_to(surface) {
            error!("Cannot attach buffer: {}", err);
            return;
        }
        surface.damage_buffer(0, 0, width as i32, height as i32);
        surface.commit();
    }

    fn request_redraw(&self, qh: &QueueHandle<Self>) {
        if let Some(layer_surface) = &self.layer_surface {
            let surface = layer_surface.wl_surface();
            surface.frame(qh, surface.clone());
            surface.commit();
        }
    }

    fn handle_input(&mut self, event: InputEvent, qh: &QueueHandle<Self>) {
        match self.session.dispatch(event, &mut self.launcher) {
            Ok(Outcome::Idle) => self.request_redraw(qh),
            Ok(Outcome::Terminated(_)) => {}
            Err(err) => debug!("Ignoring input: {}", err),
        }
        self.exit = self.session.phase() == Phase::Terminated;
    }
}

impl LayerShellHandler for OverlayApp {
    fn closed(&mut self, _conn: &Connection, qh: &QueueHandle<Self>, _layer: &LayerSurface) {
        self.handle_input(InputEvent::Cancel, qh);
    }

    fn configure(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _layer: &LayerSurface,
        configure: LayerSurfaceConfigure,
        _serial: u32,
    ) {
        if configure.new_size.0 > 0 {
            self.width = configure.new_size.0;
        }
        if configure.new_size.1 > 0 {
            self.height = configure.new_size.1;
        }

        let needed = self.width as usize * self.height as usize * 4;
        if self.pool.is_none() {
            match SlotPool::new(needed, &self.shm) {
                Ok(pool) => self.pool = Some(pool),
                Err(err) => {
                    error!("Cannot create shared memory pool: {}", err);
                    self.exit = true;
                    return;
                }
            }
        }
        if let Some(pool) = self.pool.as_mut() {
            if pool.len() < needed {
                if let Err(err) = pool.resize(needed) {
                    error!("Cannot grow shared memory pool: {}", err);
                    self.exit = true;
                    return;
                }
            }
        }

        self.draw();
    }
}

impl CompositorHandler for OverlayApp {
    fn scale_factor_changed(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_surface::WlSurface, _: i32) {}

    fn transform_changed(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_surface::WlSurface,
        _: wl_output::Transform,
    ) {
    }

    fn frame(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_surface::WlSurface, _: u32) {
        self.draw();
    }

    fn surface_enter(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_surface::WlSurface, _: &wl_output::WlOutput) {}

    fn surface_leave(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_surface::WlSurface, _: &wl_output::WlOutput) {}
}

impl OutputHandler for OverlayApp {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_output::WlOutput) {}

    fn update_output(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_output::WlOutput) {}

    fn output_destroyed(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_output::WlOutput) {}
}

impl SeatHandler for OverlayApp {
    fn seat_state(&mut self) -> &mut SeatState {
        &mut self.seat_state
    }

    fn new_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat) {}

    fn new_capability(&mut self, _: &Connection, qh: &QueueHandle<Self>, seat: wl_seat::WlSeat, capability: Capability) {
        if capability == Capability::Keyboard && self.keyboard.is_none() {
            match self.seat_state.get_keyboard(qh, &seat, None) {
                Ok(keyboard) => self.keyboard = Some(keyboard),
                Err(err) => error!("Cannot use keyboard: {}", err),
            }
        }
    }

    fn remove_capability(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat, capability: Capability) {
        if capability == Capability::Keyboard {
            if let Some(keyboard) = self.keyboard.take() {
                keyboard.release();
            }
        }
    }

    fn remove_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat) {}
}

impl KeyboardHandler for OverlayApp {
    fn enter(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: &wl_surface::WlSurface,
        _: u32,
        _: &[u32],
        _: &[Keysym],
    ) {
    }

    fn leave(
        &mut self,
        _: &Connection,
        qh: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: &wl_surface::WlSurface,
        _: u32,
    ) {
        self.handle_input(InputEvent::Cancel, qh);
    }

    fn press_key(
        &mut self,
        _: &Connection,
        qh: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: u32,
        event: KeyEvent,
    ) {
        if let Some(input) = self.keys.translate(u32::from(event.keysym), event.utf8.as_deref()) {
            self.handle_input(input, qh);
        }
    }

    fn release_key(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_keyboard::WlKeyboard, _: u32, _: KeyEvent) {}

    fn update_modifiers(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: u32,
        modifiers: Modifiers,
        _: u32,
    ) {
        self.keys.set_ctrl(modifiers.ctrl);
    }
}

impl ShmHandler for OverlayApp {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm
    }
}

impl ProvidesRegistryState for OverlayApp {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    registry_handlers![OutputState, SeatState];
}

delegate_compositor!(OverlayApp);
delegate_output!(OverlayApp);
delegate_shm!(OverlayApp);
delegate_seat!(OverlayApp);
delegate_keyboard!(OverlayApp);
delegate_layer!(OverlayApp);
delegate_registry!(OverlayApp);
