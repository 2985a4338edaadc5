//! Wayland platform implementation using the layer-shell protocol
//!
//! Works on compositors that implement wlr-layer-shell (wlroots-based ones
//! like Sway and Hyprland, KDE, and others). GNOME does not.

use activate_types::DrawOptions;
use tracing::{debug, info};
use wayland_client::globals::{GlobalListContents, registry_queue_init};
use wayland_client::protocol::wl_buffer::WlBuffer;
use wayland_client::protocol::wl_callback::{self, WlCallback};
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_region::WlRegion;
use wayland_client::protocol::wl_registry;
use wayland_client::protocol::wl_shm::{Format, WlShm};
use wayland_client::protocol::wl_shm_pool::WlShmPool;
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{Connection, Dispatch, EventQueue, QueueHandle};
use wayland_protocols_wlr::layer_shell::v1::client::{
    zwlr_layer_shell_v1::{Layer, ZwlrLayerShellV1},
    zwlr_layer_surface_v1::{self, Anchor, KeyboardInteractivity, ZwlrLayerSurfaceV1},
};

use super::shm::{ShmSegment, frame_len};
use super::{Backend, OVERLAY_NAMESPACE, PlatformError};
use crate::renderer::Renderer;

/// Exit status when Wayland is the last backend and it fails
pub const WAYLAND_FAILURE_CODE: i32 = 3;

/// The Wayland layer-shell backend
#[derive(Debug, Default)]
pub struct WaylandBackend;

impl Backend for WaylandBackend {
    fn name(&self) -> &'static str {
        "Wayland"
    }

    fn failure_code(&self) -> i32 {
        WAYLAND_FAILURE_CODE
    }

    fn start(&mut self, options: &DrawOptions) -> Result<(), PlatformError> {
        // Gamescope only composites Xwayland windows carrying its atom
        if options.gamescope_overlay {
            return Err(PlatformError::UnsupportedFeature("gamescope overlay".into()));
        }

        let mut overlay = WaylandOverlay::new(options)?;
        overlay.run(options)
    }
}

/// Protocol state touched from event handlers
#[derive(Debug)]
struct WaylandState {
    running: bool,
    configured: bool,
    frame_done: bool,
    width: u32,
    height: u32,
}

impl WaylandState {
    fn new(width: u32, height: u32) -> Self {
        Self {
            running: true,
            configured: false,
            frame_done: false,
            width,
            height,
        }
    }
}

/// Pixel storage shared with the compositor
struct FrameBuffer {
    shm: ShmSegment,
    pool: WlShmPool,
    buffer: WlBuffer,
    width: u32,
    height: u32,
}

impl FrameBuffer {
    fn new(
        shm: &WlShm,
        width: u32,
        height: u32,
        qh: &QueueHandle<WaylandState>,
    ) -> Result<Self, PlatformError> {
        // frame_len keeps size, and so stride and both sides, within i32
        let size = frame_len(width, height)?;
        let segment = ShmSegment::new(size)?;

        let pool = shm.create_pool(segment.fd(), size as i32, qh, ());
        let buffer = pool.create_buffer(
            0,
            width as i32,
            height as i32,
            (width * 4) as i32,
            Format::Argb8888,
            qh,
            (),
        );

        Ok(Self {
            shm: segment,
            pool,
            buffer,
            width,
            height,
        })
    }

    fn destroy(&self) {
        self.buffer.destroy();
        self.pool.destroy();
    }
}

struct WaylandOverlay {
    connection: Connection,
    event_queue: EventQueue<WaylandState>,
    qh: QueueHandle<WaylandState>,
    state: WaylandState,

    shm: WlShm,
    surface: WlSurface,
    layer_surface: ZwlrLayerSurfaceV1,
    frame: Option<FrameBuffer>,

    renderer: Renderer,
    // RGBA from renderer
    pixel_data: Vec<u8>,
}

impl WaylandOverlay {
    fn new(options: &DrawOptions) -> Result<Self, PlatformError> {
        let connection = Connection::connect_to_env()
            .map_err(|e| PlatformError::ConnectionFailed(e.to_string()))?;

        let (globals, mut event_queue) = registry_queue_init::<WaylandState>(&connection)
            .map_err(|e| PlatformError::ConnectionFailed(e.to_string()))?;
        let qh = event_queue.handle();

        let compositor: WlCompositor = globals
            .bind(&qh, 4..=6, ())
            .map_err(|_| PlatformError::UnsupportedFeature("wl_compositor".to_string()))?;

        let layer_shell: ZwlrLayerShellV1 = globals
            .bind(&qh, 1..=4, ())
            .map_err(|_| PlatformError::UnsupportedFeature("zwlr_layer_shell_v1".to_string()))?;

        let shm: WlShm = globals
            .bind(&qh, 1..=1, ())
            .map_err(|_| PlatformError::UnsupportedFeature("wl_shm".to_string()))?;

        let (width, height) = options.scaled_size();
        let mut state = WaylandState::new(width, height);

        // No output given, the compositor picks one
        let surface = compositor.create_surface(&qh, ());
        let layer_surface = layer_shell.get_layer_surface(
            &surface,
            None,
            Layer::Overlay,
            OVERLAY_NAMESPACE.to_string(),
            &qh,
            (),
        );

        // Empty input region, clicks pass through
        let region = compositor.create_region(&qh, ());
        surface.set_input_region(Some(&region));
        region.destroy();

        layer_surface.set_anchor(Anchor::Bottom | Anchor::Right);
        layer_surface.set_margin(0, options.offset_left, options.offset_top, 0);
        layer_surface.set_keyboard_interactivity(KeyboardInteractivity::None);
        layer_surface.set_size(width, height);
        surface.commit();
        debug!(
            width,
            height,
            right = options.offset_left,
            bottom = options.offset_top,
            "Layer surface requested"
        );

        // The first configure must be acked before attaching a buffer
        while !state.configured {
            event_queue
                .blocking_dispatch(&mut state)
                .map_err(|e| PlatformError::ConnectionFailed(e.to_string()))?;
            if !state.running {
                return Err(PlatformError::Other(
                    "layer surface closed before configure".to_string(),
                ));
            }
        }

        info!(width = state.width, height = state.height, "Wayland overlay configured");

        Ok(Self {
            connection,
            event_queue,
            qh,
            state,
            shm,
            surface,
            layer_surface,
            frame: None,
            renderer: Renderer::new(options),
            pixel_data: Vec::new(),
        })
    }

    /// Make sure the buffer matches the size from the last configure
    fn ensure_buffer(&mut self) -> Result<(), PlatformError> {
        let (width, height) = (self.state.width, self.state.height);
        if let Some(frame) = &self.frame
            && frame.width == width
            && frame.height == height
        {
            return Ok(());
        }

        if let Some(old) = self.frame.take() {
            old.destroy();
        }
        let size = frame_len(width, height)?;
        self.frame = Some(FrameBuffer::new(&self.shm, width, height, &self.qh)?);
        self.pixel_data = vec![0u8; size];
        Ok(())
    }

    /// Render one pass, attach it and ask for the next frame callback
    fn draw_frame(&mut self, options: &DrawOptions) -> Result<(), PlatformError> {
        self.ensure_buffer()?;
        let Some(frame) = self.frame.as_mut() else {
            return Ok(());
        };

        self.renderer
            .render(options, &mut self.pixel_data, frame.width, frame.height);
        frame.shm.write_bgra(&self.pixel_data);

        self.surface.frame(&self.qh, ());
        self.surface.attach(Some(&frame.buffer), 0, 0);
        self.surface
            .damage_buffer(0, 0, frame.width as i32, frame.height as i32);
        self.surface.commit();
        Ok(())
    }

    /// Frame-callback driven loop, sleeping in `blocking_dispatch` between
    /// compositor events
    fn run(&mut self, options: &DrawOptions) -> Result<(), PlatformError> {
        self.draw_frame(options)?;

        while self.state.running {
            self.event_queue
                .blocking_dispatch(&mut self.state)
                .map_err(|e| PlatformError::ConnectionFailed(e.to_string()))?;

            if std::mem::take(&mut self.state.frame_done) {
                self.draw_frame(options)?;
            }
        }

        info!("Layer surface closed by compositor");
        Ok(())
    }
}

impl Drop for WaylandOverlay {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            frame.destroy();
        }
        self.layer_surface.destroy();
        self.surface.destroy();
        let _ = self.connection.flush();
    }
}

// --- Wayland Dispatch implementations ---

/// Macro to implement empty Dispatch for protocols that don't need event handling
macro_rules! impl_empty_dispatch {
    ($proxy:ty, $data:ty, $state:ty) => {
        impl Dispatch<$proxy, $data> for $state {
            fn event(
                _: &mut Self,
                _: &$proxy,
                _: <$proxy as wayland_client::Proxy>::Event,
                _: &$data,
                _: &Connection,
                _: &QueueHandle<Self>,
            ) {
            }
        }
    };
}

impl_empty_dispatch!(wl_registry::WlRegistry, GlobalListContents, WaylandState);
impl_empty_dispatch!(WlCompositor, (), WaylandState);
impl_empty_dispatch!(WlSurface, (), WaylandState);
impl_empty_dispatch!(WlRegion, (), WaylandState);
impl_empty_dispatch!(WlShm, (), WaylandState);
impl_empty_dispatch!(WlShmPool, (), WaylandState);
impl_empty_dispatch!(WlBuffer, (), WaylandState);
impl_empty_dispatch!(ZwlrLayerShellV1, (), WaylandState);

impl Dispatch<ZwlrLayerSurfaceV1, ()> for WaylandState {
    fn event(
        state: &mut Self,
        proxy: &ZwlrLayerSurfaceV1,
        event: zwlr_layer_surface_v1::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            zwlr_layer_surface_v1::Event::Configure {
                serial,
                width,
                height,
            } => {
                proxy.ack_configure(serial);

                if width > 0 && height > 0 {
                    state.width = width;
                    state.height = height;
                }

                state.configured = true;
            }
            zwlr_layer_surface_v1::Event::Closed => {
                state.running = false;
            }
            _ => {}
        }
    }
}

impl Dispatch<WlCallback, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _proxy: &WlCallback,
        event: wl_callback::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { .. } = event {
            state.frame_done = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_identity() {
        let backend = WaylandBackend;
        assert_eq!(backend.name(), "Wayland");
        assert_eq!(backend.failure_code(), 3);
    }

    #[test]
    fn test_gamescope_declined_before_connecting() {
        let options = DrawOptions {
            gamescope_overlay: true,
            ..DrawOptions::default()
        };
        let err = WaylandBackend.start(&options).unwrap_err();
        assert!(matches!(err, PlatformError::UnsupportedFeature(ref f) if f == "gamescope overlay"));
    }

    #[test]
    fn test_state_starts_unconfigured() {
        let state = WaylandState::new(340, 120);
        assert!(state.running);
        assert!(!state.configured);
        assert!(!state.frame_done);
        assert_eq!((state.width, state.height), (340, 120));
    }
}
