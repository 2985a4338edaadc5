//! X11 platform implementation for the overlay window
//!
//! Uses XCB via x11rb for a transparent, always-on-top, click-through
//! window. Requires a compositor for transparency.
//!
//! Requests that create the overlay's resources are checked during setup, so
//! a rejected window or SHM attach fails the backend instead of leaving an
//! invisible window behind.

use activate_types::DrawOptions;
use tracing::{debug, error, info, warn};
use x11rb::atom_manager;
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::randr::ConnectionExt as _;
use x11rb::protocol::shape::{self, ConnectionExt as _};
use x11rb::protocol::shm::{self, ConnectionExt as _};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use super::shm::{ShmSegment, frame_len};
use super::{Backend, MonitorInfo, OVERLAY_NAMESPACE, PlatformError, primary_monitor};
use crate::renderer::Renderer;

// Atoms needed for EWMH hints
atom_manager! {
    pub AtomCollection: AtomCollectionCookie {
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_DOCK,
        _NET_WM_STATE,
        _NET_WM_STATE_ABOVE,
        _NET_WM_STATE_SKIP_TASKBAR,
        _NET_WM_STATE_SKIP_PAGER,
        _NET_WM_BYPASS_COMPOSITOR,
        GAMESCOPE_EXTERNAL_OVERLAY,
        ATOM,
        CARDINAL,
    }
}

/// Exit status when X11 is the last backend and it fails
pub const X11_FAILURE_CODE: i32 = 2;

/// The X11 backend
#[derive(Debug, Default)]
pub struct X11Backend;

impl Backend for X11Backend {
    fn name(&self) -> &'static str {
        "X11"
    }

    fn failure_code(&self) -> i32 {
        X11_FAILURE_CODE
    }

    fn start(&mut self, options: &DrawOptions) -> Result<(), PlatformError> {
        let mut overlay = X11Overlay::new(options)?;
        overlay.run(options)
    }
}

fn other(e: impl std::fmt::Display) -> PlatformError {
    PlatformError::Other(e.to_string())
}

/// Query RandR monitors on an existing connection. Empty if RandR is missing.
fn query_monitors(conn: &RustConnection, root: Window) -> Vec<MonitorInfo> {
    let Ok(cookie) = conn.randr_get_monitors(root, true) else {
        return Vec::new();
    };
    let Ok(monitors) = cookie.reply() else {
        return Vec::new();
    };

    monitors
        .monitors
        .iter()
        .enumerate()
        .map(|(idx, mon)| {
            let name = conn
                .get_atom_name(mon.name)
                .ok()
                .and_then(|r| r.reply().ok())
                .map(|r| String::from_utf8_lossy(&r.name).to_string())
                .unwrap_or_else(|| format!("Monitor {}", idx + 1));

            MonitorInfo {
                name,
                x: mon.x as i32,
                y: mon.y as i32,
                width: mon.width as u32,
                height: mon.height as u32,
                is_primary: mon.primary,
            }
        })
        .collect()
}

/// Find a 32-bit TrueColor visual for transparency
fn find_argb_visual(screen: &Screen) -> Option<(Visualid, u8)> {
    screen
        .allowed_depths
        .iter()
        .filter(|depth| depth.depth == 32)
        .flat_map(|depth| depth.visuals.iter().map(move |v| (v, depth.depth)))
        .find(|(visual, _)| visual.class == VisualClass::TRUE_COLOR)
        .map(|(visual, depth)| (visual.visual_id, depth))
}

/// Whether a protocol error concerns one of the overlay's own resources
fn hits_overlay(bad_value: u32, resources: &[u32]) -> bool {
    resources.contains(&bad_value)
}

fn clamp_i16(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn clamp_u16(v: u32) -> u16 {
    v.min(u16::MAX as u32) as u16
}

struct X11Overlay {
    conn: RustConnection,
    window: Window,
    gc: Gcontext,
    colormap: Colormap,
    width: u16,
    height: u16,
    depth: u8,

    renderer: Renderer,
    // RGBA from renderer
    pixel_data: Vec<u8>,
    shm: ShmSegment,
    shm_seg: shm::Seg,
}

impl X11Overlay {
    fn new(options: &DrawOptions) -> Result<Self, PlatformError> {
        let (conn, screen_num) =
            x11rb::connect(None).map_err(|e| PlatformError::ConnectionFailed(e.to_string()))?;

        // Intern atoms
        let atoms = AtomCollection::new(&conn).map_err(other)?.reply().map_err(other)?;

        let setup = conn.setup();
        let screen = setup
            .roots
            .get(screen_num)
            .ok_or_else(|| PlatformError::ConnectionFailed(format!("no screen {}", screen_num)))?;
        let root = screen.root;

        // Check for required extensions
        conn.shape_query_version()
            .map_err(|_| PlatformError::UnsupportedFeature("Shape extension".into()))?
            .reply()
            .map_err(|_| PlatformError::UnsupportedFeature("Shape extension".into()))?;

        conn.shm_query_version()
            .map_err(|_| PlatformError::UnsupportedFeature("SHM extension".into()))?
            .reply()
            .map_err(|_| PlatformError::UnsupportedFeature("SHM extension".into()))?;

        let (visual, depth) = find_argb_visual(screen)
            .ok_or_else(|| PlatformError::UnsupportedFeature("32-bit ARGB visual".into()))?;

        let colormap = conn.generate_id().map_err(other)?;
        conn.create_colormap(ColormapAlloc::NONE, colormap, root, visual)
            .map_err(other)?
            .check()
            .map_err(other)?;

        let (scaled_width, scaled_height) = options.scaled_size();
        let width = clamp_u16(scaled_width);
        let height = clamp_u16(scaled_height);

        // Bottom-right of the primary monitor, or of the whole screen
        let screen_area = MonitorInfo {
            name: "screen".to_string(),
            x: 0,
            y: 0,
            width: screen.width_in_pixels as u32,
            height: screen.height_in_pixels as u32,
            is_primary: true,
        };
        let monitors = query_monitors(&conn, root);
        let monitor = primary_monitor(&monitors).unwrap_or(&screen_area);
        let (x, y) = monitor.overlay_origin(
            width as u32,
            height as u32,
            options.offset_left,
            options.offset_top,
        );
        debug!(monitor = %monitor.name, x, y, width, height, "Placing X11 overlay");

        let window = conn.generate_id().map_err(other)?;
        let win_aux = CreateWindowAux::new()
            .background_pixel(0)
            .border_pixel(0)
            .colormap(colormap)
            .event_mask(EventMask::EXPOSURE | EventMask::STRUCTURE_NOTIFY)
            .override_redirect(1);

        conn.create_window(
            depth,
            window,
            root,
            clamp_i16(x),
            clamp_i16(y),
            width,
            height,
            0,
            WindowClass::INPUT_OUTPUT,
            visual,
            &win_aux,
        )
        .map_err(other)?
        .check()
        .map_err(other)?;

        let gc = conn.generate_id().map_err(other)?;
        conn.create_gc(gc, window, &CreateGCAux::new())
            .map_err(other)?
            .check()
            .map_err(other)?;

        let size = frame_len(width as u32, height as u32)?;
        let shm = ShmSegment::new(size)?;
        let shm_seg = conn.generate_id().map_err(other)?;
        conn.shm_attach_fd(shm_seg, shm.clone_fd()?, false)
            .map_err(|e| PlatformError::BufferError(format!("shm_attach_fd failed: {}", e)))?
            .check()
            .map_err(|e| PlatformError::BufferError(format!("shm_attach_fd failed: {}", e)))?;

        let overlay = Self {
            conn,
            window,
            gc,
            colormap,
            width,
            height,
            depth,
            renderer: Renderer::new(options),
            pixel_data: vec![0u8; size],
            shm,
            shm_seg,
        };

        overlay.setup_window_hints(&atoms, options)?;
        overlay.set_click_through()?;

        overlay
            .conn
            .map_window(window)
            .map_err(other)?
            .check()
            .map_err(other)?;

        info!(width, height, "X11 overlay mapped");
        Ok(overlay)
    }

    /// Set EWMH hints for overlay behavior
    fn setup_window_hints(
        &self,
        atoms: &AtomCollection,
        options: &DrawOptions,
    ) -> Result<(), PlatformError> {
        let name = OVERLAY_NAMESPACE.as_bytes();
        self.conn
            .change_property8(
                PropMode::REPLACE,
                self.window,
                AtomEnum::WM_NAME,
                AtomEnum::STRING,
                name,
            )
            .map_err(other)?;

        // WM_CLASS is instance and class, each NUL-terminated
        let class = [name, b"\0", name, b"\0"].concat();
        self.conn
            .change_property8(
                PropMode::REPLACE,
                self.window,
                AtomEnum::WM_CLASS,
                AtomEnum::STRING,
                &class,
            )
            .map_err(other)?;

        // Window type: dock (stays on top, no decorations)
        self.conn
            .change_property32(
                PropMode::REPLACE,
                self.window,
                atoms._NET_WM_WINDOW_TYPE,
                atoms.ATOM,
                &[atoms._NET_WM_WINDOW_TYPE_DOCK],
            )
            .map_err(other)?;

        // Window state: above, skip taskbar/pager
        self.conn
            .change_property32(
                PropMode::REPLACE,
                self.window,
                atoms._NET_WM_STATE,
                atoms.ATOM,
                &[
                    atoms._NET_WM_STATE_ABOVE,
                    atoms._NET_WM_STATE_SKIP_TASKBAR,
                    atoms._NET_WM_STATE_SKIP_PAGER,
                ],
            )
            .map_err(other)?;

        if options.bypass_compositor {
            self.conn
                .change_property32(
                    PropMode::REPLACE,
                    self.window,
                    atoms._NET_WM_BYPASS_COMPOSITOR,
                    atoms.CARDINAL,
                    &[1],
                )
                .map_err(other)?;
        }

        if options.gamescope_overlay {
            self.conn
                .change_property32(
                    PropMode::REPLACE,
                    self.window,
                    atoms.GAMESCOPE_EXTERNAL_OVERLAY,
                    atoms.CARDINAL,
                    &[1],
                )
                .map_err(other)?;
        }

        Ok(())
    }

    /// Empty input region, clicks pass through
    fn set_click_through(&self) -> Result<(), PlatformError> {
        self.conn
            .shape_rectangles(
                shape::SO::SET,
                shape::SK::INPUT,
                ClipOrdering::UNSORTED,
                self.window,
                0,
                0,
                &[],
            )
            .map_err(other)?;
        Ok(())
    }

    fn redraw(&mut self, options: &DrawOptions) -> Result<(), PlatformError> {
        self.renderer.render(
            options,
            &mut self.pixel_data,
            self.width as u32,
            self.height as u32,
        );
        self.shm.write_bgra(&self.pixel_data);

        self.conn
            .shm_put_image(
                self.window,
                self.gc,
                self.width,
                self.height,
                0,
                0,
                self.width,
                self.height,
                0,
                0,
                self.depth,
                ImageFormat::Z_PIXMAP.into(),
                false,
                self.shm_seg,
                0,
            )
            .map_err(|e| PlatformError::ConnectionFailed(e.to_string()))?;
        self.conn
            .flush()
            .map_err(|e| PlatformError::ConnectionFailed(e.to_string()))
    }

    /// Block on X events until the window is destroyed, the connection
    /// breaks or the server rejects a request on one of our resources
    fn run(&mut self, options: &DrawOptions) -> Result<(), PlatformError> {
        let resources = [self.window, self.gc, self.colormap, self.shm_seg];

        loop {
            let event = self
                .conn
                .wait_for_event()
                .map_err(|e| PlatformError::ConnectionFailed(e.to_string()))?;

            match event {
                Event::Expose(e) if e.window == self.window && e.count == 0 => {
                    self.redraw(options)?;
                }
                Event::DestroyNotify(e) if e.window == self.window => {
                    info!("X11 overlay window destroyed");
                    return Ok(());
                }
                Event::Error(e) if hits_overlay(e.bad_value, &resources) => {
                    error!(error = ?e, "X11 rejected an overlay request");
                    return Err(PlatformError::Other(format!(
                        "{:?} on resource {:#x}",
                        e.error_kind, e.bad_value
                    )));
                }
                Event::Error(e) => {
                    warn!(error = ?e, "X11 protocol error");
                }
                _ => {}
            }
        }
    }
}

impl Drop for X11Overlay {
    fn drop(&mut self) {
        // The segment itself is unmapped when `shm` drops
        let _ = self.conn.shm_detach(self.shm_seg);
        let _ = self.conn.destroy_window(self.window);
        let _ = self.conn.free_gc(self.gc);
        let _ = self.conn.free_colormap(self.colormap);
        let _ = self.conn.flush();
    }
}
