//! Display Module
//!
//! The protocol boundary of the window manager. `DisplayConnection` names every
//! request the core issues; `X11Display` implements it over an x11rb connection
//! and owns the cached keymap and the sentinel focus window.

use anyhow::{Context, Result};
use std::os::fd::{AsRawFd, RawFd};
use tracing::{debug, info, trace, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::COPY_FROM_PARENT;

use crate::shared::Geometry;
use crate::wm::errors::{ErrorPolicy, StartupError};
use crate::wm::events::WmEvent;
use crate::wm::keymap::Keymap;

/// Attributes read when a client asks to be mapped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAttributes {
    pub override_redirect: bool,
    pub geometry: Geometry,
}

/// Restacking order for the root's children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CirculateDirection {
    /// Raise the lowest child to the top
    Next,
    /// Lower the highest child to the bottom
    Prev,
}

/// Requests the core sends to the display server
///
/// Query methods return `None` when the server refuses (typically because the
/// window is already gone); request methods only fail when the connection does.
pub trait DisplayConnection {
    fn root(&self) -> Window;

    /// Placeholder that holds input focus when no client does
    fn sentinel(&self) -> Window;

    /// Screen width and height in pixels
    fn screen_size(&self) -> (u32, u32);

    /// Block until the next event with a handler arrives
    fn next_event(&mut self) -> Result<WmEvent>;

    fn attributes(&self, window: Window) -> Option<ClientAttributes>;
    fn geometry(&self, window: Window) -> Option<Geometry>;

    /// Ask for structure-change and pointer-enter events on a client
    fn select_client_events(&self, window: Window) -> Result<()>;
    fn map_window(&self, window: Window) -> Result<()>;
    fn configure_window(&self, window: Window, changes: &ConfigureWindowAux) -> Result<()>;
    fn move_resize_window(&self, window: Window, geometry: Geometry) -> Result<()>;
    fn set_input_focus(&self, window: Window) -> Result<()>;
    fn raise_window(&self, window: Window) -> Result<()>;

    /// Destroy every resource of the window's client and drop its connection
    fn kill_client(&self, window: Window) -> Result<()>;
    fn circulate(&self, direction: CirculateDirection) -> Result<()>;

    /// Release every key and button grab on the root
    fn ungrab_all(&self) -> Result<()>;
    fn grab_key(&self, keysym: Keysym, modifiers: u16) -> Result<()>;
    fn grab_button(&self, button: ButtonIndex, modifiers: u16) -> Result<()>;

    fn keysym(&self, keycode: Keycode) -> Option<Keysym>;
    fn refresh_keymap(&mut self) -> Result<()>;

    /// Descriptor of the server connection, closed in spawned children
    fn connection_fd(&self) -> Option<RawFd>;
    fn flush(&self) -> Result<()>;
}

/// Live connection to an X server
pub struct X11Display {
    conn: RustConnection,
    root: Window,
    sentinel: Window,
    screen_width: u16,
    screen_height: u16,
    keymap: Keymap,
}

impl X11Display {
    /// Open the default display, claim the window manager role and create the sentinel
    pub fn connect(policy: &ErrorPolicy) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).map_err(StartupError::ConnectionFailed)?;

        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let screen_width = screen.width_in_pixels;
        let screen_height = screen.height_in_pixels;

        info!("Connected to X server, screen {}, root window {}", screen_num, root);
        info!("Screen size: {}x{}", screen_width, screen_height);

        // Become the window manager by selecting SubstructureRedirect on root
        let claim = conn
            .change_window_attributes(
                root,
                &ChangeWindowAttributesAux::new().event_mask(EventMask::SUBSTRUCTURE_REDIRECT),
            )
            .map_err(StartupError::ConnectionLost)?
            .check();
        policy.check_redirect(claim)?;

        info!("Registered as window manager");

        let sentinel = conn.generate_id()?;
        conn.create_window(
            COPY_FROM_PARENT as u8,
            sentinel,
            root,
            -1, -1, 1, 1,
            0,
            WindowClass::INPUT_ONLY,
            0,
            &CreateWindowAux::new().override_redirect(1),
        )?;
        conn.map_window(sentinel)?;
        debug!("Created sentinel window 0x{:x}", sentinel);

        let keymap = Keymap::fetch(&conn)?;
        conn.flush()?;

        Ok(Self {
            conn,
            root,
            sentinel,
            screen_width,
            screen_height,
            keymap,
        })
    }
}

impl DisplayConnection for X11Display {
    fn root(&self) -> Window {
        self.root
    }

    fn sentinel(&self) -> Window {
        self.sentinel
    }

    fn screen_size(&self) -> (u32, u32) {
        (self.screen_width as u32, self.screen_height as u32)
    }

    fn next_event(&mut self) -> Result<WmEvent> {
        loop {
            let event = self
                .conn
                .wait_for_event()
                .context("Connection to X server lost")?;

            match WmEvent::from_x11(&event) {
                Some(converted) => return Ok(converted),
                None => trace!("Dropping unhandled event: {:?}", event),
            }
        }
    }

    fn attributes(&self, window: Window) -> Option<ClientAttributes> {
        let attrs = self.conn.get_window_attributes(window).ok()?.reply().ok()?;
        let geometry = self.geometry(window)?;

        Some(ClientAttributes {
            override_redirect: attrs.override_redirect,
            geometry,
        })
    }

    fn geometry(&self, window: Window) -> Option<Geometry> {
        let geom = self.conn.get_geometry(window).ok()?.reply().ok()?;
        Some(Geometry::new(
            geom.x as i32,
            geom.y as i32,
            geom.width as u32,
            geom.height as u32,
        ))
    }

    fn select_client_events(&self, window: Window) -> Result<()> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new()
                .event_mask(EventMask::STRUCTURE_NOTIFY | EventMask::ENTER_WINDOW),
        )?;
        Ok(())
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn configure_window(&self, window: Window, changes: &ConfigureWindowAux) -> Result<()> {
        self.conn.configure_window(window, changes)?;
        Ok(())
    }

    fn move_resize_window(&self, window: Window, geometry: Geometry) -> Result<()> {
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(geometry.x)
                .y(geometry.y)
                .width(geometry.width)
                .height(geometry.height),
        )?;
        Ok(())
    }

    fn set_input_focus(&self, window: Window) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::PARENT, window, x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn raise_window(&self, window: Window) -> Result<()> {
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        Ok(())
    }

    fn kill_client(&self, window: Window) -> Result<()> {
        self.conn.set_close_down_mode(CloseDown::DESTROY_ALL)?;
        self.conn.kill_client(window)?;
        Ok(())
    }

    fn circulate(&self, direction: CirculateDirection) -> Result<()> {
        let order = match direction {
            CirculateDirection::Next => Circulate::RAISE_LOWEST,
            CirculateDirection::Prev => Circulate::LOWER_HIGHEST,
        };
        self.conn.circulate_window(order, self.root)?;
        Ok(())
    }

    fn ungrab_all(&self) -> Result<()> {
        self.conn.ungrab_key(Grab::ANY, self.root, ModMask::ANY)?;
        self.conn
            .ungrab_button(ButtonIndex::ANY, self.root, ModMask::ANY)?;
        Ok(())
    }

    fn grab_key(&self, keysym: Keysym, modifiers: u16) -> Result<()> {
        let Some(keycode) = self.keymap.keycode(keysym) else {
            warn!("No keycode for keysym 0x{:x}, binding not grabbed", keysym);
            return Ok(());
        };

        self.conn.grab_key(
            true,
            self.root,
            ModMask::from(modifiers),
            keycode,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
        )?;
        Ok(())
    }

    fn grab_button(&self, button: ButtonIndex, modifiers: u16) -> Result<()> {
        self.conn.grab_button(
            true,
            self.root,
            EventMask::BUTTON_PRESS,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            x11rb::NONE,
            x11rb::NONE,
            button,
            ModMask::from(modifiers),
        )?;
        Ok(())
    }

    fn keysym(&self, keycode: Keycode) -> Option<Keysym> {
        self.keymap.keysym(keycode)
    }

    fn refresh_keymap(&mut self) -> Result<()> {
        self.keymap = Keymap::fetch(&self.conn)?;
        Ok(())
    }

    fn connection_fd(&self) -> Option<RawFd> {
        Some(self.conn.stream().as_raw_fd())
    }

    fn flush(&self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }
}
