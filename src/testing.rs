//! In-memory display server for tests
//!
//! `FakeDisplay` implements `DisplayConnection` without an X server. It keeps
//! window geometries, the focused window and a scripted event queue, and
//! records every request so tests can assert on protocol traffic.

use anyhow::{anyhow, Result};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::os::fd::RawFd;
use x11rb::protocol::xproto::{ButtonIndex, ConfigureWindowAux, Keycode, Keysym, Window};

use crate::shared::Geometry;
use crate::wm::display::{CirculateDirection, ClientAttributes, DisplayConnection};
use crate::wm::events::WmEvent;

pub const ROOT: Window = 1;
pub const SENTINEL: Window = 2;

/// A request the core sent to the display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SelectInput(Window),
    Map(Window),
    Configure(Window),
    MoveResize(Window, Geometry),
    Focus(Window),
    Raise(Window),
    Kill(Window),
    Circulate(CirculateDirection),
    UngrabAll,
    GrabKey { keysym: Keysym, modifiers: u16 },
    GrabButton { button: ButtonIndex, modifiers: u16 },
    RefreshKeymap,
}

#[derive(Debug, Clone, Copy)]
struct FakeWindow {
    geometry: Geometry,
    override_redirect: bool,
}

/// Scriptable stand-in for an X server
pub struct FakeDisplay {
    screen: (u32, u32),
    windows: RefCell<HashMap<Window, FakeWindow>>,
    keys: HashMap<Keycode, Keysym>,
    events: VecDeque<WmEvent>,
    focused: Cell<Window>,
    calls: RefCell<Vec<Call>>,
}

impl FakeDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen: (width, height),
            windows: RefCell::new(HashMap::new()),
            keys: HashMap::new(),
            events: VecDeque::new(),
            focused: Cell::new(x11rb::NONE),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Map `keycode` to `keysym` at level 0
    pub fn with_key(mut self, keycode: Keycode, keysym: Keysym) -> Self {
        self.keys.insert(keycode, keysym);
        self
    }

    pub fn add_window(&self, window: Window, geometry: Geometry) {
        self.windows.borrow_mut().insert(
            window,
            FakeWindow {
                geometry,
                override_redirect: false,
            },
        );
    }

    pub fn add_override_redirect(&self, window: Window, geometry: Geometry) {
        self.windows.borrow_mut().insert(
            window,
            FakeWindow {
                geometry,
                override_redirect: true,
            },
        );
    }

    /// Simulate the client going away; later queries about it fail
    pub fn destroy_window(&self, window: Window) {
        self.windows.borrow_mut().remove(&window);
    }

    pub fn geometry_of(&self, window: Window) -> Option<Geometry> {
        self.windows.borrow().get(&window).map(|w| w.geometry)
    }

    /// Window most recently given input focus
    pub fn focused(&self) -> Window {
        self.focused.get()
    }

    pub fn push_event(&mut self, event: WmEvent) {
        self.events.push_back(event);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn update(&self, window: Window, apply: impl FnOnce(&mut Geometry)) {
        if let Some(w) = self.windows.borrow_mut().get_mut(&window) {
            apply(&mut w.geometry);
        }
    }
}

impl DisplayConnection for FakeDisplay {
    fn root(&self) -> Window {
        ROOT
    }

    fn sentinel(&self) -> Window {
        SENTINEL
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    fn next_event(&mut self) -> Result<WmEvent> {
        self.events
            .pop_front()
            .ok_or_else(|| anyhow!("Scripted event queue exhausted"))
    }

    fn attributes(&self, window: Window) -> Option<ClientAttributes> {
        self.windows.borrow().get(&window).map(|w| ClientAttributes {
            override_redirect: w.override_redirect,
            geometry: w.geometry,
        })
    }

    fn geometry(&self, window: Window) -> Option<Geometry> {
        self.geometry_of(window)
    }

    fn select_client_events(&self, window: Window) -> Result<()> {
        self.record(Call::SelectInput(window));
        Ok(())
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.record(Call::Map(window));
        Ok(())
    }

    fn configure_window(&self, window: Window, changes: &ConfigureWindowAux) -> Result<()> {
        self.record(Call::Configure(window));
        self.update(window, |g| {
            if let Some(x) = changes.x {
                g.x = x;
            }
            if let Some(y) = changes.y {
                g.y = y;
            }
            if let Some(width) = changes.width {
                g.width = width;
            }
            if let Some(height) = changes.height {
                g.height = height;
            }
        });
        Ok(())
    }

    fn move_resize_window(&self, window: Window, geometry: Geometry) -> Result<()> {
        self.record(Call::MoveResize(window, geometry));
        self.update(window, |g| *g = geometry);
        Ok(())
    }

    fn set_input_focus(&self, window: Window) -> Result<()> {
        self.record(Call::Focus(window));
        self.focused.set(window);
        Ok(())
    }

    fn raise_window(&self, window: Window) -> Result<()> {
        self.record(Call::Raise(window));
        Ok(())
    }

    fn kill_client(&self, window: Window) -> Result<()> {
        self.record(Call::Kill(window));
        self.destroy_window(window);
        Ok(())
    }

    fn circulate(&self, direction: CirculateDirection) -> Result<()> {
        self.record(Call::Circulate(direction));
        Ok(())
    }

    fn ungrab_all(&self) -> Result<()> {
        self.record(Call::UngrabAll);
        Ok(())
    }

    fn grab_key(&self, keysym: Keysym, modifiers: u16) -> Result<()> {
        self.record(Call::GrabKey { keysym, modifiers });
        Ok(())
    }

    fn grab_button(&self, button: ButtonIndex, modifiers: u16) -> Result<()> {
        self.record(Call::GrabButton { button, modifiers });
        Ok(())
    }

    fn keysym(&self, keycode: Keycode) -> Option<Keysym> {
        self.keys.get(&keycode).copied()
    }

    fn refresh_keymap(&mut self) -> Result<()> {
        self.record(Call::RefreshKeymap);
        Ok(())
    }

    fn connection_fd(&self) -> Option<RawFd> {
        None
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
