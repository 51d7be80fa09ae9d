//! Window Manager Core
//!
//! `WindowManager` owns the display connection and the focus state and routes
//! every event to its handler. Each event is handled completely before the
//! next one is fetched.

pub mod display;
pub mod errors;
pub mod events;
pub mod focus;
pub mod keyboard;
pub mod keymap;
pub mod moveresize;
pub mod placement;

use anyhow::Result;
use tracing::{debug, info, warn};
use x11rb::protocol::xproto::{ConfigureWindowAux, Keycode, Mapping, Window};
use x11rb::NONE;

use crate::config::Config;
use crate::spawn;
use crate::wm::display::DisplayConnection;
use crate::wm::errors::{Disposition, ErrorPolicy, StartupError};
use crate::wm::events::WmEvent;
use crate::wm::focus::FocusState;
use crate::wm::keyboard::{default_bindings, KeyboardAction, KeyboardManager};
use crate::wm::moveresize::GeometryEngine;
use crate::wm::placement::PlacementPolicy;

/// Event dispatcher and owner of all window manager state
pub struct WindowManager<D: DisplayConnection> {
    display: D,
    pub focus: FocusState,
    pub keyboard: KeyboardManager,
    pub geometry: GeometryEngine,
    pub placement: PlacementPolicy,
    errors: ErrorPolicy,
    running: bool,
}

impl<D: DisplayConnection> WindowManager<D> {
    pub fn new(display: D, config: &Config, errors: ErrorPolicy) -> Result<Self> {
        let focus = FocusState::new(display.root(), display.sentinel())?;

        Ok(Self {
            display,
            focus,
            keyboard: KeyboardManager::new(default_bindings(&config.commands)),
            geometry: GeometryEngine::new(&config.geometry),
            placement: PlacementPolicy::new(&config.geometry),
            errors,
            running: true,
        })
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Grab bindings, park focus on the sentinel and leave the startup phase
    pub fn start(&mut self) -> Result<()> {
        self.keyboard.grab(&self.display)?;
        self.focus.focus_current(&self.display)?;
        self.display.flush()?;
        self.errors.finish_startup();

        info!("Window manager started");
        Ok(())
    }

    /// Handle events until a quit action clears the running flag
    pub fn run(&mut self) -> Result<()> {
        info!("Entering event loop");
        while self.running {
            let event = self.display.next_event()?;
            self.handle_event(event)?;
            self.display.flush()?;
        }

        info!("Event loop finished");
        Ok(())
    }

    pub fn handle_event(&mut self, event: WmEvent) -> Result<()> {
        debug!("{}: {:?}", event.name(), event);

        match event {
            WmEvent::ConfigureRequest { window, changes } => self.on_configure_request(window, &changes),
            WmEvent::MapRequest { window } => self.on_map_request(window),
            WmEvent::UnmapNotify { window } | WmEvent::DestroyNotify { window } => self.on_window_gone(window),
            WmEvent::EnterNotify { window } => self.on_enter(window),
            WmEvent::ButtonPress { window, subwindow } => self.on_button_press(window, subwindow),
            WmEvent::KeyPress { keycode, state } => self.on_key_press(keycode, state),
            WmEvent::MappingNotify { request } => self.on_mapping_notify(request),
            WmEvent::ProtocolError { kind, major_opcode } => match self.errors.handle(kind, major_opcode) {
                Disposition::Discard => Ok(()),
                Disposition::Fatal => Err(StartupError::AnotherWmRunning.into()),
            },
        }
    }

    /// Pass the request through exactly as asked
    fn on_configure_request(&mut self, window: Window, changes: &ConfigureWindowAux) -> Result<()> {
        self.display.configure_window(window, changes)
    }

    fn on_map_request(&mut self, window: Window) -> Result<()> {
        let Some(attrs) = self.display.attributes(window) else {
            debug!("Window 0x{:x} vanished before it could be mapped", window);
            return Ok(());
        };

        if attrs.override_redirect {
            debug!("Ignoring override-redirect window 0x{:x}", window);
            return Ok(());
        }

        self.display.select_client_events(window)?;
        self.display.map_window(window)?;

        let placed = self.placement.place(attrs.geometry, self.display.screen_size());
        self.display.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(placed.x)
                .y(placed.y)
                .width(placed.width)
                .height(placed.height)
                .border_width(0),
        )?;

        self.focus.set_current(window);
        self.focus.focus_current(&self.display)
    }

    fn on_window_gone(&mut self, window: Window) -> Result<()> {
        if self.focus.forget(window) {
            debug!("Current window 0x{:x} went away, falling back to sentinel", window);
            self.focus.focus_current(&self.display)?;
        }
        Ok(())
    }

    /// Focus follows the mouse
    fn on_enter(&mut self, window: Window) -> Result<()> {
        self.focus.set_current(window);
        self.focus.focus_current(&self.display)
    }

    fn on_button_press(&mut self, window: Window, subwindow: Window) -> Result<()> {
        if subwindow != NONE {
            self.focus.set_current(subwindow);
        } else if window == self.display.root() {
            self.focus.reset();
        }
        self.focus.focus_current(&self.display)
    }

    fn on_key_press(&mut self, keycode: Keycode, state: u16) -> Result<()> {
        let Some(keysym) = self.display.keysym(keycode) else {
            debug!("Keycode {} has no keysym, dropping", keycode);
            return Ok(());
        };

        let Some(action) = self.keyboard.resolve(keysym, state).cloned() else {
            return Ok(());
        };
        self.perform(action)
    }

    /// Keycodes may now produce different keysyms, so every grab is redone
    fn on_mapping_notify(&mut self, request: Mapping) -> Result<()> {
        debug!("Mapping changed ({:?}), regrabbing", request);
        self.display.refresh_keymap()?;
        self.keyboard.grab(&self.display)
    }

    pub fn perform(&mut self, action: KeyboardAction) -> Result<()> {
        let display = &self.display;
        let focus = &mut self.focus;

        match action {
            KeyboardAction::Spawn(command) => {
                if let Err(e) = spawn::spawn(&command, display.connection_fd()) {
                    warn!("Failed to launch {:?}: {:#}", command, e);
                }
                Ok(())
            }
            KeyboardAction::Move(direction) => self.geometry.move_window(display, focus, direction),
            KeyboardAction::Resize(direction) => self.geometry.resize_window(display, focus, direction),
            KeyboardAction::Snap(direction, region) => self.geometry.snap_window(display, focus, direction, region),
            KeyboardAction::Center => self.geometry.center_window(display, focus),
            KeyboardAction::ToggleFullscreen => self.geometry.toggle_fullscreen(display, focus),
            KeyboardAction::Kill => self.geometry.kill_window(display, focus),
            KeyboardAction::Circulate(direction) => display.circulate(direction),
            KeyboardAction::Quit => {
                info!("Quit requested");
                self.running = false;
                Ok(())
            }
        }
    }
}
