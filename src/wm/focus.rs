//! Focus Module
//!
//! Tracks the single current window. The current window is never the root:
//! whenever no client is eligible it is the sentinel.

use anyhow::{bail, Result};
use tracing::debug;
use x11rb::protocol::xproto::Window;
use x11rb::NONE;

use crate::shared::Geometry;
use crate::wm::display::DisplayConnection;

/// Focus tracker
#[derive(Debug, Clone)]
pub struct FocusState {
    root: Window,
    sentinel: Window,
    current: Window,
    /// Geometry to restore when the current window leaves fullscreen
    fullscreen: Option<Geometry>,
}

impl FocusState {
    /// Create a tracker that starts out holding the sentinel
    pub fn new(root: Window, sentinel: Window) -> Result<Self> {
        if sentinel == NONE || sentinel == root {
            bail!("Sentinel window 0x{:x} cannot be none or the root", sentinel);
        }

        Ok(Self {
            root,
            sentinel,
            current: sentinel,
            fullscreen: None,
        })
    }

    pub fn current(&self) -> Window {
        self.current
    }

    /// Geometry actions must no-op on none, the sentinel and the root
    pub fn is_invalid(&self, window: Window) -> bool {
        window == NONE || window == self.sentinel || window == self.root
    }

    pub fn current_is_invalid(&self) -> bool {
        self.is_invalid(self.current)
    }

    /// Make `window` current; none and the root become the sentinel
    pub fn set_current(&mut self, window: Window) {
        let target = if window == NONE || window == self.root {
            self.sentinel
        } else {
            window
        };

        if target != self.current {
            debug!("Current window 0x{:x} -> 0x{:x}", self.current, target);
            // Fullscreen memory belongs to the focused slot, not the window
            self.fullscreen = None;
        }
        self.current = target;
    }

    /// Back to "no client focused"
    pub fn reset(&mut self) {
        self.set_current(self.sentinel);
    }

    /// Drop `window` if it is current; returns whether it was
    pub fn forget(&mut self, window: Window) -> bool {
        if window != self.current || window == self.sentinel {
            return false;
        }
        self.reset();
        true
    }

    /// Give input focus to `window` and raise it, substituting the sentinel
    /// for none and the root
    pub fn focus<D: DisplayConnection + ?Sized>(&self, display: &D, window: Window) -> Result<()> {
        if window == NONE || window == self.root {
            return self.focus(display, self.sentinel);
        }

        display.set_input_focus(window)?;
        display.raise_window(window)
    }

    pub fn focus_current<D: DisplayConnection + ?Sized>(&self, display: &D) -> Result<()> {
        self.focus(display, self.current)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_some()
    }

    /// Remember the pre-fullscreen geometry of the current window
    pub fn enter_fullscreen(&mut self, saved: Geometry) {
        self.fullscreen = Some(saved);
    }

    /// Clear the fullscreen flag, handing back the geometry to restore
    pub fn leave_fullscreen(&mut self) -> Option<Geometry> {
        self.fullscreen.take()
    }
}
