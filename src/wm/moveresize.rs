//! MoveResize Module
//!
//! Keyboard-driven geometry operations on the current window: step moves and
//! resizes, half/quarter snapping, centering, fullscreen and kill.
//!
//! Every operation reads the window's geometry fresh from the server and does
//! nothing when the current window is the sentinel, the root, or gone.

use anyhow::Result;
use tracing::debug;
use x11rb::protocol::xproto::Window;

use crate::config::GeometryConfig;
use crate::shared::Geometry;
use crate::wm::display::DisplayConnection;
use crate::wm::focus::FocusState;

/// Compass direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

/// Snap target size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapRegion {
    /// Half of the screen along an edge
    Half,
    /// A quarter of the screen in a corner
    Quarter,
}

/// Translate by `step` towards `direction`; positions are not clamped
pub fn moved(geometry: Geometry, direction: Direction, step: u32) -> Geometry {
    let step = step as i32;
    let (dx, dy) = match direction {
        Direction::North => (0, -step),
        Direction::East => (step, 0),
        Direction::South => (0, step),
        Direction::West => (-step, 0),
    };
    geometry.at(geometry.x + dx, geometry.y + dy)
}

/// Grow towards east/south or shrink from north/west by `step`
///
/// Shrinking stops at the minimum dimension, or one pixel when the minimum
/// is zero (a window already smaller than the minimum is left alone) and the origin follows by the amount actually
/// removed, so the south/east edge stays put. Growing keeps the origin, so the
/// north/west edge stays put.
pub fn resized(geometry: Geometry, direction: Direction, step: u32, min_width: u32, min_height: u32) -> Geometry {
    let mut out = geometry;
    match direction {
        Direction::North => {
            out.height = shrink(geometry.height, step, min_height);
            out.y += geometry.height.saturating_sub(out.height) as i32;
        }
        Direction::West => {
            out.width = shrink(geometry.width, step, min_width);
            out.x += geometry.width.saturating_sub(out.width) as i32;
        }
        Direction::East => out.width = geometry.width.saturating_add(step),
        Direction::South => out.height = geometry.height.saturating_add(step),
    }
    out
}

/// Never below one pixel, the server rejects zero sizes
fn shrink(size: u32, step: u32, min: u32) -> u32 {
    size.saturating_sub(step).max(min.min(size)).max(1)
}

/// One of the eight fixed snap placements for a `(width, height)` screen
///
/// Quarters go clockwise from the top-left corner: north is top-left, east
/// top-right, south bottom-right, west bottom-left.
pub fn snapped(direction: Direction, region: SnapRegion, screen: (u32, u32)) -> Geometry {
    let (sw, sh) = screen;
    let (hw, hh) = (sw / 2, sh / 2);
    let (mx, my) = (hw as i32, hh as i32);

    match (region, direction) {
        (SnapRegion::Half, Direction::North) => Geometry::new(0, 0, sw, hh),
        (SnapRegion::Half, Direction::East) => Geometry::new(mx, 0, hw, sh),
        (SnapRegion::Half, Direction::South) => Geometry::new(0, my, sw, hh),
        (SnapRegion::Half, Direction::West) => Geometry::new(0, 0, hw, sh),
        (SnapRegion::Quarter, Direction::North) => Geometry::new(0, 0, hw, hh),
        (SnapRegion::Quarter, Direction::East) => Geometry::new(mx, 0, hw, hh),
        (SnapRegion::Quarter, Direction::South) => Geometry::new(mx, my, hw, hh),
        (SnapRegion::Quarter, Direction::West) => Geometry::new(0, my, hw, hh),
    }
}

/// Same size, centered on a `(width, height)` screen
pub fn centered(geometry: Geometry, screen: (u32, u32)) -> Geometry {
    let (sw, sh) = screen;
    let x = (sw as i32 - geometry.width as i32) / 2;
    let y = (sh as i32 - geometry.height as i32) / 2;
    geometry.at(x, y)
}

/// Applies geometry operations to the current window
#[derive(Debug, Clone, Copy)]
pub struct GeometryEngine {
    pub move_step: u32,
    pub resize_step: u32,
    pub min_width: u32,
    pub min_height: u32,
}

impl GeometryEngine {
    pub fn new(config: &GeometryConfig) -> Self {
        Self {
            move_step: config.move_step,
            resize_step: config.resize_step,
            min_width: config.min_width,
            min_height: config.min_height,
        }
    }

    /// Current window and its live geometry, unless the operation must no-op
    fn target<D: DisplayConnection + ?Sized>(display: &D, focus: &FocusState) -> Option<(Window, Geometry)> {
        if focus.current_is_invalid() {
            debug!("No valid current window, ignoring geometry action");
            return None;
        }

        let window = focus.current();
        display.geometry(window).map(|geometry| (window, geometry))
    }

    pub fn move_window<D: DisplayConnection + ?Sized>(&self, display: &D, focus: &FocusState, direction: Direction) -> Result<()> {
        let Some((window, geometry)) = Self::target(display, focus) else {
            return Ok(());
        };
        display.move_resize_window(window, moved(geometry, direction, self.move_step))
    }

    pub fn resize_window<D: DisplayConnection + ?Sized>(&self, display: &D, focus: &FocusState, direction: Direction) -> Result<()> {
        let Some((window, geometry)) = Self::target(display, focus) else {
            return Ok(());
        };
        let target = resized(geometry, direction, self.resize_step, self.min_width, self.min_height);
        display.move_resize_window(window, target)
    }

    pub fn snap_window<D: DisplayConnection + ?Sized>(
        &self,
        display: &D,
        focus: &FocusState,
        direction: Direction,
        region: SnapRegion,
    ) -> Result<()> {
        let Some((window, _)) = Self::target(display, focus) else {
            return Ok(());
        };
        display.move_resize_window(window, snapped(direction, region, display.screen_size()))
    }

    pub fn center_window<D: DisplayConnection + ?Sized>(&self, display: &D, focus: &FocusState) -> Result<()> {
        let Some((window, geometry)) = Self::target(display, focus) else {
            return Ok(());
        };
        display.move_resize_window(window, centered(geometry, display.screen_size()))
    }

    /// Enter fullscreen remembering the current geometry, or restore it
    pub fn toggle_fullscreen<D: DisplayConnection + ?Sized>(&self, display: &D, focus: &mut FocusState) -> Result<()> {
        let Some((window, geometry)) = Self::target(display, focus) else {
            return Ok(());
        };

        match focus.leave_fullscreen() {
            Some(saved) => {
                debug!("Window 0x{:x} leaves fullscreen", window);
                display.move_resize_window(window, saved)
            }
            None => {
                debug!("Window 0x{:x} enters fullscreen", window);
                focus.enter_fullscreen(geometry);
                let (sw, sh) = display.screen_size();
                display.move_resize_window(window, Geometry::new(0, 0, sw, sh))
            }
        }
    }

    /// Forcibly terminate the current window's client, then fall back to the sentinel
    pub fn kill_window<D: DisplayConnection + ?Sized>(&self, display: &D, focus: &mut FocusState) -> Result<()> {
        if focus.current_is_invalid() {
            return Ok(());
        }

        let window = focus.current();
        debug!("Killing client of window 0x{:x}", window);
        display.kill_client(window)?;

        focus.reset();
        focus.focus_current(display)
    }
}

impl Default for GeometryEngine {
    fn default() -> Self {
        Self::new(&GeometryConfig::default())
    }
}
