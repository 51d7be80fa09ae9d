//! flowm
//!
//! A minimal floating X11 window manager: focus follows the mouse, windows are
//! moved, resized, snapped and centered from the keyboard, and programs are
//! launched fully detached.

pub mod config;
pub mod shared;
pub mod spawn;
pub mod testing;
pub mod wm;
