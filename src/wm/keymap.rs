//! Keymap Module
//!
//! Cached keycode to keysym table, fetched with GetKeyboardMapping.

use anyhow::{Context, Result};
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ConnectionExt, Keycode, Keysym};

/// NoSymbol
const NO_SYMBOL: Keysym = 0;

/// Keyboard mapping for the whole keycode range of the server
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    min_keycode: Keycode,
    keysyms_per_keycode: u8,
    keysyms: Vec<Keysym>,
}

impl Keymap {
    pub fn new(min_keycode: Keycode, keysyms_per_keycode: u8, keysyms: Vec<Keysym>) -> Self {
        Self {
            min_keycode,
            keysyms_per_keycode,
            keysyms,
        }
    }

    /// Query the server for the current mapping
    pub fn fetch<C: Connection>(conn: &C) -> Result<Self> {
        let setup = conn.setup();
        let min_keycode = setup.min_keycode;
        let count = setup.max_keycode - min_keycode + 1;

        let reply = conn
            .get_keyboard_mapping(min_keycode, count)?
            .reply()
            .context("Failed to fetch keyboard mapping")?;

        debug!(
            "Fetched keyboard mapping: {} keycodes, {} keysyms per keycode",
            count, reply.keysyms_per_keycode
        );

        Ok(Self::new(min_keycode, reply.keysyms_per_keycode, reply.keysyms))
    }

    /// Level-0 keysym of a keycode (no shift level or group resolution)
    pub fn keysym(&self, keycode: Keycode) -> Option<Keysym> {
        let per = self.keysyms_per_keycode as usize;
        if per == 0 || keycode < self.min_keycode {
            return None;
        }

        let index = (keycode - self.min_keycode) as usize * per;
        self.keysyms
            .get(index)
            .copied()
            .filter(|&keysym| keysym != NO_SYMBOL)
    }

    /// First keycode producing `keysym` at any level
    pub fn keycode(&self, keysym: Keysym) -> Option<Keycode> {
        let per = self.keysyms_per_keycode as usize;
        if per == 0 || keysym == NO_SYMBOL {
            return None;
        }

        self.keysyms
            .chunks(per)
            .position(|syms| syms.contains(&keysym))
            .and_then(|offset| Keycode::try_from(offset).ok())
            .and_then(|offset| self.min_keycode.checked_add(offset))
    }
}
