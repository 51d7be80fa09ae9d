//! Keyboard Module
//!
//! Static key binding table, key/button grabs on the root window, and
//! resolution of key presses to actions.

use anyhow::{bail, Result};
use tracing::{debug, info, warn};
use x11_dl::keysym;
use x11rb::protocol::xproto::{ButtonIndex, Keysym, ModMask};

use crate::config::{CommandsConfig, LaunchConfig};
use crate::wm::display::{CirculateDirection, DisplayConnection};
use crate::wm::moveresize::{Direction, SnapRegion};

/// Something a key binding does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardAction {
    /// Run a shell command, detached
    Spawn(String),
    Move(Direction),
    Resize(Direction),
    Snap(Direction, SnapRegion),
    Center,
    ToggleFullscreen,
    /// Kill the current window's client
    Kill,
    Circulate(CirculateDirection),
    Quit,
}

/// Key binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    /// Modifier mask, compared verbatim against the event state
    pub modifiers: u16,
    pub keysym: Keysym,
    pub action: KeyboardAction,
}

impl KeyBinding {
    pub fn new(modifiers: u16, keysym: Keysym, action: KeyboardAction) -> Self {
        Self {
            modifiers,
            keysym,
            action,
        }
    }
}

/// Modifier for every default binding and the click grab (Super)
pub fn mod_key() -> u16 {
    u16::from(ModMask::M4)
}

/// Mask for a list of modifier names, e.g. `["Mod4", "Shift"]`
pub fn modifier_mask<S: AsRef<str>>(names: &[S]) -> Result<u16> {
    let mut mask = 0;
    for name in names {
        let bit = match name.as_ref().to_ascii_lowercase().as_str() {
            "shift" => ModMask::SHIFT,
            "lock" => ModMask::LOCK,
            "control" | "ctrl" => ModMask::CONTROL,
            "mod1" | "alt" => ModMask::M1,
            "mod2" => ModMask::M2,
            "mod3" => ModMask::M3,
            "mod4" | "super" => ModMask::M4,
            "mod5" => ModMask::M5,
            other => bail!("Unknown modifier {:?}", other),
        };
        mask |= u16::from(bit);
    }
    Ok(mask)
}

fn launch_binding(entry: &LaunchConfig) -> Option<KeyBinding> {
    match modifier_mask(&entry.modifiers) {
        Ok(modifiers) => Some(KeyBinding::new(
            modifiers,
            entry.keysym,
            KeyboardAction::Spawn(entry.command.clone()),
        )),
        Err(e) => {
            warn!("Skipping launch binding for {:?}: {}", entry.command, e);
            None
        }
    }
}

/// The built-in binding table followed by the configured launch bindings
pub fn default_bindings(commands: &CommandsConfig) -> Vec<KeyBinding> {
    let m = mod_key();
    let shift = u16::from(ModMask::SHIFT);
    let ctrl = u16::from(ModMask::CONTROL);

    let arrows = [
        (keysym::XK_Up, Direction::North),
        (keysym::XK_Right, Direction::East),
        (keysym::XK_Down, Direction::South),
        (keysym::XK_Left, Direction::West),
    ];

    let mut bindings = vec![
        KeyBinding::new(m, keysym::XK_Return, KeyboardAction::Spawn(commands.terminal.clone())),
        KeyBinding::new(m, keysym::XK_d, KeyboardAction::Spawn(commands.menu.clone())),
        KeyBinding::new(m, keysym::XK_b, KeyboardAction::Spawn(commands.browser.clone())),
        KeyBinding::new(m, keysym::XK_p, KeyboardAction::Spawn(commands.screenshot.clone())),
    ];

    for (sym, direction) in arrows {
        bindings.push(KeyBinding::new(m, sym, KeyboardAction::Move(direction)));
        bindings.push(KeyBinding::new(m | shift, sym, KeyboardAction::Resize(direction)));
        bindings.push(KeyBinding::new(m | ctrl, sym, KeyboardAction::Snap(direction, SnapRegion::Half)));
        bindings.push(KeyBinding::new(
            m | ctrl | shift,
            sym,
            KeyboardAction::Snap(direction, SnapRegion::Quarter),
        ));
    }

    bindings.extend([
        KeyBinding::new(m, keysym::XK_c, KeyboardAction::Center),
        KeyBinding::new(m, keysym::XK_f, KeyboardAction::ToggleFullscreen),
        KeyBinding::new(m | shift, keysym::XK_q, KeyboardAction::Kill),
        KeyBinding::new(m, keysym::XK_Tab, KeyboardAction::Circulate(CirculateDirection::Next)),
        KeyBinding::new(m | shift, keysym::XK_Tab, KeyboardAction::Circulate(CirculateDirection::Prev)),
        KeyBinding::new(m | shift, keysym::XK_e, KeyboardAction::Quit),
    ]);
    bindings.extend(commands.launch.iter().filter_map(launch_binding));

    bindings
}

/// Ordered binding registry
#[derive(Debug, Clone, Default)]
pub struct KeyboardManager {
    bindings: Vec<KeyBinding>,
}

impl KeyboardManager {
    pub fn new(bindings: Vec<KeyBinding>) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &[KeyBinding] {
        &self.bindings
    }

    /// Drop every grab on the root, then grab each binding plus the click button
    pub fn grab<D: DisplayConnection + ?Sized>(&self, display: &D) -> Result<()> {
        display.ungrab_all()?;

        for binding in &self.bindings {
            display.grab_key(binding.keysym, binding.modifiers)?;
        }
        display.grab_button(ButtonIndex::M1, mod_key())?;

        info!("Grabbed {} key bindings and the focus button", self.bindings.len());
        Ok(())
    }

    /// First binding whose keysym and modifiers both match exactly
    ///
    /// Lock modifiers are not masked out, so Caps Lock or Num Lock being on
    /// keeps every binding from firing.
    pub fn resolve(&self, keysym: Keysym, state: u16) -> Option<&KeyboardAction> {
        let found = self
            .bindings
            .iter()
            .find(|binding| binding.keysym == keysym && binding.modifiers == state)
            .map(|binding| &binding.action);

        debug!("Key 0x{:x} state 0x{:x} -> {:?}", keysym, state, found);
        found
    }
}
