//! Configuration system for flowm
//!
//! Loads configuration from TOML file at `~/.config/flowm/config.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use x11_dl::keysym;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub commands: CommandsConfig,
    pub geometry: GeometryConfig,
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            if let Err(e) = Self::save_default(config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        info!("Configuration loaded from {:?}", config_path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("flowm");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string)
            .context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Programs launched by the spawn bindings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Launched with Mod4+Return
    pub terminal: String,
    /// Launched with Mod4+d
    pub menu: String,
    /// Launched with Mod4+b
    pub browser: String,
    /// Launched with Mod4+p
    pub screenshot: String,
    /// Extra key bindings that each run a command
    pub launch: Vec<LaunchConfig>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        let media = |sym, command: &str| LaunchConfig {
            modifiers: Vec::new(),
            keysym: sym,
            command: command.to_string(),
        };

        Self {
            terminal: "xterm".to_string(),
            menu: "dmn".to_string(),
            browser: "chromium".to_string(),
            screenshot: "scr".to_string(),
            launch: vec![
                media(keysym::XF86XK_AudioMute, "pamixer -t"),
                media(keysym::XF86XK_AudioLowerVolume, "pamixer -d 5"),
                media(keysym::XF86XK_AudioRaiseVolume, "pamixer -i 5"),
                media(keysym::XF86XK_MonBrightnessDown, "xbacklight -dec 5"),
                media(keysym::XF86XK_MonBrightnessUp, "xbacklight -inc 5"),
            ],
        }
    }
}

/// A `[[commands.launch]]` entry
///
/// ```toml
/// [[commands.launch]]
/// modifiers = ["Mod4", "Shift"]
/// keysym = 0x77        # XK_w
/// command = "firefox"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Modifier names: Shift, Lock, Control, Mod1 .. Mod5. Empty means none.
    #[serde(default)]
    pub modifiers: Vec<String>,
    pub keysym: u32,
    pub command: String,
}

/// Step sizes and size limits used by the geometry engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Pixels moved per move binding
    pub move_step: u32,
    /// Pixels grown or shrunk per resize binding
    pub resize_step: u32,
    /// Resizing never shrinks a window below this width
    pub min_width: u32,
    /// Resizing never shrinks a window below this height
    pub min_height: u32,
    /// Size given to windows that map with a zero dimension
    pub default_width: u32,
    pub default_height: u32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            move_step: 50,
            resize_step: 50,
            min_width: 100,
            min_height: 100,
            default_width: 800,
            default_height: 600,
        }
    }
}
