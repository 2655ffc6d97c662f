//! Configuration file management
//!
//! Loads TOML configuration files and provides loop settings.
//! Default config path: ~/.config/jamloop/config.toml

use log::{info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_DISPLAY_HEIGHT, DEFAULT_DISPLAY_WIDTH, DEFAULT_ESCAPE_FLUSH_POLLS,
    DEFAULT_IDLE_SLEEP_MS, DEFAULT_REFRESH_HZ, DEFAULT_SEAT,
};
use crate::dispatch::TickScheduler;
use crate::error::{Error, Result};

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Display geometry
    pub display: DisplayConfig,
    /// Tick and loop timing
    pub timing: TimingConfig,
    /// Input backend and devices
    pub input: InputConfig,
}

/// Display geometry
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Width in pixels (pointer clamp bound)
    pub width: u32,
    /// Height in pixels (pointer clamp bound)
    pub height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_DISPLAY_WIDTH,
            height: DEFAULT_DISPLAY_HEIGHT,
        }
    }
}

/// Tick and loop timing
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Update ticks per second (default: 60)
    pub refresh_hz: f64,
    /// Sleep between polling iterations in milliseconds (default: 2)
    pub idle_sleep_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            refresh_hz: DEFAULT_REFRESH_HZ,
            idle_sleep_ms: DEFAULT_IDLE_SLEEP_MS,
        }
    }
}

/// Which input backend drives the loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Poll TTY, pointer and gamepad directly
    #[default]
    Polling,
    /// Let a host event loop call back
    Queued,
}

/// Input settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// "polling" (default) or "queued"
    pub backend: BackendKind,
    /// Open a pointer through libinput
    pub pointer: bool,
    /// Open gamepads through gilrs
    pub gamepad: bool,
    /// libinput seat name
    pub seat: String,
    /// Quiet polls before a lone ESC is delivered (default: 3)
    pub escape_flush_polls: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Polling,
            pointer: true,
            gamepad: true,
            seat: DEFAULT_SEAT.to_string(),
            escape_flush_polls: DEFAULT_ESCAPE_FLUSH_POLLS,
        }
    }
}

impl Config {
    /// System-wide config path
    const SYSTEM_CONFIG_PATH: &'static str = "/etc/jamloop/config.toml";

    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. JAMLOOP_CONFIG environment variable
        if let Ok(path) = std::env::var("JAMLOOP_CONFIG") {
            let p = Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        // 2. User config: ~/.config/jamloop/config.toml
        if let Some(path) = default_config_path() {
            if path.exists() {
                return Some(path);
            }
        }

        // 3. System config: /etc/jamloop/config.toml
        let system_config = Path::new(Self::SYSTEM_CONFIG_PATH);
        if system_config.exists() {
            return Some(system_config.to_path_buf());
        }

        None
    }

    /// Load configuration with priority:
    /// 1. JAMLOOP_CONFIG environment variable
    /// 2. ~/.config/jamloop/config.toml (user config)
    /// 3. /etc/jamloop/config.toml (system config)
    /// 4. Built-in defaults
    ///
    /// A broken file is reported and skipped.
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load and validate settings from `path`
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse and validate TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.timing.refresh_hz.is_finite() && self.timing.refresh_hz > 0.0) {
            return Err(Error::Config(format!(
                "timing.refresh_hz must be positive, got {}",
                self.timing.refresh_hz
            )));
        }
        if Duration::try_from_secs_f64(1.0 / self.timing.refresh_hz).is_err() {
            return Err(Error::Config(format!(
                "timing.refresh_hz {} is too small for a tick interval",
                self.timing.refresh_hz
            )));
        }
        if self.display.width == 0 || self.display.height == 0 {
            return Err(Error::Config(format!(
                "display size must be non-zero, got {}x{}",
                self.display.width, self.display.height
            )));
        }
        Ok(())
    }

    /// Interval between update ticks
    pub fn tick_interval(&self) -> Duration {
        TickScheduler::interval_for(self.timing.refresh_hz)
    }

    /// Sleep between polling iterations
    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.timing.idle_sleep_ms)
    }

    /// Commented template carrying the built-in defaults
    pub fn default_template() -> String {
        let d = Self::default();
        format!(
            r#"# jamloop configuration
# Priority: $JAMLOOP_CONFIG > ~/.config/jamloop/config.toml > /etc/jamloop/config.toml

[display]
# Pointer coordinates are clamped to this area; the cursor starts centred
width = {width}
height = {height}

[timing]
# Update ticks per second. A stall never produces catch-up ticks.
refresh_hz = {refresh_hz:.1}
# Sleep between polling iterations (ms); bounds CPU use only
idle_sleep_ms = {idle_sleep_ms}

[input]
# "polling": read the TTY, libinput pointer and gamepads directly
# "queued":  let a host event loop deliver events (desktop simulation)
backend = "polling"
pointer = {pointer}
gamepad = {gamepad}
seat = "{seat}"
# Quiet polls before a lone ESC press is delivered
escape_flush_polls = {escape_flush_polls}
"#,
            width = d.display.width,
            height = d.display.height,
            refresh_hz = d.timing.refresh_hz,
            idle_sleep_ms = d.timing.idle_sleep_ms,
            pointer = d.input.pointer,
            gamepad = d.input.gamepad,
            seat = d.input.seat,
            escape_flush_polls = d.input.escape_flush_polls,
        )
    }

    /// Write the default template to the user config path
    ///
    /// Refuses to overwrite an existing file.
    pub fn write_default() -> Result<PathBuf> {
        let path = default_config_path()
            .ok_or_else(|| Error::Config("Config directory not found".into()))?;
        Self::write_template(&path)?;
        Ok(path)
    }

    /// Write the default template to `path`
    pub fn write_template(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(Error::Config(format!("{} already exists", path.display())));
        }
        let write = |e: std::io::Error| Error::Config(format!("{}: {}", path.display(), e));
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(write)?;
        }
        std::fs::write(path, Self::default_template()).map_err(write)?;
        info!("Wrote default config: {}", path.display());
        Ok(())
    }
}

/// Get default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("jamloop").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses_to_defaults() {
        let parsed = Config::parse(&Config::default_template()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse(
            r#"
[timing]
refresh_hz = 30.0

[input]
backend = "queued"
gamepad = false
"#,
        )
        .unwrap();
        assert_eq!(config.timing.refresh_hz, 30.0);
        assert_eq!(config.timing.idle_sleep_ms, DEFAULT_IDLE_SLEEP_MS);
        assert_eq!(config.input.backend, BackendKind::Queued);
        assert!(!config.input.gamepad);
        assert!(config.input.pointer);
        assert_eq!(config.display, DisplayConfig::default());
    }

    #[test]
    fn test_rejects_bad_refresh_rate() {
        for hz in ["0.0", "-5.0", "1e-300"] {
            let text = format!("[timing]\nrefresh_hz = {}\n", hz);
            assert!(matches!(Config::parse(&text), Err(Error::Config(_))));
        }
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let text = "[input]\nbackend = \"threaded\"\n";
        assert!(matches!(Config::parse(text), Err(Error::Config(_))));
    }

    #[test]
    fn test_tick_interval() {
        let mut config = Config::default();
        config.timing.refresh_hz = 50.0;
        assert_eq!(config.tick_interval(), Duration::from_millis(20));
    }

    #[test]
    fn test_write_template_refuses_overwrite() {
        let dir = std::env::temp_dir().join(format!("jamloop-config-{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");
        let _ = std::fs::remove_dir_all(&dir);

        Config::write_template(&path).unwrap();
        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded, Config::default());
        assert!(Config::write_template(&path).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
