//! App configuration: `~/.config/focus_clock/config.json`, written with
//! defaults on first run. Unreadable or invalid files fall back to
//! defaults with a warning; out-of-range durations do the same.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::timer::registry::{
    DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES, DurationRegistry, Phase,
};

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8790";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_work_minutes() -> u32 {
    DEFAULT_WORK_MINUTES
}

fn default_break_minutes() -> u32 {
    DEFAULT_BREAK_MINUTES
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            listen_addr: default_listen_addr(),
        }
    }
}

impl Config {
    /// Clamp out-of-range durations back to defaults, warning on each.
    fn sanitize(mut self) -> Self {
        if DurationRegistry::check_range(Phase::Work, self.work_minutes as i64).is_err() {
            eprintln!(
                "Warning: work_minutes {} out of range, using {}",
                self.work_minutes, DEFAULT_WORK_MINUTES
            );
            self.work_minutes = DEFAULT_WORK_MINUTES;
        }
        if DurationRegistry::check_range(Phase::Break, self.break_minutes as i64).is_err() {
            eprintln!(
                "Warning: break_minutes {} out of range, using {}",
                self.break_minutes, DEFAULT_BREAK_MINUTES
            );
            self.break_minutes = DEFAULT_BREAK_MINUTES;
        }
        self
    }
}

pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config/focus_clock/config.json")
}

/// Load the config file, writing a default one on first run.
pub fn load_config() -> Config {
    let path = config_path();

    if path.exists() {
        let content = fs::read_to_string(&path).unwrap_or_else(|_| {
            eprintln!("Warning: could not read config file, using defaults");
            String::new()
        });
        let config: Config = serde_json::from_str(&content).unwrap_or_else(|_| {
            eprintln!("Warning: invalid config format, using defaults");
            Config::default()
        });
        config.sanitize()
    } else {
        let config = Config::default();
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(&config) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    eprintln!("Warning: could not write default config: {}", e);
                }
            }
            Err(e) => eprintln!("Warning: could not serialize default config: {}", e),
        }
        config
    }
}
