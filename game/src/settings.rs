use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine::{Dimensions, ScoringPolicy};
use serde::{Deserialize, Serialize};

pub const SETTINGS_PATH_ENV: &str = "ULTRAMETRIC_SETTINGS_PATH";

/// Player-facing defaults for a new game. Width and depth stay signed here so
/// a hand-edited file with a negative depth reaches validation instead of
/// failing to parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_width")]
    pub width: i64,
    #[serde(default = "default_depth")]
    pub depth: i64,
    #[serde(default = "default_lock_window_ms")]
    pub lock_window_ms: u32,
    #[serde(default)]
    pub scoring: ScoringPolicy,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            width: default_width(),
            depth: default_depth(),
            lock_window_ms: default_lock_window_ms(),
            scoring: ScoringPolicy::default(),
            seed: None,
        }
    }
}

impl GameSettings {
    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        self
    }

    pub fn dimensions(&self) -> engine::Result<Dimensions> {
        Dimensions::from_signed(self.width, self.depth)
    }

    pub fn lock_window(&self) -> Duration {
        Duration::from_millis(u64::from(self.lock_window_ms))
    }
}

fn default_version() -> u32 {
    1
}

fn default_width() -> i64 {
    5
}

fn default_depth() -> i64 {
    10
}

fn default_lock_window_ms() -> u32 {
    1050
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var_os(key))
    }

    pub fn from_env_with<F>(mut get_env: F) -> Self
    where
        F: FnMut(&str) -> Option<OsString>,
    {
        if let Some(explicit) = get_env(SETTINGS_PATH_ENV) {
            return Self::at(explicit);
        }

        let base = get_env("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                get_env("HOME").map(|home| {
                    let mut p = PathBuf::from(home);
                    p.push(".config");
                    p
                })
            })
            .unwrap_or_else(|| PathBuf::from("."));

        let mut path = base;
        path.push("ultrametric");
        path.push("settings.json");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> GameSettings {
        let Ok(bytes) = fs::read(&self.path) else {
            return GameSettings::default();
        };
        serde_json::from_slice::<GameSettings>(&bytes)
            .map(GameSettings::sanitized)
            .unwrap_or_else(|err| {
                tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable settings");
                GameSettings::default()
            })
    }

    pub fn save(&self, settings: &GameSettings) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(settings)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, text)
    }
}
