use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::{GameError, Result};
use super::round::DEFAULT_ROUND_SECONDS;

pub const MIN_ROUND_SECONDS: u32 = 10;
pub const MAX_ROUND_SECONDS: u32 = 3600;
const DEFAULT_TOP_N: usize = 10;
const RESULTS_FILE: &str = "results.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_round_seconds")]
    pub round_seconds: u32,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub leaderboard_path: Option<PathBuf>,
    #[serde(default)]
    pub last_player: Option<String>,
}

fn default_round_seconds() -> u32 {
    DEFAULT_ROUND_SECONDS
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            round_seconds: DEFAULT_ROUND_SECONDS,
            top_n: DEFAULT_TOP_N,
            leaderboard_path: None,
            last_player: None,
        }
    }
}

impl UserConfig {
    pub fn leaderboard_path(&self) -> PathBuf {
        match &self.leaderboard_path {
            Some(path) => path.clone(),
            None => default_leaderboard_path(),
        }
    }

    pub fn set_round_seconds(&mut self, seconds: u32) -> Result<()> {
        if !(MIN_ROUND_SECONDS..=MAX_ROUND_SECONDS).contains(&seconds) {
            return Err(GameError::Validation(format!(
                "round length must be between {} and {} seconds",
                MIN_ROUND_SECONDS, MAX_ROUND_SECONDS
            )));
        }
        self.round_seconds = seconds;
        Ok(())
    }

    pub fn set_top_n(&mut self, top_n: usize) -> Result<()> {
        if top_n == 0 {
            return Err(GameError::Validation(
                "leaderboard size must be at least 1".to_string(),
            ));
        }
        self.top_n = top_n;
        Ok(())
    }
}

pub fn default_leaderboard_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("sortle").join(RESULTS_FILE),
        None => PathBuf::from(RESULTS_FILE),
    }
}

pub fn get_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("sortle").join("config.json"))
}

pub fn load_config() -> UserConfig {
    match get_config_path() {
        Some(path) => load_config_from(&path),
        None => UserConfig::default(),
    }
}

fn load_config_from(path: &std::path::Path) -> UserConfig {
    if !path.exists() {
        return UserConfig::default();
    }

    match fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!("Ignoring unreadable config {}: {}", path.display(), e);
            UserConfig::default()
        }),
        Err(e) => {
            warn!("Could not read config {}: {}", path.display(), e);
            UserConfig::default()
        }
    }
}

pub fn save_config(config: &UserConfig) -> Result<()> {
    let path = get_config_path().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not determine home directory",
        )
    })?;
    save_config_to(&path, config)
}

fn save_config_to(path: &std::path::Path, config: &UserConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let contents = serde_json::to_string_pretty(config).map_err(std::io::Error::from)?;
    fs::write(path, contents)?;
    Ok(())
}
