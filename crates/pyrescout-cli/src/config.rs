//! Configuration Vault – reads/writes `~/.pyrescout/config.toml`.

use pyrescout_runtime::SearchConfig;
use pyrescout_types::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persisted operator configuration stored in `~/.pyrescout/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Names of the agents registered with the fleet provider.
    #[serde(default = "default_agents")]
    pub agents: Vec<String>,

    /// Root directory for the evidence collections.
    #[serde(default = "default_evidence_root")]
    pub evidence_root: String,

    /// Transit speed for operator-directed `goto` commands, in m/s.
    #[serde(default = "default_goto_speed")]
    pub goto_speed: f32,

    /// Search-mission parameters (bounds, speed, threshold, failure budget).
    #[serde(default)]
    pub search: SearchConfig,

    /// Where the simulated hotspot sits in the search volume.
    #[serde(default = "default_fire_position")]
    pub sim_fire_position: Vec3,

    /// Radius around the hotspot within which a capture scores positive.
    #[serde(default = "default_fire_radius")]
    pub sim_fire_radius: f32,
}

fn default_agents() -> Vec<String> {
    vec![
        "Scout0".to_string(),
        "Scout1".to_string(),
        "Scout2".to_string(),
    ]
}
fn default_evidence_root() -> String {
    "./evidence".to_string()
}
fn default_goto_speed() -> f32 {
    5.0
}
fn default_fire_position() -> Vec3 {
    Vec3::new(0.0, -55.0, -7.0)
}
fn default_fire_radius() -> f32 {
    25.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agents: default_agents(),
            evidence_root: default_evidence_root(),
            goto_speed: default_goto_speed(),
            search: SearchConfig::default(),
            sim_fire_position: default_fire_position(),
            sim_fire_radius: default_fire_radius(),
        }
    }
}

/// Return the path to `~/.pyrescout/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".pyrescout").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `PYRESCOUT_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `PYRESCOUT_AGENTS` | `agents` (comma-separated) |
/// | `PYRESCOUT_EVIDENCE_ROOT` | `evidence_root` |
/// | `PYRESCOUT_CONFIDENCE_THRESHOLD` | `search.confidence_threshold` |
/// | `PYRESCOUT_TRANSIT_SPEED` | `search.transit_speed` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("PYRESCOUT_AGENTS") {
        let agents: Vec<String> = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if !agents.is_empty() {
            cfg.agents = agents;
        }
    }
    if let Ok(v) = std::env::var("PYRESCOUT_EVIDENCE_ROOT") {
        cfg.evidence_root = v;
    }
    if let Ok(v) = std::env::var("PYRESCOUT_CONFIDENCE_THRESHOLD")
        && let Ok(t) = v.parse::<f32>()
    {
        cfg.search.confidence_threshold = t;
    }
    if let Ok(v) = std::env::var("PYRESCOUT_TRANSIT_SPEED")
        && let Ok(s) = v.parse::<f32>()
    {
        cfg.search.transit_speed = s;
    }
}

/// Save the config to disk, creating `~/.pyrescout/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}
