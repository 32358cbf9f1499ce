/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tuning: Tuning,
    pub display: DisplayConfig,
    pub gamepad: GamepadConfig,
    /// Fixed RNG seed; entropy when absent.
    pub seed: Option<u64>,
}

/// Gameplay numbers the engine runs on.
#[derive(Clone, Debug, PartialEq)]
pub struct Tuning {
    pub player_speed: f32,
    pub shoot_cooldown_ms: f64,
    pub points_per_reward: u32,
    pub points_to_level_up: u32,
    pub max_level: u32,
    pub hazard_base_ms: f64,
    pub hazard_step_ms: f64,
    pub obstacle_base_ms: f64,
    pub obstacle_step_ms: f64,
    pub min_interval_ms: f64,
}

impl Tuning {
    pub fn hazard_interval(&self, level: u32) -> f64 {
        (self.hazard_base_ms - level as f64 * self.hazard_step_ms).max(self.min_interval_ms)
    }

    pub fn obstacle_interval(&self, level: u32) -> f64 {
        (self.obstacle_base_ms - level as f64 * self.obstacle_step_ms).max(self.min_interval_ms)
    }
}

impl Default for Tuning {
    fn default() -> Self {
        TomlConfig::default().tuning()
    }
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub frame_ms: u64,
    /// World units covered by one terminal cell.
    pub cell_width: f32,
    pub cell_height: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub fire: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    gameplay: TomlGameplay,
    #[serde(default)]
    spawn: TomlSpawn,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlGameplay {
    #[serde(default = "default_player_speed")]
    player_speed: f32,
    #[serde(default = "default_cooldown")]
    shoot_cooldown_ms: u64,
    #[serde(default = "default_points_per_reward")]
    points_per_reward: u32,
    #[serde(default = "default_points_to_level_up")]
    points_to_level_up: u32,
    #[serde(default = "default_max_level")]
    max_level: u32,
}

#[derive(Deserialize, Debug)]
struct TomlSpawn {
    #[serde(default = "default_hazard_base")]
    hazard_base_ms: u64,
    #[serde(default = "default_hazard_step")]
    hazard_step_ms: u64,
    #[serde(default = "default_obstacle_base")]
    obstacle_base_ms: u64,
    #[serde(default = "default_obstacle_step")]
    obstacle_step_ms: u64,
    #[serde(default = "default_min_interval")]
    min_interval_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_cell_width")]
    cell_width: f32,
    #[serde(default = "default_cell_height")]
    cell_height: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_fire")]
    fire: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    seed: Option<u64>,
}

// ── Defaults ──

fn default_player_speed() -> f32 { 0.3 }
fn default_cooldown() -> u64 { 300 }
fn default_points_per_reward() -> u32 { 1 }
fn default_points_to_level_up() -> u32 { 10 }
fn default_max_level() -> u32 { 10 }

fn default_hazard_base() -> u64 { 2000 }
fn default_hazard_step() -> u64 { 100 }
fn default_obstacle_base() -> u64 { 3000 }
fn default_obstacle_step() -> u64 { 150 }
fn default_min_interval() -> u64 { 250 }

fn default_frame_ms() -> u64 { 16 }
fn default_cell_width() -> f32 { 10.0 }
fn default_cell_height() -> f32 { 20.0 }

fn default_fire() -> Vec<String> { vec!["A".into(), "X".into(), "R1".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlGameplay {
    fn default() -> Self {
        TomlGameplay {
            player_speed: default_player_speed(),
            shoot_cooldown_ms: default_cooldown(),
            points_per_reward: default_points_per_reward(),
            points_to_level_up: default_points_to_level_up(),
            max_level: default_max_level(),
        }
    }
}

impl Default for TomlSpawn {
    fn default() -> Self {
        TomlSpawn {
            hazard_base_ms: default_hazard_base(),
            hazard_step_ms: default_hazard_step(),
            obstacle_base_ms: default_obstacle_base(),
            obstacle_step_ms: default_obstacle_step(),
            min_interval_ms: default_min_interval(),
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay {
            frame_ms: default_frame_ms(),
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            fire: default_fire(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl TomlConfig {
    fn tuning(&self) -> Tuning {
        let g = &self.gameplay;
        let s = &self.spawn;
        Tuning {
            player_speed: g.player_speed.max(0.0),
            shoot_cooldown_ms: g.shoot_cooldown_ms as f64,
            points_per_reward: g.points_per_reward,
            points_to_level_up: g.points_to_level_up.max(1),
            max_level: g.max_level.max(1),
            hazard_base_ms: s.hazard_base_ms as f64,
            hazard_step_ms: s.hazard_step_ms as f64,
            obstacle_base_ms: s.obstacle_base_ms as f64,
            obstacle_step_ms: s.obstacle_step_ms as f64,
            // Zero would spawn every frame.
            min_interval_ms: s.min_interval_ms.max(1) as f64,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        for dir in candidate_dirs() {
            let path = dir.join("config.toml");
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(text) => match Self::parse(&text) {
                    Ok(cfg) => {
                        log::info!("loaded {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        log::warn!("config.toml parse error: {e}; using default settings");
                        return Self::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
        Self::default()
    }

    /// Parse a config document; missing keys take defaults.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(Self::from_toml)
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        let mut display = DisplayConfig {
            frame_ms: cfg.display.frame_ms.max(1),
            cell_width: cfg.display.cell_width,
            cell_height: cfg.display.cell_height,
        };
        if display.cell_width <= 0.0 || display.cell_height <= 0.0 {
            log::warn!(
                "invalid cell size {}x{}, using defaults",
                display.cell_width, display.cell_height
            );
            display.cell_width = default_cell_width();
            display.cell_height = default_cell_height();
        }

        GameConfig {
            tuning: cfg.tuning(),
            display,
            gamepad: GamepadConfig {
                fire: cfg.gamepad.fire,
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
            },
            seed: cfg.general.seed,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default())
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        let t = &cfg.tuning;
        assert_eq!(t.player_speed, 0.3);
        assert_eq!(t.shoot_cooldown_ms, 300.0);
        assert_eq!(t.points_to_level_up, 10);
        assert_eq!(t.max_level, 10);
        assert_eq!(cfg.display.frame_ms, 16);
        assert_eq!(cfg.gamepad.fire, vec!["A", "X", "R1"]);
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse(
            "[gameplay]\nmax_level = 3\n[general]\nseed = 42\n",
        )
        .unwrap();
        assert_eq!(cfg.tuning.max_level, 3);
        assert_eq!(cfg.tuning.points_per_reward, 1);
        assert_eq!(cfg.tuning.hazard_base_ms, 2000.0);
        assert_eq!(cfg.seed, Some(42));
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(GameConfig::parse("[gameplay\nmax_level = ").is_err());
        assert!(GameConfig::parse("[gameplay]\nmax_level = \"ten\"").is_err());
    }

    #[test]
    fn intervals_shrink_with_level_down_to_floor() {
        let t = Tuning::default();
        assert_eq!(t.hazard_interval(1), 1900.0);
        assert_eq!(t.obstacle_interval(1), 2850.0);
        assert_eq!(t.hazard_interval(10), 1000.0);
        assert_eq!(t.hazard_interval(30), 250.0);
        assert_eq!(t.obstacle_interval(30), 250.0);
    }

    #[test]
    fn zero_min_interval_is_raised() {
        let cfg = GameConfig::parse("[spawn]\nmin_interval_ms = 0\nhazard_base_ms = 0").unwrap();
        assert!(cfg.tuning.hazard_interval(5) > 0.0);
    }

    #[test]
    fn bad_cell_size_falls_back() {
        let cfg = GameConfig::parse("[display]\ncell_width = 0.0").unwrap();
        assert_eq!(cfg.display.cell_width, 10.0);
        assert_eq!(cfg.display.cell_height, 20.0);
    }
}
