// Configuration module for reading Tron.toml
// Every tunable the engine uses lives here so behaviour has a single source of truth

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub grid: GridConfig,
    pub scores: ScoresConfig,
    pub strategy: StrategyConfig,
    pub debug: DebugConfig,
    pub profiling: ProfilingConfig,
}

/// Board geometry and coordinate domain
#[derive(Debug, Deserialize, Clone)]
pub struct GridConfig {
    pub width: i32,
    pub height: i32,
    /// Coordinate value marking an absent or dead agent in a state update
    pub absent_sentinel: i32,
}

impl GridConfig {
    /// Total number of cells on the torus
    pub fn cell_count(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    /// Rejects empty grids and sentinels that collide with a real coordinate
    pub fn validate(&self) -> Result<(), String> {
        if self.width <= 0 || self.height <= 0 {
            return Err(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            ));
        }
        let sentinel = self.absent_sentinel;
        if (0..self.width).contains(&sentinel) || (0..self.height).contains(&sentinel) {
            return Err(format!(
                "absent_sentinel {} is a valid coordinate on a {}x{} grid",
                sentinel, self.width, self.height
            ));
        }
        Ok(())
    }
}

/// Move evaluation weights
#[derive(Debug, Deserialize, Clone)]
pub struct ScoresConfig {
    // Territory (flood fill) term, dominant
    pub territory_weight: f32,

    // Separation from the nearest living opponent
    pub separation_weight: f32,

    // Direction memory
    pub continuity_bonus: i32,
    pub reversal_penalty: i32,

    // Opponent trajectory anticipation
    pub prediction_penalty: i32,
    pub prediction_radius: i32,

    // Rejection and fallback thresholds
    pub hard_reject_score: i32,
    pub desperation_threshold: i32,
}

/// Primary move-selection technique
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryStrategy {
    /// One-step flood-fill evaluation of the four moves
    Territory,
    /// A* toward a ranked goal cell, territory evaluation as fallback
    GoalSeeking,
}

/// Strategy selection constants
#[derive(Debug, Deserialize, Clone)]
pub struct StrategyConfig {
    pub primary: PrimaryStrategy,
    pub goal_candidates: usize,
    pub goal_distance_weight: f32,
}

/// Debug session log configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

/// Performance profiling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProfilingConfig {
    pub enabled: bool,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Tron.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration text in Tron.toml format
    pub fn from_toml_str(contents: &str) -> Result<Self, String> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;
        config.grid.validate()?;
        Ok(config)
    }

    /// Loads default configuration from Tron.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Tron.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Tron.toml
    pub fn default_hardcoded() -> Self {
        Config {
            grid: GridConfig {
                width: 64,
                height: 64,
                absent_sentinel: 255,
            },
            scores: ScoresConfig {
                territory_weight: 10.0,
                separation_weight: 1.0,
                continuity_bonus: 5,
                reversal_penalty: -2_000_000,
                prediction_penalty: -2_000,
                prediction_radius: 1,
                hard_reject_score: -1_000_000,
                desperation_threshold: -100_000,
            },
            strategy: StrategyConfig {
                primary: PrimaryStrategy::Territory,
                goal_candidates: 32,
                goal_distance_weight: 0.5,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "tron_debug.jsonl".to_string(),
            },
            profiling: ProfilingConfig { enabled: false },
        }
    }

    /// Hardcoded defaults on a smaller square grid, used by tests and tools
    pub fn with_grid_size(width: i32, height: i32) -> Self {
        let mut config = Self::default_hardcoded();
        config.grid.width = width;
        config.grid.height = height;
        config
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Tron.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}
