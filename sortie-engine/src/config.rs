//! Operator-tunable generation parameters.
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Inclusive `u8` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u8,
    pub max: u8,
}

/// Inclusive `f64` range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ConfigError::Range {
                field,
                reason: format!("min {} must not exceed max {}", self.min, self.max),
            });
        }
        Ok(())
    }
}

/// Per-army floor of ground presence; procedural padding tops up to these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaddingConfig {
    #[serde(default)]
    pub land_units_per_army: u32,
    #[serde(default)]
    pub ships_per_army: u32,
    #[serde(default)]
    pub statics_per_army: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "GenerationConfig::default_additional_air")]
    pub additional_air_operations: u32,
    #[serde(default = "GenerationConfig::default_additional_ground")]
    pub additional_ground_operations: u32,
    #[serde(default = "GenerationConfig::default_multiplier")]
    pub flight_count_multiplier: f64,
    #[serde(default = "GenerationConfig::default_multiplier")]
    pub flight_size_multiplier: f64,
    #[serde(default = "GenerationConfig::default_armor_count")]
    pub armor_count_range: CountRange,
    /// Ships per column formation, the base ship included.
    #[serde(default = "GenerationConfig::default_ship_column")]
    pub ship_column_count: u8,
    /// Allow ground and static targets to be reused by several missions.
    #[serde(default)]
    pub multi_assignment: bool,
    #[serde(default = "GenerationConfig::default_escort_chance")]
    pub escort_chance: f64,
    #[serde(default = "GenerationConfig::default_defensive_chance")]
    pub defensive_response_chance: f64,
    /// Log every runway jam at debug level.
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "GenerationConfig::default_poll_interval")]
    pub path_poll_interval_ms: u64,
    #[serde(default = "GenerationConfig::default_path_timeout")]
    pub path_timeout_ms: u64,
    /// Search radius around a front marker for ground destinations.
    #[serde(default = "GenerationConfig::default_front_radius")]
    pub front_marker_radius: f64,
    #[serde(default)]
    pub padding: PaddingConfig,
    #[serde(default = "GenerationConfig::default_time_range")]
    pub time_range: ValueRange,
    #[serde(default = "GenerationConfig::default_weather_range")]
    pub weather_range: CountRange,
    #[serde(default = "GenerationConfig::default_cloud_range")]
    pub cloud_height_range: ValueRange,
}

impl GenerationConfig {
    const fn default_additional_air() -> u32 {
        6
    }

    const fn default_additional_ground() -> u32 {
        4
    }

    const fn default_multiplier() -> f64 {
        1.0
    }

    const fn default_armor_count() -> CountRange {
        CountRange { min: 3, max: 8 }
    }

    const fn default_ship_column() -> u8 {
        3
    }

    const fn default_escort_chance() -> f64 {
        0.5
    }

    const fn default_defensive_chance() -> f64 {
        0.4
    }

    const fn default_poll_interval() -> u64 {
        10
    }

    const fn default_path_timeout() -> u64 {
        5_000
    }

    const fn default_front_radius() -> f64 {
        5_000.0
    }

    const fn default_time_range() -> ValueRange {
        ValueRange {
            min: 6.0,
            max: 18.0,
        }
    }

    const fn default_weather_range() -> CountRange {
        CountRange { min: 0, max: 2 }
    }

    const fn default_cloud_range() -> ValueRange {
        ValueRange {
            min: 500.0,
            max: 2_500.0,
        }
    }

    /// Load and validate configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed JSON or a range error from [`Self::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Range`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("flight_count_multiplier", self.flight_count_multiplier),
            ("flight_size_multiplier", self.flight_size_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Range {
                    field,
                    reason: format!("must be positive (got {value})"),
                });
            }
        }
        for (field, value) in [
            ("escort_chance", self.escort_chance),
            ("defensive_response_chance", self.defensive_response_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Range {
                    field,
                    reason: format!("must be within 0..=1 (got {value})"),
                });
            }
        }
        let armor = self.armor_count_range;
        if armor.min == 0 || armor.min > armor.max {
            return Err(ConfigError::Range {
                field: "armor_count_range",
                reason: format!(
                    "expected 1 <= min <= max (got {}..={})",
                    self.armor_count_range.min, self.armor_count_range.max
                ),
            });
        }
        if self.ship_column_count == 0 {
            return Err(ConfigError::Range {
                field: "ship_column_count",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.path_timeout_ms == 0 {
            return Err(ConfigError::Range {
                field: "path_timeout_ms",
                reason: "must be positive".to_string(),
            });
        }
        if !self.front_marker_radius.is_finite() || self.front_marker_radius <= 0.0 {
            return Err(ConfigError::Range {
                field: "front_marker_radius",
                reason: format!("must be positive (got {})", self.front_marker_radius),
            });
        }
        if self.weather_range.min > self.weather_range.max {
            return Err(ConfigError::Range {
                field: "weather_range",
                reason: format!(
                    "min {} must not exceed max {}",
                    self.weather_range.min, self.weather_range.max
                ),
            });
        }
        self.time_range.validate("time_range")?;
        self.cloud_height_range.validate("cloud_height_range")?;
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            additional_air_operations: Self::default_additional_air(),
            additional_ground_operations: Self::default_additional_ground(),
            flight_count_multiplier: Self::default_multiplier(),
            flight_size_multiplier: Self::default_multiplier(),
            armor_count_range: Self::default_armor_count(),
            ship_column_count: Self::default_ship_column(),
            multi_assignment: false,
            escort_chance: Self::default_escort_chance(),
            defensive_response_chance: Self::default_defensive_chance(),
            debug: false,
            path_poll_interval_ms: Self::default_poll_interval(),
            path_timeout_ms: Self::default_path_timeout(),
            front_marker_radius: Self::default_front_radius(),
            padding: PaddingConfig::default(),
            time_range: Self::default_time_range(),
            weather_range: Self::default_weather_range(),
            cloud_height_range: Self::default_cloud_range(),
        }
    }
}
