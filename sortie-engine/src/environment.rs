//! Time of day, weather and cloud base for one generated mission.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::template::Environment;

/// Rounding applied to random times, in hours.
const TIME_STEP: f64 = 0.25;
/// Rounding applied to random cloud heights, in metres.
const CLOUD_STEP: f64 = 100.0;

const WEATHER_LABELS: [&str; 5] = ["Clear", "Good", "Hazy", "Poor", "Blind"];

/// How one environment value is chosen. Explicit beats random beats the
/// template's own value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvSetting<T> {
    #[default]
    Template,
    Random,
    Explicit(T),
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvironmentRequest {
    #[serde(default)]
    pub time: EnvSetting<f64>,
    #[serde(default)]
    pub weather: EnvSetting<u8>,
    #[serde(default)]
    pub cloud_height: EnvSetting<f64>,
}

impl EnvironmentRequest {
    /// Every value drawn from the configured ranges.
    #[must_use]
    pub const fn random() -> Self {
        Self {
            time: EnvSetting::Random,
            weather: EnvSetting::Random,
            cloud_height: EnvSetting::Random,
        }
    }
}

/// Resolve the mission environment. Draws happen in a fixed order (time,
/// weather, cloud height) and only for values set to [`EnvSetting::Random`].
pub fn resolve_environment<R: Rng + ?Sized>(
    template: &Environment,
    request: &EnvironmentRequest,
    cfg: &GenerationConfig,
    rng: &mut R,
) -> Environment {
    let time = match request.time {
        EnvSetting::Explicit(time) => time.clamp(0.0, 24.0),
        EnvSetting::Random => {
            let raw = rng.gen_range(cfg.time_range.min..=cfg.time_range.max);
            ((raw / TIME_STEP).round() * TIME_STEP).clamp(cfg.time_range.min, cfg.time_range.max)
        }
        EnvSetting::Template => template.time,
    };
    let weather = match request.weather {
        EnvSetting::Explicit(weather) => weather,
        EnvSetting::Random => rng.gen_range(cfg.weather_range.min..=cfg.weather_range.max),
        EnvSetting::Template => template.weather,
    };
    let cloud_height = match request.cloud_height {
        EnvSetting::Explicit(height) => height.max(0.0),
        EnvSetting::Random => {
            let range = cfg.cloud_height_range;
            let raw = rng.gen_range(range.min..=range.max);
            ((raw / CLOUD_STEP).round() * CLOUD_STEP).clamp(range.min, range.max)
        }
        EnvSetting::Template => template.cloud_height,
    };
    Environment {
        time,
        weather,
        cloud_height,
    }
}

#[must_use]
pub fn weather_label(weather: u8) -> &'static str {
    WEATHER_LABELS
        .get(usize::from(weather))
        .copied()
        .unwrap_or("Unknown")
}

/// `HH:MM` for a fractional hour.
#[must_use]
pub fn clock_label(time: f64) -> String {
    let total = (time.rem_euclid(24.0) * 60.0).round();
    let minutes = crate::numbers::round_minutes(total);
    format!("{:02}:{:02}", (minutes / 60) % 24, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn template() -> Environment {
        Environment {
            time: 9.5,
            weather: 1,
            cloud_height: 1_200.0,
        }
    }

    #[test]
    fn template_values_carry_over_without_drawing() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut untouched = rng.clone();
        let env = resolve_environment(
            &template(),
            &EnvironmentRequest::default(),
            &GenerationConfig::default(),
            &mut rng,
        );
        assert_eq!(env, template());
        assert_eq!(rng.r#gen::<u64>(), untouched.r#gen::<u64>());
    }

    #[test]
    fn explicit_beats_random() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let request = EnvironmentRequest {
            time: EnvSetting::Explicit(5.0),
            weather: EnvSetting::Explicit(3),
            cloud_height: EnvSetting::Random,
        };
        let cfg = GenerationConfig::default();
        let env = resolve_environment(&template(), &request, &cfg, &mut rng);
        assert_eq!(env.time, 5.0);
        assert_eq!(env.weather, 3);
        assert!(env.cloud_height >= cfg.cloud_height_range.min);
        assert!(env.cloud_height <= cfg.cloud_height_range.max);
        assert_eq!(env.cloud_height % CLOUD_STEP, 0.0);
    }

    #[test]
    fn random_values_stay_in_configured_ranges() {
        let cfg = GenerationConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..200 {
            let env =
                resolve_environment(&template(), &EnvironmentRequest::random(), &cfg, &mut rng);
            assert!((cfg.time_range.min..=cfg.time_range.max).contains(&env.time));
            assert!((cfg.weather_range.min..=cfg.weather_range.max).contains(&env.weather));
            assert_eq!(env.time % TIME_STEP, 0.0);
        }
    }

    #[test]
    fn labels() {
        assert_eq!(weather_label(0), "Clear");
        assert_eq!(weather_label(9), "Unknown");
        assert_eq!(clock_label(9.5), "09:30");
        assert_eq!(clock_label(23.999), "00:00");
        assert_eq!(clock_label(6.25), "06:15");
    }
}
