use serde::{Deserialize, Serialize};

/// Worker-pool sizing, loaded from a `[scheduler]` table in a project's
/// TOML config.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub worker_count: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
        }
    }
}

/// Frame-timing configuration, loaded from a `[frame]` table. `fixed_step_millis`
/// set to `Some` drives the simulation with [`gridkernel_modules::FixedClock`]
/// instead of wall-clock time — used in tests and headless replay, where a
/// reproducible step matters more than real-time pacing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub fixed_step_millis: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scheduler: SchedulerConfig,
    pub frame: FrameConfig,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert!(config.scheduler.worker_count >= 1);
        assert_eq!(config.frame.fixed_step_millis, None);
    }

    #[test]
    fn partial_overrides_apply() {
        let config = AppConfig::from_toml_str("[scheduler]\nworker_count = 2\n[frame]\nfixed_step_millis = 16\n").unwrap();
        assert_eq!(config.scheduler.worker_count, 2);
        assert_eq!(config.frame.fixed_step_millis, Some(16));
    }
}
