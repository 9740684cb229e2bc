use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Orchestration tuning knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// HTTP endpoint of the move-producing model; model seats fall back to the
    /// engine when unset.
    pub model_endpoint: Option<String>,
    pub model_timeout: Duration,
    pub model_max_attempts: u32,
    /// Engine level used when a model exhausts its attempts.
    pub fallback_engine_level: u8,
    /// Redis for event fan-out and the actuator link; in-process sinks when unset.
    pub redis_url: Option<String>,
    pub actuator_channel: String,
    pub queue_idle_timeout: Duration,
    pub dead_letter_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_endpoint: None,
            model_timeout: Duration::from_secs(30),
            model_max_attempts: 3,
            fallback_engine_level: 2,
            redis_url: None,
            actuator_channel: "actuator:requests".to_string(),
            queue_idle_timeout: Duration::from_secs(30),
            dead_letter_capacity: 256,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        Ok(Self {
            model_endpoint: optional_var("GAMBIT_MODEL_ENDPOINT"),
            model_timeout: Duration::from_millis(parsed_var(
                "GAMBIT_MODEL_TIMEOUT_MS",
                defaults.model_timeout.as_millis() as u64,
            )?),
            model_max_attempts: parsed_var("GAMBIT_MODEL_MAX_ATTEMPTS", defaults.model_max_attempts)?
                .max(1),
            fallback_engine_level: parsed_var(
                "GAMBIT_FALLBACK_ENGINE_LEVEL",
                defaults.fallback_engine_level,
            )?,
            redis_url: optional_var("REDIS_URL"),
            actuator_channel: optional_var("GAMBIT_ACTUATOR_CHANNEL")
                .unwrap_or(defaults.actuator_channel),
            queue_idle_timeout: Duration::from_millis(parsed_var(
                "GAMBIT_QUEUE_IDLE_MS",
                defaults.queue_idle_timeout.as_millis() as u64,
            )?),
            dead_letter_capacity: parsed_var(
                "GAMBIT_DEAD_LETTER_CAPACITY",
                defaults.dead_letter_capacity,
            )?,
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match optional_var(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{name} has an invalid value: '{raw}'"))),
    }
}
