//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Workout program shape (cycles and stage durations)
//! - Cue output preferences
//! - Display refresh rate
//!
//! Configuration is stored at `~/.config/cadence/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, Result, ValidationError};
use crate::timer::{build_stages_with, StageDurations, StageSequence, DEFAULT_CYCLES};

const MAX_CYCLES: u64 = 1_000;
const MAX_TICK_HZ: u64 = 1_000;
/// One day per stage.
const MAX_STAGE_MS: u64 = 24 * 60 * 60 * 1000;

/// Program shape used to build the stage sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramConfig {
    #[serde(default = "default_cycles")]
    pub cycles: u32,
    #[serde(default = "default_prepare_ms")]
    pub prepare_ms: u64,
    #[serde(default = "default_work_ms")]
    pub work_ms: u64,
    #[serde(default = "default_rest_ms")]
    pub rest_ms: u64,
    #[serde(default = "default_finish_ms")]
    pub finish_ms: u64,
}

/// Cue output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuesConfig {
    /// Ring the terminal bell on every cue.
    #[serde(default = "default_true")]
    pub bell: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Host loop refresh rate.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/cadence/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub program: ProgramConfig,
    #[serde(default)]
    pub cues: CuesConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

fn default_cycles() -> u32 {
    DEFAULT_CYCLES
}
fn default_prepare_ms() -> u64 {
    StageDurations::default().prepare_ms
}
fn default_work_ms() -> u64 {
    StageDurations::default().work_ms
}
fn default_rest_ms() -> u64 {
    StageDurations::default().rest_ms
}
fn default_finish_ms() -> u64 {
    StageDurations::default().finish_ms
}
fn default_true() -> bool {
    true
}
fn default_tick_hz() -> u32 {
    60
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            cycles: default_cycles(),
            prepare_ms: default_prepare_ms(),
            work_ms: default_work_ms(),
            rest_ms: default_rest_ms(),
            finish_ms: default_finish_ms(),
        }
    }
}

impl Default for CuesConfig {
    fn default() -> Self {
        Self { bell: true }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
        }
    }
}

impl ProgramConfig {
    pub fn durations(&self) -> StageDurations {
        StageDurations {
            prepare_ms: self.prepare_ms,
            work_ms: self.work_ms,
            rest_ms: self.rest_ms,
            finish_ms: self.finish_ms,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if part.is_empty() {
                return Err(unknown());
            }
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => value
                    .parse::<bool>()
                    .map(serde_json::Value::Bool)
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("cannot assign to a table".into()));
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(ConfigError::from)?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                tracing::debug!(path = %path.display(), "wrote default config");
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key.
    ///
    /// The change only lands if the resulting config validates; call
    /// [`Config::save`] to persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed
    /// into the key's type, or the new value is out of range.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("program.cycles", u64::from(self.program.cycles), 1, MAX_CYCLES)?;
        check_range("program.prepare_ms", self.program.prepare_ms, 0, MAX_STAGE_MS)?;
        check_range("program.work_ms", self.program.work_ms, 0, MAX_STAGE_MS)?;
        check_range("program.rest_ms", self.program.rest_ms, 0, MAX_STAGE_MS)?;
        check_range("program.finish_ms", self.program.finish_ms, 0, MAX_STAGE_MS)?;
        check_range("display.tick_hz", u64::from(self.display.tick_hz), 1, MAX_TICK_HZ)?;
        Ok(())
    }

    /// Stage sequence for the configured program.
    pub fn stages(&self) -> StageSequence {
        build_stages_with(self.program.cycles, &self.program.durations())
    }

    /// Sleep between host loop ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.display.tick_hz.max(1)))
    }
}

fn check_range(field: &str, value: u64, min: u64, max: u64) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[program]\ncycles = 3\n").unwrap();
        assert_eq!(parsed.program.cycles, 3);
        assert_eq!(parsed.program.work_ms, 30_000);
        assert!(parsed.cues.bell);
        assert_eq!(parsed.display.tick_hz, 60);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("program.cycles").as_deref(), Some("8"));
        assert_eq!(cfg.get("cues.bell").as_deref(), Some("true"));
        assert!(cfg.get("program.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_values() {
        let mut cfg = Config::default();
        cfg.set("program.cycles", "4").unwrap();
        cfg.set("cues.bell", "false").unwrap();
        assert_eq!(cfg.program.cycles, 4);
        assert!(!cfg.cues.bell);
        assert_eq!(cfg.stages().len(), 9);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("program.nonexistent", "1"),
            Err(CoreError::Config(ConfigError::UnknownKey(_)))
        ));
        assert!(cfg.set("program", "1").is_err());
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("cues.bell", "loud").is_err());
        assert!(cfg.set("program.work_ms", "-5").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_rejects_out_of_range() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("program.cycles", "0"),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(cfg.set("display.tick_hz", "0").is_err());
        assert_eq!(cfg.program.cycles, 8);
    }

    #[test]
    fn set_rejects_oversized_duration() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("program.work_ms", "9223372036854775807"),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(cfg.set("program.finish_ms", "86400001").is_err());
        assert_eq!(cfg, Config::default());

        cfg.set("program.rest_ms", "86400000").unwrap();
        assert_eq!(cfg.program.rest_ms, 86_400_000);
    }

    #[test]
    fn load_from_rejects_oversized_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[program]\nprepare_ms = 9223372036854775807\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut cfg = cfg;
        cfg.set("program.rest_ms", "15000").unwrap();
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().program.rest_ms, 15_000);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "program = [").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn tick_interval_follows_rate() {
        let mut cfg = Config::default();
        cfg.set("display.tick_hz", "100").unwrap();
        assert_eq!(cfg.tick_interval(), Duration::from_millis(10));
    }
}
