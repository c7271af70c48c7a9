// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Builder configuration from the environment or a TOML file.
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `JIEQI_START_YEAR` | `start_year` | 1900 |
//! | `JIEQI_END_YEAR` | `end_year` | 2052 |
//! | `JIEQI_STEP_HOURS` | `step_hours` | 6 |
//! | `JIEQI_APPEND` | `append` | true |
//! | `JIEQI_FORCE` | `force_rebuild` | false |
//! | `JIEQI_WORKERS` | `workers` | 1 |
//! | `JIEQI_OUTPUT` | `output` | `data/jieqi_1900_2052.json` |
//!
//! Booleans accept `1`, `true`, `yes` and `y` (any case) as true; any other
//! value is false.

use qtty::Hours;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::builder::{buildable_years, BuildOptions};
use crate::error::ConfigError;
use crate::scanner::{is_valid_step, MAX_STEP_HOURS, MIN_STEP_HOURS};

pub const ENV_START_YEAR: &str = "JIEQI_START_YEAR";
pub const ENV_END_YEAR: &str = "JIEQI_END_YEAR";
pub const ENV_STEP_HOURS: &str = "JIEQI_STEP_HOURS";
pub const ENV_APPEND: &str = "JIEQI_APPEND";
pub const ENV_FORCE: &str = "JIEQI_FORCE";
pub const ENV_WORKERS: &str = "JIEQI_WORKERS";
pub const ENV_OUTPUT: &str = "JIEQI_OUTPUT";

/// Settings for one offline build run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderConfig {
    pub start_year: i32,
    pub end_year: i32,
    pub step_hours: f64,
    pub append: bool,
    pub force_rebuild: bool,
    pub workers: usize,
    pub output: PathBuf,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            start_year: 1900,
            end_year: 2052,
            step_hours: 6.0,
            append: true,
            force_rebuild: false,
            workers: 1,
            output: PathBuf::from("data").join("jieqi_1900_2052.json"),
        }
    }
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y"
    )
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnv {
            var: var.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

impl BuilderConfig {
    /// Defaults overridden by whichever `JIEQI_*` variables are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_lookup(lookup)?;
        Ok(config)
    }

    /// Override fields with whichever variables `lookup` yields.
    pub fn apply_lookup<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_START_YEAR) {
            self.start_year = parse_var(ENV_START_YEAR, &v)?;
        }
        if let Some(v) = lookup(ENV_END_YEAR) {
            self.end_year = parse_var(ENV_END_YEAR, &v)?;
        }
        if let Some(v) = lookup(ENV_STEP_HOURS) {
            self.step_hours = parse_var(ENV_STEP_HOURS, &v)?;
        }
        if let Some(v) = lookup(ENV_APPEND) {
            self.append = truthy(&v);
        }
        if let Some(v) = lookup(ENV_FORCE) {
            self.force_rebuild = truthy(&v);
        }
        if let Some(v) = lookup(ENV_WORKERS) {
            self.workers = parse_var(ENV_WORKERS, &v)?;
        }
        if let Some(v) = lookup(ENV_OUTPUT) {
            if !v.trim().is_empty() {
                self.output = PathBuf::from(v.trim());
            }
        }
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_year > self.end_year {
            return Err(ConfigError::Invalid(format!(
                "start_year {} is after end_year {}",
                self.start_year, self.end_year
            )));
        }
        let supported = buildable_years();
        for year in [self.start_year, self.end_year] {
            if !supported.contains(&year) {
                return Err(ConfigError::Invalid(format!(
                    "year {year} is outside the supported range {}..={}",
                    supported.start(),
                    supported.end()
                )));
            }
        }
        if !is_valid_step(self.step_hours) {
            return Err(ConfigError::Invalid(format!(
                "step_hours must be in [{MIN_STEP_HOURS:.4}, {MAX_STEP_HOURS}], got {}",
                self.step_hours
            )));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        Ok(())
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            step: Hours::new(self.step_hours),
            append: self.append,
            force_rebuild: self.force_rebuild,
            workers: self.workers,
            ..BuildOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_match_the_documented_table() {
        let config = BuilderConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, BuilderConfig::default());
        assert_eq!(config.years(), 1900..=2052);
        assert!(config.append);
        assert_eq!(config.output, PathBuf::from("data/jieqi_1900_2052.json"));
        config.validate().unwrap();
    }

    #[test]
    fn environment_overrides() {
        let config = BuilderConfig::from_lookup(lookup(&[
            ("JIEQI_START_YEAR", "2000"),
            ("JIEQI_END_YEAR", " 2010 "),
            ("JIEQI_STEP_HOURS", "3"),
            ("JIEQI_APPEND", "no"),
            ("JIEQI_FORCE", "YES"),
            ("JIEQI_WORKERS", "4"),
            ("JIEQI_OUTPUT", "/tmp/table.json"),
        ]))
        .unwrap();
        assert_eq!(config.years(), 2000..=2010);
        assert_eq!(config.step_hours, 3.0);
        assert!(!config.append);
        assert!(config.force_rebuild);
        assert_eq!(config.workers, 4);
        assert_eq!(config.output, PathBuf::from("/tmp/table.json"));

        let options = config.build_options();
        assert_eq!(options.step, Hours::new(3.0));
        assert!(options.widen_on_failure);
    }

    #[test]
    fn truthy_values() {
        for v in ["1", "true", "TRUE", "yes", "Y", " y "] {
            assert!(truthy(v), "{v}");
        }
        for v in ["0", "false", "no", "", "on"] {
            assert!(!truthy(v), "{v}");
        }
    }

    #[test]
    fn bad_number_names_the_variable() {
        let err = BuilderConfig::from_lookup(lookup(&[("JIEQI_START_YEAR", "nineteen")]))
            .unwrap_err();
        assert!(
            matches!(&err, ConfigError::InvalidEnv { var, .. } if var == "JIEQI_START_YEAR"),
            "{err}"
        );
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let config = BuilderConfig::from_toml_str(
            r#"
            start_year = 1950
            end_year = 1960
            workers = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.years(), 1950..=1960);
        assert_eq!(config.workers, 2);
        assert_eq!(config.step_hours, 6.0);
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        assert!(matches!(
            BuilderConfig::from_toml_str("stepHours = 3"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn validate_catches_inconsistent_settings() {
        let reversed = BuilderConfig {
            start_year: 2000,
            end_year: 1999,
            ..BuilderConfig::default()
        };
        assert!(reversed.validate().is_err());
        let coarse = BuilderConfig {
            step_hours: 72.0,
            ..BuilderConfig::default()
        };
        assert!(coarse.validate().is_err());
        let idle = BuilderConfig {
            workers: 0,
            ..BuilderConfig::default()
        };
        assert!(idle.validate().is_err());
        let tiny_step = BuilderConfig {
            step_hours: 1e-6,
            ..BuilderConfig::default()
        };
        assert!(tiny_step.validate().is_err());
    }

    #[test]
    fn extreme_years_fail_validation() {
        let config = BuilderConfig::from_lookup(lookup(&[("JIEQI_END_YEAR", "2147483647")])).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("2147483647"), "{err}");
        let early = BuilderConfig {
            start_year: i32::MIN,
            ..BuilderConfig::default()
        };
        assert!(early.validate().is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            BuilderConfig::from_toml_file(dir.path().join("nope.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
