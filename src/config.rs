//! Transformer configuration.
//!
//! A [`TransformConfig`] is an immutable value handed to
//! [`crate::transform::Transformer::new`]. It can be built in code, loaded from a JSON document
//! (either the bare object or nested under `etl.transform`), and overridden from environment
//! variables named after the dotted key (`etl.transform.null_handling` becomes
//! `ETL_TRANSFORM_NULL_HANDLING`).

use std::env::VarError;
use std::fmt;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default date format hint.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Environment override for [`TransformConfig::null_handling`].
pub const ENV_NULL_HANDLING: &str = "ETL_TRANSFORM_NULL_HANDLING";
/// Environment override for [`TransformConfig::date_format`].
pub const ENV_DATE_FORMAT: &str = "ETL_TRANSFORM_DATE_FORMAT";
/// Environment override for [`TransformConfig::num_threads`].
pub const ENV_NUM_THREADS: &str = "ETL_TRANSFORM_NUM_THREADS";

/// Policy applied to missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullHandling {
    /// Remove every row that contains at least one null.
    #[default]
    Drop,
    /// Replace nulls with `0` in numeric columns and `""` in textual columns.
    Fill,
    /// Append a `<column>_is_null` boolean column for every column containing nulls.
    Flag,
}

impl NullHandling {
    /// Lower-case policy name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            NullHandling::Drop => "drop",
            NullHandling::Fill => "fill",
            NullHandling::Flag => "flag",
        }
    }
}

impl fmt::Display for NullHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NullHandling {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(NullHandling::Drop),
            "fill" => Ok(NullHandling::Fill),
            "flag" => Ok(NullHandling::Flag),
            _ => Err(ConfigError::UnsupportedNullHandling {
                value: s.to_string(),
            }),
        }
    }
}

/// Configuration for a [`crate::transform::Transformer`].
///
/// Use [`Default`] for common cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    /// Null-handling policy.
    pub null_handling: NullHandling,
    /// strftime-style hint tried first when parsing timestamps. Values that do not match it
    /// are still offered the built-in layouts.
    pub date_format: String,
    /// Worker threads for per-column work.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            null_handling: NullHandling::default(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            num_threads: None,
        }
    }
}

impl TransformConfig {
    /// Set the null-handling policy.
    pub fn with_null_handling(mut self, null_handling: NullHandling) -> Self {
        self.null_handling = null_handling;
        self
    }

    /// Set the date format hint.
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    /// Set the worker thread count.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Parse a configuration from JSON.
    ///
    /// Accepts either the configuration object itself or a document that nests it under
    /// `etl.transform`. Missing keys take their default values; unknown keys and unknown
    /// policies are rejected.
    ///
    /// ```rust
    /// use tabular_transform::config::{NullHandling, TransformConfig};
    ///
    /// let cfg = TransformConfig::from_json_str(
    ///     r#"{"etl": {"transform": {"null_handling": "flag"}}}"#,
    /// ).unwrap();
    /// assert_eq!(cfg.null_handling, NullHandling::Flag);
    /// assert_eq!(cfg.date_format, "%Y-%m-%d");
    /// ```
    pub fn from_json_str(input: &str) -> ConfigResult<Self> {
        let doc: serde_json::Value = serde_json::from_str(input)?;
        let section = match doc.pointer("/etl/transform") {
            Some(nested) => nested.clone(),
            None => doc,
        };
        let config: Self = serde_json::from_value(section)?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration with environment overrides applied.
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `ETL_TRANSFORM_*` environment overrides on top of `self`.
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides_from(|key| std::env::var(key))
    }

    /// Apply overrides looked up through `lookup`, keyed by the `ENV_*` constants.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        if let Some(raw) = read_override(&lookup, ENV_NULL_HANDLING)? {
            self.null_handling = raw.parse()?;
        }
        if let Some(raw) = read_override(&lookup, ENV_DATE_FORMAT)? {
            self.date_format = raw;
        }
        if let Some(raw) = read_override(&lookup, ENV_NUM_THREADS)? {
            let n = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidThreads { value: raw.clone() })?;
            self.num_threads = Some(n);
        }
        self.validate()?;
        Ok(self)
    }

    /// Check the configuration for values that would make the transformer misbehave.
    pub fn validate(&self) -> ConfigResult<()> {
        if !is_valid_strftime(&self.date_format) {
            return Err(ConfigError::InvalidDateFormat {
                format: self.date_format.clone(),
            });
        }
        if self.num_threads == Some(0) {
            return Err(ConfigError::InvalidThreads {
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn read_override<F>(lookup: &F, key: &str) -> ConfigResult<Option<String>>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    match lookup(key) {
        Ok(v) => Ok(Some(v)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::Env {
            key: key.to_string(),
        }),
    }
}

fn is_valid_strftime(format: &str) -> bool {
    !format.trim().is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
