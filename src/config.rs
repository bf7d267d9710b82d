//! Flat key/value parameter records, change events, and config files.
//!
//! A `Config` is what gets persisted and snapshotted: a flat map from
//! parameter name to a number, flag or string. Colors are stored as three
//! scalar keys sharing a prefix (`glowL`, `glowC`, `glowH`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::Oklch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Interprets free-form input: `true`/`false`, a number, otherwise text.
    pub fn parse_loose(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => match raw.parse::<f64>() {
                Ok(n) => Value::Number(n),
                Err(_) => Value::Text(raw.trim_matches('"').to_string()),
            },
        }
    }

    /// False for NaN or infinite numbers, which JSON cannot store.
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Number(n) => n.is_finite(),
            _ => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Default value for one template entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Param {
    Num(f64),
    Flag(bool),
    Choice(&'static str),
}

impl From<Param> for Value {
    fn from(p: Param) -> Self {
        match p {
            Param::Num(n) => Value::Number(n),
            Param::Flag(b) => Value::Bool(b),
            Param::Choice(s) => Value::Text(s.to_string()),
        }
    }
}

pub type Template = [(&'static str, Param)];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    values: BTreeMap<String, Value>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_template(template: &Template) -> Self {
        let values = template
            .iter()
            .map(|(k, p)| (k.to_string(), Value::from(*p)))
            .collect();
        Self { values }
    }

    /// Shallow overlay: keys in `other` replace keys in `self`.
    pub fn merge(&mut self, other: &Config) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    pub fn merged(mut self, other: &Config) -> Self {
        self.merge(other);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric value of `key`, 0 when missing or unparseable.
    pub fn num(&self, key: &str) -> f32 {
        self.get(key).and_then(Value::as_f64).unwrap_or(0.0) as f32
    }

    pub fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => *n != 0.0,
            Some(Value::Text(s)) => matches!(s.trim(), "true" | "1" | "on" | "yes"),
            None => false,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Parses a string choice, falling back (with a warning) when the stored
    /// value is missing or not recognised.
    pub fn choice<T: FromStr>(&self, key: &str, fallback: T) -> T {
        match self.get(key) {
            Some(Value::Text(s)) => s.parse().unwrap_or_else(|_| {
                log::warn!("unrecognised value `{s}` for `{key}`, using default");
                fallback
            }),
            Some(other) => {
                log::warn!("`{key}` expects a name, got {other}");
                fallback
            }
            None => fallback,
        }
    }

    /// Reads `{prefix}L`, `{prefix}C`, `{prefix}H`.
    pub fn color(&self, prefix: &str) -> Oklch {
        Oklch::new(
            self.num(&format!("{prefix}L")),
            self.num(&format!("{prefix}C")),
            self.num(&format!("{prefix}H")),
        )
    }

    pub fn set_color(&mut self, prefix: &str, color: Oklch) {
        self.set(format!("{prefix}L"), Value::Number(color.l as f64));
        self.set(format!("{prefix}C"), Value::Number(color.c as f64));
        self.set(format!("{prefix}H"), Value::Number(color.h as f64));
    }

    /// Applies a change event; color changes expand into three keys.
    /// Non-finite numbers are dropped and the previous value kept.
    pub fn apply(&mut self, change: &ConfigChange) {
        if !change.is_finite() {
            log::warn!("ignoring non-finite value for `{}`", change.key);
            return;
        }
        match &change.value {
            ChangeValue::Color(color) => {
                if !color.in_gamut() {
                    log::debug!("`{}` {color:?} is outside sRGB, channels will clip", change.key);
                }
                self.set_color(&change.key, *color)
            }
            ChangeValue::Scalar(v) => self.set(change.key.clone(), v.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangeValue {
    Color(Oklch),
    Scalar(Value),
}

/// One parameter edit from a control surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigChange {
    pub key: String,
    pub value: ChangeValue,
}

impl ConfigChange {
    pub fn scalar(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value: ChangeValue::Scalar(value),
        }
    }

    pub fn color(key: impl Into<String>, color: Oklch) -> Self {
        Self {
            key: key.into(),
            value: ChangeValue::Color(color),
        }
    }

    pub fn is_finite(&self) -> bool {
        match &self.value {
            ChangeValue::Color(c) => c.l.is_finite() && c.c.is_finite() && c.h.is_finite(),
            ChangeValue::Scalar(v) => v.is_finite(),
        }
    }

    /// Accepts a JSON object (`{"key":"speed","value":0.4}`) or `key=value`,
    /// where a color value is written `l,c,h` or as a JSON object.
    /// Numbers must be finite.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let input = input.trim();
        let change = Self::parse_unchecked(input)?;
        if !change.is_finite() {
            return Err(ConfigError::Malformed(input.to_string()));
        }
        Ok(change)
    }

    fn parse_unchecked(input: &str) -> Result<Self, ConfigError> {
        if input.starts_with('{') {
            return Ok(serde_json::from_str(input)?);
        }
        let (key, raw) = input
            .split_once('=')
            .ok_or_else(|| ConfigError::Malformed(input.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::Malformed(input.to_string()));
        }
        let raw = raw.trim();
        if raw.starts_with('{') {
            let color: Oklch = serde_json::from_str(raw)?;
            return Ok(Self::color(key, color));
        }
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        if parts.len() == 3 {
            let nums: Result<Vec<f32>, _> = parts.iter().map(|p| p.parse::<f32>()).collect();
            return match nums {
                Ok(n) => Ok(Self::color(key, Oklch::new(n[0], n[1], n[2]))),
                Err(_) => Err(ConfigError::Malformed(input.to_string())),
            };
        }
        Ok(Self::scalar(key, Value::parse_loose(raw)))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("expected `key=value` or a JSON change, got `{0}`")]
    Malformed(String),
}

/// Loads a parameter overlay from `.json` or `.toml`; other extensions are
/// sniffed (a leading `{` means JSON).
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "json" => Ok(serde_json::from_str(&text)?),
        "toml" => Ok(toml::from_str(&text)?),
        _ if text.trim_start().starts_with('{') => Ok(serde_json::from_str(&text)?),
        _ => Ok(toml::from_str(&text)?),
    }
}
