use crate::core::options::DynamicsOptions;
use crate::core::params::{ParamError, ParamValue};
use crate::core::schedule::{EconSpec, TempSpec};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use toml::Value;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error: {source}")]
    Toml {
        #[from]
        source: toml::de::Error,
    },

    #[error("unexpected value for '{key}': expected {expected}")]
    UnexpectedValue { key: String, expected: &'static str },

    #[error(transparent)]
    Param(#[from] ParamError),
}

/// Per-stage overrides: optional `param`/`force` sub-maps (merged via
/// strict update) and optional scalar fields (replace outright).
#[derive(Debug, Clone, Default)]
pub struct StageOverride {
    pub param: Vec<(String, ParamValue)>,
    pub force: Vec<(String, ParamValue)>,
    pub temp: Option<TempSpec>,
    pub econ: Option<EconSpec>,
    pub step_count: Option<u64>,
    pub minimizer_steps: Option<u64>,
    pub non_deriv_steps: Option<u64>,
    pub switch_fraction: Option<f64>,
    pub timestep_override: Option<f64>,
    pub end_ramp: Option<Vec<f64>>,
}

impl StageOverride {
    pub fn is_empty(&self) -> bool {
        self.param.is_empty()
            && self.force.is_empty()
            && self.temp.is_none()
            && self.econ.is_none()
            && self.step_count.is_none()
            && self.minimizer_steps.is_none()
            && self.non_deriv_steps.is_none()
            && self.switch_fraction.is_none()
            && self.timestep_override.is_none()
            && self.end_ramp.is_none()
    }
}

/// A user-defined stage to be spliced into the pipeline after its anchor.
#[derive(Debug, Clone)]
pub struct CustomStage {
    pub name: String,
    pub after: Option<String>,
    pub body: StageOverride,
}

/// The resolved user settings surface: global override maps, per-stage
/// overrides, and custom stages in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub param: Vec<(String, ParamValue)>,
    pub force: Vec<(String, ParamValue)>,
    pub stages: Vec<(String, StageOverride)>,
    pub custom: Vec<CustomStage>,
}

impl Settings {
    pub fn stage_override(&self, name: &str) -> Option<&StageOverride> {
        self.stages
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| o)
    }
}

/// The full configuration: global dynamics options plus user settings.
#[derive(Debug, Clone, Default)]
pub struct AnnealConfig {
    pub options: DynamicsOptions,
    pub settings: Settings,
}

const CUSTOM_STAGE_PREFIX: &str = "stage_";

impl AnnealConfig {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses one TOML document. Top-level keys: `dynamics` (global
    /// options), `param`/`force` (tier-2 maps), `stage_<id>` tables
    /// (custom stages, declaration order preserved), anything else is a
    /// per-stage override table.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let table: toml::Table = content.parse()?;
        let mut config = AnnealConfig::default();

        for (key, value) in &table {
            match key.as_str() {
                "dynamics" => {
                    let overrides = scalar_map(key, value)?;
                    config
                        .options
                        .apply(overrides.iter().map(|(k, v)| (k, v)))?;
                }
                "param" => config.settings.param = scalar_map(key, value)?,
                "force" => config.settings.force = scalar_map(key, value)?,
                _ if key.starts_with(CUSTOM_STAGE_PREFIX) => {
                    let (body, after) = stage_override(key, value, true)?;
                    config.settings.custom.push(CustomStage {
                        name: key.clone(),
                        after,
                        body,
                    });
                }
                _ => {
                    let (body, _) = stage_override(key, value, false)?;
                    config.settings.stages.push((key.clone(), body));
                }
            }
        }
        Ok(config)
    }
}

fn expect_table<'a>(key: &str, value: &'a Value) -> Result<&'a toml::Table, SettingsError> {
    value.as_table().ok_or_else(|| SettingsError::UnexpectedValue {
        key: key.to_string(),
        expected: "a table",
    })
}

fn scalar(key: &str, value: &Value) -> Result<ParamValue, SettingsError> {
    // The untagged enum accepts exactly the four scalar shapes; tables and
    // arrays fall through to the error.
    ParamValue::deserialize(value.clone()).map_err(|_| SettingsError::UnexpectedValue {
        key: key.to_string(),
        expected: "a scalar value",
    })
}

fn scalar_map(key: &str, value: &Value) -> Result<Vec<(String, ParamValue)>, SettingsError> {
    let table = expect_table(key, value)?;
    let mut out = Vec::with_capacity(table.len());
    for (k, v) in table {
        out.push((k.clone(), scalar(&format!("{}.{}", key, k), v)?));
    }
    Ok(out)
}

fn number(key: &str, value: &Value) -> Result<f64, SettingsError> {
    match value {
        Value::Integer(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        _ => Err(SettingsError::UnexpectedValue {
            key: key.to_string(),
            expected: "a number",
        }),
    }
}

fn steps(key: &str, value: &Value) -> Result<u64, SettingsError> {
    value
        .as_integer()
        .and_then(|i| u64::try_from(i).ok())
        .ok_or_else(|| SettingsError::UnexpectedValue {
            key: key.to_string(),
            expected: "a non-negative integer",
        })
}

fn number_array(key: &str, value: &Value) -> Result<Vec<f64>, SettingsError> {
    let items = value.as_array().ok_or_else(|| SettingsError::UnexpectedValue {
        key: key.to_string(),
        expected: "an array of numbers",
    })?;
    items.iter().map(|v| number(key, v)).collect()
}

/// Temperature specs mirror the ramp arities: a bare number is a constant
/// target; `[up]`, `[up, down]`, `[up, down, power]` are the ramps.
fn temp_spec(key: &str, value: &Value) -> Result<TempSpec, SettingsError> {
    if let Ok(c) = number(key, value) {
        return Ok(TempSpec::Constant(c));
    }
    let nums = number_array(key, value)?;
    match nums.as_slice() {
        [up] => Ok(TempSpec::Ramp { up: *up }),
        [up, down] => Ok(TempSpec::RampTo {
            up: *up,
            down: *down,
        }),
        [up, down, power] => Ok(TempSpec::RampPow {
            up: *up,
            down: *down,
            power: *power,
        }),
        _ => Err(SettingsError::UnexpectedValue {
            key: key.to_string(),
            expected: "a number or an array of 1 to 3 numbers",
        }),
    }
}

/// Energy-constant specs: a bare number is constant; `[scale]` decays with
/// base 0.5, `[scale, base]` with an explicit base.
fn econ_spec(key: &str, value: &Value) -> Result<EconSpec, SettingsError> {
    if let Ok(c) = number(key, value) {
        return Ok(EconSpec::Constant(c));
    }
    let nums = number_array(key, value)?;
    match nums.as_slice() {
        [scale] => Ok(EconSpec::Decay { scale: *scale }),
        [scale, base] => Ok(EconSpec::DecayBase {
            scale: *scale,
            base: *base,
        }),
        _ => Err(SettingsError::UnexpectedValue {
            key: key.to_string(),
            expected: "a number or an array of 1 or 2 numbers",
        }),
    }
}

fn stage_override(
    stage_key: &str,
    value: &Value,
    allow_after: bool,
) -> Result<(StageOverride, Option<String>), SettingsError> {
    let table = expect_table(stage_key, value)?;
    let mut body = StageOverride::default();
    let mut after = None;

    for (field, v) in table {
        let key = format!("{}.{}", stage_key, field);
        match field.as_str() {
            "param" => body.param = scalar_map(&key, v)?,
            "force" => body.force = scalar_map(&key, v)?,
            "temp" => body.temp = Some(temp_spec(&key, v)?),
            "econ" => body.econ = Some(econ_spec(&key, v)?),
            "steps" => body.step_count = Some(steps(&key, v)?),
            "minimize-steps" => body.minimizer_steps = Some(steps(&key, v)?),
            "stochastic-steps" => body.non_deriv_steps = Some(steps(&key, v)?),
            "switch-fraction" => body.switch_fraction = Some(number(&key, v)?),
            "timestep" => body.timestep_override = Some(number(&key, v)?),
            "end-ramp" => body.end_ramp = Some(number_array(&key, v)?),
            "after" if allow_after => {
                after = Some(
                    v.as_str()
                        .ok_or_else(|| SettingsError::UnexpectedValue {
                            key: key.clone(),
                            expected: "a stage name",
                        })?
                        .to_string(),
                );
            }
            _ => {
                return Err(SettingsError::UnexpectedValue {
                    key,
                    expected: "a stage setting",
                });
            }
        }
    }
    Ok((body, after))
}
