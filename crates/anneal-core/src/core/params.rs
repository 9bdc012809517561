use phf::phf_set;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Parameter keys accepted by the refinement engine's `param` table.
pub static PARAM_KEYS: phf::Set<&'static str> = phf_set! {
    "coarse", "useh", "hardSphere", "start", "end", "shrinkValue",
    "shrinkHValue", "dislim", "swap", "updateAt",
};

/// Force-scale keys accepted by the refinement engine's `force` table.
pub static FORCE_KEYS: phf::Set<&'static str> = phf_set! {
    "elec", "cffnb", "nbmin", "repel", "dis", "tors", "dih", "irp",
    "shift", "bondWt", "stack", "rdc",
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamError {
    #[error("invalid {kind} parameter key '{key}'")]
    InvalidKey { key: String, kind: ParamKind },

    #[error("invalid value for {kind} parameter '{key}': expected {expected}")]
    InvalidValue {
        key: String,
        kind: ParamKind,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Param,
    Force,
    Dynamics,
}

impl ParamKind {
    fn allowed(&self) -> Option<&'static phf::Set<&'static str>> {
        match self {
            ParamKind::Param => Some(&PARAM_KEYS),
            ParamKind::Force => Some(&FORCE_KEYS),
            // Dynamics options validate against their own fixed schema.
            ParamKind::Dynamics => None,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Param => write!(f, "param"),
            ParamKind::Force => write!(f, "force"),
            ParamKind::Dynamics => write!(f, "dynamics"),
        }
    }
}

/// A single scalar value in a parameter dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}
impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}
impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}
impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// An insertion-ordered key/value map guarded by a fixed key whitelist.
///
/// Writes to keys outside the whitelist (or the defaults the dictionary was
/// constructed with) fail with [`ParamError::InvalidKey`] the moment they are
/// attempted; nothing is silently dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDict {
    entries: Vec<(String, ParamValue)>,
    kind: ParamKind,
}

impl ParamDict {
    pub fn new(kind: ParamKind) -> Self {
        Self {
            entries: Vec::new(),
            kind,
        }
    }

    /// Builds a dictionary pre-populated with template defaults. Default keys
    /// are writable afterwards even when they fall outside the whitelist.
    pub fn with_defaults<I, K, V>(kind: ParamKind, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        let entries = defaults
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { entries, kind }
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    fn permitted(&self, key: &str) -> bool {
        match self.kind.allowed() {
            Some(set) if set.contains(key) => true,
            _ => self.entries.iter().any(|(k, _)| k == key),
        }
    }

    /// Writes a single key, failing fast when the key is not permitted.
    pub fn set(&mut self, key: &str, value: ParamValue) -> Result<(), ParamError> {
        if !self.permitted(key) {
            return Err(ParamError::InvalidKey {
                key: key.to_string(),
                kind: self.kind,
            });
        }
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key.to_string(), value)),
        }
        Ok(())
    }

    /// Applies every override in order; the first disallowed key aborts the
    /// call with [`ParamError::InvalidKey`].
    pub fn strict_update<'a, I>(&mut self, overrides: I) -> Result<(), ParamError>
    where
        I: IntoIterator<Item = (&'a String, &'a ParamValue)>,
    {
        for (key, value) in overrides {
            self.set(key, value.clone())?;
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
