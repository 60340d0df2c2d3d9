//! Single-valued slots.

use std::fmt;

use super::Value;
use crate::error::ParseError;

/// A plain string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringValue(String);

impl StringValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn get(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Value for StringValue {
    fn set(&mut self, raw: &str) -> Result<(), ParseError> {
        self.0 = raw.to_string();
        Ok(())
    }

    fn type_name(&self) -> String {
        "string".into()
    }
}

/// A boolean switch.
///
/// Present without an argument, the flag sets `true`. Accepted spellings
/// are `1 t T TRUE true True` and `0 f F FALSE false False`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoolValue(bool);

impl BoolValue {
    pub fn new(value: bool) -> Self {
        Self(value)
    }

    pub fn get(&self) -> bool {
        self.0
    }
}

fn parse_bool(raw: &str) -> Result<bool, ParseError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ParseError::new(format!("invalid boolean {raw:?}"))),
    }
}

impl fmt::Display for BoolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Value for BoolValue {
    fn set(&mut self, raw: &str) -> Result<(), ParseError> {
        self.0 = parse_bool(raw)?;
        Ok(())
    }

    fn type_name(&self) -> String {
        "bool".into()
    }

    fn no_opt_default(&self) -> Option<&str> {
        Some("true")
    }

    fn to_yaml(&self) -> Result<serde_yaml::Value, ParseError> {
        Ok(serde_yaml::Value::Bool(self.0))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Bool(self.0)
    }
}

/// A signed 64-bit integer in base 10.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Int64Value(i64);

impl Int64Value {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Int64Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Value for Int64Value {
    fn set(&mut self, raw: &str) -> Result<(), ParseError> {
        self.0 = raw
            .trim()
            .parse()
            .map_err(|e| ParseError::new(format!("invalid integer {raw:?}: {e}")))?;
        Ok(())
    }

    fn type_name(&self) -> String {
        "int".into()
    }

    fn to_yaml(&self) -> Result<serde_yaml::Value, ParseError> {
        Ok(serde_yaml::Value::from(self.0))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self.0)
    }
}

/// A string restricted to a fixed set of choices.
///
/// The choices double as completion candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enum {
    value: String,
    choices: Vec<String>,
}

impl Enum {
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            value: String::new(),
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    pub fn get(&self) -> &str {
        &self.value
    }
}

pub(super) fn check_choice(choices: &[String], raw: &str) -> Result<(), ParseError> {
    if choices.iter().any(|c| c == raw) {
        Ok(())
    } else {
        Err(ParseError::new(format!(
            "invalid choice: {raw}, should be one of [{}]",
            choices.join(" ")
        )))
    }
}

impl fmt::Display for Enum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl Value for Enum {
    fn set(&mut self, raw: &str) -> Result<(), ParseError> {
        check_choice(&self.choices, raw)?;
        self.value = raw.to_string();
        Ok(())
    }

    fn type_name(&self) -> String {
        format!("enum[{}]", self.choices.join("\\|"))
    }

    fn choices(&self) -> Option<&[String]> {
        Some(&self.choices)
    }
}

/// A path to a YAML document that supplies option values.
///
/// During dispatch every option holding one of these is read after flags and
/// environment variables have been applied, and the document is applied to
/// the command's options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YamlConfigPath(String);

impl YamlConfigPath {
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for YamlConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Value for YamlConfigPath {
    fn set(&mut self, raw: &str) -> Result<(), ParseError> {
        self.0 = raw.to_string();
        Ok(())
    }

    fn type_name(&self) -> String {
        "yaml-config-path".into()
    }

    fn config_path(&self) -> Option<&str> {
        (!self.0.is_empty()).then_some(self.0.as_str())
    }
}

/// Accepts anything and keeps nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Discard;

impl fmt::Display for Discard {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

impl Value for Discard {
    fn set(&mut self, _raw: &str) -> Result<(), ParseError> {
        Ok(())
    }

    fn type_name(&self) -> String {
        "discard".into()
    }

    fn set_yaml(&mut self, _node: &serde_yaml::Value) -> Result<(), ParseError> {
        Ok(())
    }

    fn set_json(&mut self, _json: &serde_json::Value) -> Result<(), ParseError> {
        Ok(())
    }
}
