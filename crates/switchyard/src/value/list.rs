//! List-valued slots.
//!
//! Lists use CSV on the command line and in the environment, so
//! `--name=a,b` and `--name a --name b` both yield `[a, b]`. Structured
//! documents carry them as sequences.

use std::fmt;

use super::scalar::check_choice;
use super::{yaml_kind, yaml_scalar, Value};
use crate::error::ParseError;

fn read_csv(raw: &str) -> Result<Vec<String>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_bytes());
    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(ParseError::from_display)?;
        out.extend(record.iter().map(str::to_string));
    }
    Ok(out)
}

fn write_csv(values: &[String]) -> String {
    if values.is_empty() {
        return String::new();
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if writer.write_record(values).is_err() {
        return values.join(",");
    }
    match writer.into_inner() {
        Ok(bytes) => String::from_utf8_lossy(&bytes)
            .trim_end_matches(['\r', '\n'])
            .to_string(),
        Err(_) => values.join(","),
    }
}

fn yaml_items(node: &serde_yaml::Value) -> Result<Vec<String>, ParseError> {
    match node {
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .map(|item| {
                yaml_scalar(item).ok_or_else(|| {
                    ParseError::new(format!("expected a scalar item, got {}", yaml_kind(item)))
                })
            })
            .collect(),
        serde_yaml::Value::Null => Ok(Vec::new()),
        other => match yaml_scalar(other) {
            Some(raw) => read_csv(&raw),
            None => Err(ParseError::new(format!(
                "expected a sequence, got {}",
                yaml_kind(other)
            ))),
        },
    }
}

fn json_items(json: &serde_json::Value) -> Result<Vec<String>, ParseError> {
    match json {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| match item {
                serde_json::Value::String(s) => Ok(s.clone()),
                serde_json::Value::Number(n) => Ok(n.to_string()),
                serde_json::Value::Bool(b) => Ok(b.to_string()),
                other => Err(ParseError::new(format!("expected a scalar item, got {other}"))),
            })
            .collect(),
        serde_json::Value::Null => Ok(Vec::new()),
        other => Err(ParseError::new(format!("expected an array, got {other}"))),
    }
}

/// A list of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringArray(Vec<String>);

impl StringArray {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }

    pub fn get(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for StringArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&write_csv(&self.0))
    }
}

impl Value for StringArray {
    /// Appends the CSV items in `raw`. An empty string clears the list.
    fn set(&mut self, raw: &str) -> Result<(), ParseError> {
        if raw.is_empty() {
            self.0.clear();
            return Ok(());
        }
        let items = read_csv(raw)?;
        self.0.extend(items);
        Ok(())
    }

    fn type_name(&self) -> String {
        "string-array".into()
    }

    fn is_slice(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        self.0.clear();
    }

    fn to_yaml(&self) -> Result<serde_yaml::Value, ParseError> {
        Ok(serde_yaml::Value::Sequence(
            self.0.iter().cloned().map(serde_yaml::Value::String).collect(),
        ))
    }

    fn set_yaml(&mut self, node: &serde_yaml::Value) -> Result<(), ParseError> {
        self.0 = yaml_items(node)?;
        Ok(())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self.0.clone())
    }

    fn set_json(&mut self, json: &serde_json::Value) -> Result<(), ParseError> {
        self.0 = json_items(json)?;
        Ok(())
    }
}

/// A list whose items are restricted to a fixed set of choices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumArray {
    values: Vec<String>,
    choices: Vec<String>,
}

impl EnumArray {
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: Vec::new(),
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    pub fn get(&self) -> &[String] {
        &self.values
    }

    fn checked(&self, items: Vec<String>) -> Result<Vec<String>, ParseError> {
        for item in &items {
            check_choice(&self.choices, item)?;
        }
        Ok(items)
    }
}

impl fmt::Display for EnumArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&write_csv(&self.values))
    }
}

impl Value for EnumArray {
    fn set(&mut self, raw: &str) -> Result<(), ParseError> {
        if raw.is_empty() {
            self.values.clear();
            return Ok(());
        }
        let items = self.checked(read_csv(raw)?)?;
        self.values.extend(items);
        Ok(())
    }

    fn type_name(&self) -> String {
        format!("enum-array[{}]", self.choices.join("\\|"))
    }

    fn choices(&self) -> Option<&[String]> {
        Some(&self.choices)
    }

    fn is_slice(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        self.values.clear();
    }

    fn to_yaml(&self) -> Result<serde_yaml::Value, ParseError> {
        Ok(serde_yaml::Value::Sequence(
            self.values.iter().cloned().map(serde_yaml::Value::String).collect(),
        ))
    }

    fn set_yaml(&mut self, node: &serde_yaml::Value) -> Result<(), ParseError> {
        self.values = self.checked(yaml_items(node)?)?;
        Ok(())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self.values.clone())
    }

    fn set_json(&mut self, json: &serde_json::Value) -> Result<(), ParseError> {
        self.values = self.checked(json_items(json)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_appends_csv_items() {
        let mut a = StringArray::default();
        a.set("a,b").unwrap();
        a.set("c").unwrap();
        assert_eq!(a.get(), ["a", "b", "c"]);
        assert_eq!(a.to_string(), "a,b,c");
    }

    #[test]
    fn test_set_empty_clears() {
        let mut a = StringArray::new(["x"]);
        a.set("").unwrap();
        assert!(a.get().is_empty());
        assert_eq!(a.to_string(), "");
    }

    #[test]
    fn test_quoted_items_keep_commas() {
        let mut a = StringArray::default();
        a.set("\"a,b\",c").unwrap();
        assert_eq!(a.get(), ["a,b", "c"]);
        assert_eq!(a.to_string(), "\"a,b\",c");
    }

    #[test]
    fn test_yaml_sequence_replaces() {
        let mut a = StringArray::new(["old"]);
        let node: serde_yaml::Value = serde_yaml::from_str("[x, 2, true]").unwrap();
        a.set_yaml(&node).unwrap();
        assert_eq!(a.get(), ["x", "2", "true"]);
    }

    #[test]
    fn test_enum_array_validates_items() {
        let mut e = EnumArray::new(["red", "blue"]);
        e.set("red,blue").unwrap();
        assert_eq!(e.get(), ["red", "blue"]);
        assert!(e.set("red,green").is_err());
        assert_eq!(e.get(), ["red", "blue"]);
        assert_eq!(e.type_name(), "enum-array[red\\|blue]");
    }

    #[test]
    fn test_json_array_roundtrip() {
        let mut a = StringArray::new(["p", "q"]);
        let json = a.to_json();
        a.reset();
        a.set_json(&json).unwrap();
        assert_eq!(a.get(), ["p", "q"]);
    }
}
