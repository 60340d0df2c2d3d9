//! Structured values carried through serde.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Value;
use crate::error::ParseError;

/// An arbitrary serde type.
///
/// On the command line and in the environment the value is written as YAML
/// (and therefore also accepts JSON). It renders as compact JSON and is
/// carried natively in structured documents.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use switchyard::{Struct, Value};
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct Limits {
///     cpu: u32,
///     memory: String,
/// }
///
/// let mut limits = Struct::<Limits>::default();
/// limits.set(r#"{"cpu": 2, "memory": "1G"}"#).unwrap();
/// assert_eq!(limits.get().cpu, 2);
/// assert_eq!(limits.to_string(), r#"{"cpu":2,"memory":"1G"}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Struct<T>(T);

impl<T> Struct<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn get(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize> fmt::Display for Struct<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl<T> Value for Struct<T>
where
    T: Serialize + DeserializeOwned + fmt::Debug,
{
    fn set(&mut self, raw: &str) -> Result<(), ParseError> {
        self.0 = serde_yaml::from_str(raw).map_err(ParseError::from_display)?;
        Ok(())
    }

    fn type_name(&self) -> String {
        "struct".into()
    }

    fn to_yaml(&self) -> Result<serde_yaml::Value, ParseError> {
        serde_yaml::to_value(&self.0).map_err(ParseError::from_display)
    }

    fn set_yaml(&mut self, node: &serde_yaml::Value) -> Result<(), ParseError> {
        self.0 = serde_yaml::from_value(node.clone()).map_err(ParseError::from_display)?;
        Ok(())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.0).unwrap_or(serde_json::Value::Null)
    }

    fn set_json(&mut self, json: &serde_json::Value) -> Result<(), ParseError> {
        self.0 = serde_json::from_value(json.clone()).map_err(ParseError::from_display)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Pair {
        left: String,
        right: i64,
    }

    #[test]
    fn test_set_from_yaml_text() {
        let mut s = Struct::<Pair>::default();
        s.set("left: a\nright: 3").unwrap();
        assert_eq!(
            s.get(),
            &Pair {
                left: "a".into(),
                right: 3
            }
        );
    }

    #[test]
    fn test_set_rejects_wrong_shape() {
        let mut s = Struct::<Pair>::default();
        assert!(s.set("[1, 2]").is_err());
    }

    #[test]
    fn test_yaml_node_roundtrip() {
        let s = Struct::new(Pair {
            left: "x".into(),
            right: -1,
        });
        let node = s.to_yaml().unwrap();
        let mut back = Struct::<Pair>::default();
        back.set_yaml(&node).unwrap();
        assert_eq!(back, s);
    }
}
