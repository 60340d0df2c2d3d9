//! Option groups and annotations.
//!
//! Groups organize options for help output and nest their YAML keys. They
//! never affect precedence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A node in the option group hierarchy.
///
/// ```rust
/// use switchyard::Group;
///
/// let family = Group::new("Family").yaml("family");
/// let kids = Group::new("Kids").yaml("kids").parent(family);
///
/// assert_eq!(kids.full_name(), "Family / Kids");
/// assert_eq!(kids.yaml_segments(), vec!["family", "kids"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<Group>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub yaml: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn yaml(mut self, key: impl Into<String>) -> Self {
        self.yaml = key.into();
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn parent(mut self, parent: Group) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Returns the chain of groups from the root down to `self`.
    pub fn ancestry(&self) -> Vec<&Group> {
        let mut chain = vec![self];
        let mut cursor = self.parent.as_deref();
        while let Some(group) = cursor {
            chain.push(group);
            cursor = group.parent.as_deref();
        }
        chain.reverse();
        chain
    }

    /// Display names of the ancestry, joined by `" / "`.
    pub fn full_name(&self) -> String {
        self.ancestry()
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(" / ")
    }

    /// YAML keys of the ancestry, root first.
    pub fn yaml_segments(&self) -> Vec<&str> {
        self.ancestry().iter().map(|g| g.yaml.as_str()).collect()
    }
}

/// Free-form metadata attached to options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotations(BTreeMap<String, String>);

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `key` set to `value`.
    pub fn mark(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.0.insert(key.into(), value.into());
        next
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
