//! YAML config documents.
//!
//! An option with a YAML key lives at its dotted path: the YAML keys of its
//! group ancestry followed by its own key. Marshaling builds nested mappings
//! along those paths; unmarshaling walks the document and applies every
//! node whose path names an option.
//!
//! ```rust
//! use switchyard::{Group, Opt, OptionSet, Shared, StringArray, Strictness, ValueSource};
//!
//! let names = Shared::new(StringArray::default());
//! let family = Group::new("Family").yaml("family");
//! let kids = Group::new("Kids").yaml("kids").parent(family);
//! let mut opts = OptionSet::from(vec![Opt::new("Names")
//!     .yaml("names")
//!     .group(kids)
//!     .value(names.handle())]);
//!
//! let doc = serde_yaml::from_str("family:\n  kids:\n    names: [jill, jack]\n").unwrap();
//! opts.apply_yaml(&doc, Strictness::Strict).unwrap();
//!
//! assert_eq!(names.borrow().get(), ["jill", "jack"]);
//! assert_eq!(opts[0].value_source, ValueSource::Yaml);
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde_yaml::{Mapping, Value as Node};
use tracing::{debug, trace};

use crate::error::{Error, Errors, Result};
use crate::option::Opt;
use crate::option_set::OptionSet;
use crate::source::ValueSource;
use crate::value::{yaml_scalar, ValueId};

/// How to treat document entries that match no option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// Unknown entries are errors.
    Strict,
    /// Unknown entries are skipped.
    Lenient,
}

/// Marshaling switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlMarshal {
    /// Leave out options no source has set.
    pub omit_unset: bool,
}

/// Reads and parses the YAML document at `path`.
pub fn load_yaml(path: &Path) -> Result<Node> {
    debug!(path = %path.display(), "reading yaml config");
    let text = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_yaml::from_str(&text)?)
}

/// Dotted path segments for `opt`, or `None` without a YAML key.
fn segments(opt: &Opt) -> Result<Option<Vec<&str>>> {
    if opt.yaml.is_empty() {
        return Ok(None);
    }
    let mut out = Vec::new();
    if let Some(group) = &opt.group {
        for seg in group.yaml_segments() {
            if seg.is_empty() {
                return Err(Error::EmptyGroupYaml(opt.name.clone()));
            }
            out.push(seg);
        }
    }
    out.push(opt.yaml.as_str());
    Ok(Some(out))
}

impl OptionSet {
    /// Marshals every option with a YAML key into a nested mapping.
    pub fn to_yaml(&self) -> Result<Node> {
        self.to_yaml_with(YamlMarshal::default())
    }

    pub fn to_yaml_with(&self, settings: YamlMarshal) -> Result<Node> {
        let mut root = Mapping::new();
        for opt in self.iter() {
            let Some(path) = segments(opt)? else {
                continue;
            };
            if settings.omit_unset && !opt.value_source.is_set() {
                continue;
            }
            let node = match &opt.value {
                Some(value) => value.borrow().to_yaml().map_err(|source| Error::Parse {
                    option: opt.name.clone(),
                    source,
                })?,
                None => Node::Null,
            };
            insert(&mut root, &path, node)?;
        }
        Ok(Node::Mapping(root))
    }

    /// Marshals to YAML text.
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_yaml()?)?)
    }

    /// Applies a YAML document.
    ///
    /// Options whose slot was already set by a flag or environment variable
    /// are skipped. Applied options are marked [`ValueSource::Yaml`]. Paths
    /// missing from the document leave their options untouched. Every
    /// problem is collected before returning.
    pub fn apply_yaml(&mut self, doc: &Node, strictness: Strictness) -> Result<()> {
        let root = match doc {
            Node::Null => return Ok(()),
            Node::Mapping(m) => m,
            Node::Tagged(t) => match &t.value {
                Node::Mapping(m) => m,
                _ => return Err(Error::NotMapping(String::new())),
            },
            _ => return Err(Error::NotMapping(String::new())),
        };

        let mut errs = Errors::new();
        let mut known: HashSet<String> = HashSet::new();
        for opt in self.iter() {
            match segments(opt) {
                Ok(Some(path)) => {
                    known.insert(path.join("."));
                }
                Ok(None) => {}
                Err(e) => errs.push(e),
            }
        }

        let mut matched: HashMap<String, &Node> = HashMap::new();
        collect(root, "", &known, strictness, &mut matched, &mut errs);

        let overridden: HashSet<ValueId> = self
            .iter()
            .filter(|o| o.value_source.priority() > ValueSource::Yaml.priority())
            .filter_map(|o| o.value.as_ref().map(|v| v.id()))
            .collect();

        for opt in self.iter_mut() {
            let Ok(Some(path)) = segments(opt).map(|p| p.map(|p| p.join("."))) else {
                continue;
            };
            let Some(node) = matched.get(&path) else {
                continue;
            };
            let Some(value) = &opt.value else {
                errs.push(Error::NoValue(opt.name.clone()));
                continue;
            };
            if overridden.contains(&value.id()) {
                trace!(option = %opt.name, path = %path, "yaml value shadowed by higher source");
                continue;
            }
            trace!(option = %opt.name, path = %path, "applying yaml value");
            if let Err(source) = value.borrow_mut().set_yaml(node) {
                errs.push(Error::Parse {
                    option: opt.name.clone(),
                    source,
                });
                continue;
            }
            opt.value_source = ValueSource::Yaml;
        }
        errs.into_result()
    }
}

fn insert(root: &mut Mapping, path: &[&str], node: Node) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(());
    };
    let mut cursor = root;
    for (depth, seg) in parents.iter().enumerate() {
        let entry = cursor
            .entry(Node::String(seg.to_string()))
            .or_insert_with(|| Node::Mapping(Mapping::new()));
        cursor = match entry {
            Node::Mapping(m) => m,
            _ => return Err(Error::NotMapping(path[..=depth].join("."))),
        };
    }
    cursor.insert(Node::String(last.to_string()), node);
    Ok(())
}

fn collect<'a>(
    mapping: &'a Mapping,
    prefix: &str,
    known: &HashSet<String>,
    strictness: Strictness,
    matched: &mut HashMap<String, &'a Node>,
    errs: &mut Errors,
) {
    for (key, node) in mapping {
        let key = yaml_scalar(key).unwrap_or_default();
        let path = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        if known.contains(&path) {
            matched.insert(path, node);
            continue;
        }
        match node {
            Node::Mapping(child) => collect(child, &path, known, strictness, matched, errs),
            _ if strictness == Strictness::Strict => errs.push(Error::UnknownOption(path)),
            _ => {}
        }
    }
}
