//! JSON encoding of option sets.
//!
//! Options serialize to a JSON array of records carrying their bindings,
//! metadata, provenance and current value. Decoding matches records to
//! existing options by name and decodes each value into the existing slot,
//! since a record alone does not say what type its value has.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Errors, Result};
use crate::group::{Annotations, Group};
use crate::option::Opt;
use crate::option_set::OptionSet;
use crate::source::ValueSource;
use crate::value::ValueRef;
use crate::yaml::Strictness;

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_unset(s: &ValueSource) -> bool {
    !s.is_set()
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OptRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(default, skip_serializing_if = "is_false")]
    required: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    flag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    flag_shorthand: Option<char>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    env: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    yaml: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    default: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    annotations: Annotations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<Group>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    use_instead: Vec<OptRecord>,
    #[serde(default, skip_serializing_if = "is_false")]
    hidden: bool,
    #[serde(default, skip_serializing_if = "is_unset")]
    value_source: ValueSource,
}

impl From<&Opt> for OptRecord {
    fn from(opt: &Opt) -> Self {
        Self {
            name: opt.name.clone(),
            description: opt.description.clone(),
            required: opt.required,
            flag: opt.flag.clone(),
            flag_shorthand: opt.flag_shorthand,
            env: opt.env.clone(),
            yaml: opt.yaml.clone(),
            default: opt.default.clone(),
            value: opt.value.as_ref().map(|v| v.borrow().to_json()),
            annotations: opt.annotations.clone(),
            group: opt.group.clone(),
            use_instead: opt.use_instead.iter().map(OptRecord::from).collect(),
            hidden: opt.hidden,
            value_source: opt.value_source,
        }
    }
}

impl OptRecord {
    /// Copies the record's metadata onto `opt`. Value and completion
    /// handler stay as they are.
    fn apply_metadata(self, opt: &mut Opt) {
        opt.name = self.name;
        opt.description = self.description;
        opt.required = self.required;
        opt.flag = self.flag;
        opt.flag_shorthand = self.flag_shorthand;
        opt.env = self.env;
        opt.yaml = self.yaml;
        opt.default = self.default;
        opt.annotations = self.annotations;
        opt.group = self.group;
        opt.use_instead = self.use_instead.into_iter().map(OptRecord::into_opt).collect();
        opt.hidden = self.hidden;
        opt.value_source = self.value_source;
    }

    /// Builds a detached option whose value is discarded.
    fn into_opt(self) -> Opt {
        let mut opt = Opt::default().value(ValueRef::discard());
        self.apply_metadata(&mut opt);
        opt
    }
}

impl OptionSet {
    /// Encodes the set as a JSON array.
    pub fn to_json(&self) -> Result<String> {
        let records: Vec<OptRecord> = self.iter().map(OptRecord::from).collect();
        Ok(serde_json::to_string(&records)?)
    }

    /// Decodes a JSON array produced by [`OptionSet::to_json`].
    ///
    /// Records are matched to existing options by name. A matched option
    /// takes the record's metadata and its value is decoded into the
    /// existing slot. Unmatched records are errors when strict; otherwise
    /// they are appended with a discarding value so their metadata survives
    /// while their value is dropped.
    pub fn apply_json(&mut self, data: &str, strictness: Strictness) -> Result<()> {
        let records: Vec<OptRecord> = serde_json::from_str(data)?;
        let mut errs = Errors::new();
        for mut record in records {
            let Some(opt) = self.by_name_mut(&record.name) else {
                if strictness == Strictness::Strict {
                    errs.push(Error::UnknownOption(record.name));
                } else {
                    self.add(record.into_opt());
                }
                continue;
            };
            if let (Some(json), Some(value)) = (record.value.take(), &opt.value) {
                if let Err(source) = value.borrow_mut().set_json(&json) {
                    errs.push(Error::Parse {
                        option: record.name.clone(),
                        source,
                    });
                    continue;
                }
            }
            record.apply_metadata(opt);
        }
        errs.into_result()
    }
}
