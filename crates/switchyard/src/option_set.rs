//! Option collections and source resolution.
//!
//! Resolution runs in a fixed order at every command: environment, flags,
//! config documents, then defaults. Each stage is an independent method on
//! [`OptionSet`] so it can be exercised in isolation:
//!
//! | stage | method | source |
//! |-------|--------|--------|
//! | environment | [`OptionSet::apply_env`] | [`ValueSource::Env`] |
//! | flags | [`FlagSet::parse`] + [`OptionSet::mark_flag_sources`] | [`ValueSource::Flag`] |
//! | YAML | [`OptionSet::apply_yaml`] | [`ValueSource::Yaml`] |
//! | defaults | [`OptionSet::set_defaults`] | [`ValueSource::Default`] |
//!
//! Options that hold handles to the same value slot are resolved as one
//! unit: the winning source is copied to every alias, and at most one
//! distinct default may be declared across them.

use std::collections::{HashMap, HashSet};
use std::ops::{Deref, DerefMut};

use tracing::trace;

use crate::environ::Environ;
use crate::error::{Error, Errors, Result};
use crate::flags::{Flag, FlagSet};
use crate::option::Opt;
use crate::source::ValueSource;
use crate::value::{ValueId, ValueRef};

/// An ordered list of options belonging to one command.
///
/// Names are not required to be unique.
#[derive(Debug, Clone, Default)]
pub struct OptionSet(Vec<Opt>);

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, opt: Opt) {
        self.0.push(opt);
    }

    /// Returns a copy holding only the options `keep` accepts.
    ///
    /// Value handles are shared with the original set.
    pub fn filter(&self, keep: impl Fn(&Opt) -> bool) -> OptionSet {
        OptionSet(self.0.iter().filter(|o| keep(o)).cloned().collect())
    }

    pub fn by_name(&self, name: &str) -> Option<&Opt> {
        self.0.iter().find(|o| o.name == name)
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut Opt> {
        self.0.iter_mut().find(|o| o.name == name)
    }

    /// Finds the option bound to the long flag `flag`. An empty flag never
    /// matches.
    pub fn by_flag(&self, flag: &str) -> Option<&Opt> {
        if flag.is_empty() {
            return None;
        }
        self.0.iter().find(|o| o.flag == flag)
    }

    /// Builds a flag set from every option with a flag binding.
    ///
    /// Options without a value get a discarding slot so the flag is still
    /// accepted.
    pub fn flag_set(&self) -> Result<FlagSet> {
        let mut fs = FlagSet::new();
        for opt in self.0.iter().filter(|o| !o.flag.is_empty()) {
            let value = opt.value.clone().unwrap_or_else(ValueRef::discard);
            fs.add(
                Flag::new(&opt.flag, value)
                    .shorthand(opt.flag_shorthand)
                    .usage(&opt.description)
                    .hidden(opt.hidden),
            )?;
        }
        Ok(fs)
    }

    /// Applies environment bindings from `env`.
    ///
    /// A binding `NAME` that is absent is retried as `HOMEBREW_NAME`. Empty
    /// values count as unset. Options already set from a flag are left
    /// alone. Parse failures are collected; every option is attempted.
    pub fn apply_env(&mut self, env: &Environ) -> Result<()> {
        let mut errs = Errors::new();
        for opt in self.0.iter_mut().filter(|o| !o.env.is_empty()) {
            let Some((found_as, raw)) = env.lookup_with_fallback(&opt.env) else {
                continue;
            };
            if raw.is_empty() {
                trace!(option = %opt.name, env = %found_as, "empty environment value treated as unset");
                continue;
            }
            if opt.value_source.priority() > ValueSource::Env.priority() {
                continue;
            }
            let Some(value) = &opt.value else {
                errs.push(Error::NoValue(opt.name.clone()));
                continue;
            };
            opt.value_source = ValueSource::Env;
            trace!(option = %opt.name, env = %found_as, "applying environment value");
            if let Err(source) = value.set(raw) {
                errs.push(Error::Parse {
                    option: opt.name.clone(),
                    source,
                });
            }
        }
        errs.into_result()
    }

    /// Marks options whose flag was given on the command line.
    ///
    /// Only flags that still point at the option's own value count, so an
    /// inherited flag overridden by a deeper command does not mark the
    /// ancestor's option. Aliases of a marked option are marked too.
    pub fn mark_flag_sources(&mut self, flags: &FlagSet) {
        let mut marked: HashSet<ValueId> = HashSet::new();
        for opt in self.0.iter_mut() {
            let (Some(flag), Some(value)) = (flags.lookup(&opt.flag), &opt.value) else {
                continue;
            };
            if flag.changed && flag.value.same_slot(value) {
                trace!(option = %opt.name, flag = %flag.name, "value supplied by flag");
                opt.value_source = ValueSource::Flag;
                marked.insert(value.id());
            }
        }
        for opt in self.0.iter_mut() {
            if opt.value.as_ref().is_some_and(|v| marked.contains(&v.id())) {
                opt.value_source = ValueSource::Flag;
            }
        }
    }

    /// Applies defaults to every value slot no other source has set.
    ///
    /// Options are grouped by value identity. A group with a set source
    /// copies it to all members and is not touched; otherwise its single
    /// default literal is parsed and every member is marked
    /// [`ValueSource::Default`]. Two different non-empty defaults in one
    /// group are a conflict. Running this twice is a no-op the second time.
    pub fn set_defaults(&mut self) -> Result<()> {
        let mut errs = Errors::new();
        let mut order: Vec<ValueId> = Vec::new();
        let mut groups: HashMap<ValueId, Vec<usize>> = HashMap::new();
        for (i, opt) in self.0.iter().enumerate() {
            let Some(value) = &opt.value else {
                errs.push(Error::NoValue(opt.name.clone()));
                continue;
            };
            groups
                .entry(value.id())
                .or_insert_with(|| {
                    order.push(value.id());
                    Vec::new()
                })
                .push(i);
        }

        for id in order {
            let mut members = groups.remove(&id).unwrap_or_default();
            members.sort_by(|&a, &b| {
                let (a, b) = (&self.0[a], &self.0[b]);
                b.value_source
                    .priority()
                    .cmp(&a.value_source.priority())
                    .then_with(|| a.default.is_empty().cmp(&b.default.is_empty()))
            });

            let best = self.0[members[0]].value_source;
            if best.is_set() {
                for &i in &members[1..] {
                    self.0[i].value_source = best;
                }
                continue;
            }

            let mut chosen: Option<usize> = None;
            let mut conflict = false;
            for &i in &members {
                let opt = &self.0[i];
                if opt.default.is_empty() {
                    continue;
                }
                match chosen {
                    Some(c) if self.0[c].default != opt.default => {
                        errs.push(Error::ConflictingDefaults {
                            option: opt.name.clone(),
                            default: opt.default.clone(),
                            other_option: self.0[c].name.clone(),
                            other_default: self.0[c].default.clone(),
                        });
                        conflict = true;
                    }
                    Some(_) => {}
                    None => chosen = Some(i),
                }
            }
            let Some(c) = chosen.filter(|_| !conflict) else {
                continue;
            };

            let opt = &self.0[c];
            trace!(option = %opt.name, default = %opt.default, "applying default");
            if let Some(value) = &opt.value {
                if let Err(source) = value.set(&opt.default) {
                    errs.push(Error::Parse {
                        option: opt.name.clone(),
                        source,
                    });
                }
            }
            for &i in &members {
                self.0[i].value_source = ValueSource::Default;
            }
        }
        errs.into_result()
    }

    /// Names of required options that ended up without a source.
    ///
    /// Options without a name are reported by flag.
    pub fn missing_required(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|o| o.required && !o.value_source.is_set())
            .map(|o| {
                if o.name.is_empty() {
                    o.flag.clone()
                } else {
                    o.name.clone()
                }
            })
            .collect()
    }

    /// Paths of every YAML config document referenced by the set's values.
    pub fn config_paths(&self) -> Vec<String> {
        self.0
            .iter()
            .filter_map(|o| o.value.as_ref())
            .filter_map(|v| v.borrow().config_path().map(str::to_string))
            .collect()
    }

    pub fn into_inner(self) -> Vec<Opt> {
        self.0
    }
}

impl Deref for OptionSet {
    type Target = Vec<Opt>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for OptionSet {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Opt>> for OptionSet {
    fn from(opts: Vec<Opt>) -> Self {
        Self(opts)
    }
}

impl FromIterator<Opt> for OptionSet {
    fn from_iter<T: IntoIterator<Item = Opt>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for OptionSet {
    type Item = Opt;
    type IntoIter = std::vec::IntoIter<Opt>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a OptionSet {
    type Item = &'a Opt;
    type IntoIter = std::slice::Iter<'a, Opt>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
