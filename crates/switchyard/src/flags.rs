//! The flag set.
//!
//! A [`FlagSet`] maps long names and shorthands to shared value slots and
//! parses an argument vector against them. Tokens are classified with
//! `clap_lex`; the flag semantics follow POSIX-style conventions:
//!
//! - `--name value`, `--name=value`, `-n value`, `-nvalue` and `-n=value`
//! - flags with a no-argument default (booleans) never consume the next token
//! - shorthand clusters such as `-abc` expand to `-a -b -c`
//! - `--` ends flag parsing; everything after it is positional
//! - `-` and negative numbers are positional
//!
//! Positional arguments may be interleaved with flags. They are collected in
//! order and returned by [`FlagSet::args`].
//!
//! Parsing is meant to be repeated: dispatch parses the same argument vector
//! once per command depth against a growing set of flags. Each flag records
//! the argument positions it was applied from, and a later pass skips only
//! those positions, so occurrences an earlier pass never reached still
//! apply in order. A list flag is cleared before its first command-line
//! value so that values from other sources are replaced rather than
//! extended.

use std::collections::HashSet;
use std::ffi::OsStr;

use clap_lex::RawArgs;

use crate::error::{Error, FlagError, Result};
use crate::value::ValueRef;

/// One registered flag.
#[derive(Debug, Clone)]
pub struct Flag {
    pub name: String,
    pub shorthand: Option<char>,
    pub usage: String,
    pub value: ValueRef,
    /// Assigned when the flag appears without an argument.
    pub no_opt_default: Option<String>,
    pub hidden: bool,
    /// Set once the flag has been applied from the command line.
    pub changed: bool,
    /// Argument positions already applied, as (token index, cluster offset).
    applied: HashSet<(usize, usize)>,
}

impl Flag {
    pub fn new(name: impl Into<String>, value: ValueRef) -> Self {
        let no_opt_default = value.borrow().no_opt_default().map(str::to_string);
        Self {
            name: name.into(),
            shorthand: None,
            usage: String::new(),
            value,
            no_opt_default,
            hidden: false,
            changed: false,
            applied: HashSet::new(),
        }
    }

    pub fn shorthand(mut self, c: Option<char>) -> Self {
        self.shorthand = c;
        self
    }

    pub fn usage(mut self, text: impl Into<String>) -> Self {
        self.usage = text.into();
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Returns true if the flag never consumes the following token.
    pub fn takes_no_value(&self) -> bool {
        self.no_opt_default.is_some()
    }
}

/// An ordered set of flags plus the positional residue of the last parse.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    flags: Vec<Flag>,
    args: Vec<String>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a flag.
    ///
    /// Fails if the long name or the shorthand is already taken.
    pub fn add(&mut self, flag: Flag) -> Result<()> {
        if self.lookup(&flag.name).is_some() {
            return Err(Error::DuplicateFlag(flag.name));
        }
        if let Some(c) = flag.shorthand {
            if let Some(existing) = self.lookup_shorthand(c) {
                return Err(Error::DuplicateShorthand {
                    shorthand: c,
                    flag: flag.name,
                    existing: existing.name.clone(),
                });
            }
        }
        self.flags.push(flag);
        Ok(())
    }

    /// Rebuilds the set without the flag called `name`.
    ///
    /// Flags cannot be removed in place; overriding an inherited flag is
    /// done by rebuilding without it and adding the replacement. Parse
    /// state of the remaining flags is preserved.
    pub fn without(&self, name: &str) -> FlagSet {
        FlagSet {
            flags: self
                .flags
                .iter()
                .filter(|f| f.name != name)
                .cloned()
                .collect(),
            args: self.args.clone(),
        }
    }

    /// Adds every flag of `other`, replacing flags that share a long name.
    pub fn merge_override(&mut self, other: FlagSet) -> Result<()> {
        for flag in other.flags {
            if self.lookup(&flag.name).is_some() {
                *self = self.without(&flag.name);
            }
            self.add(flag)?;
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.name == name)
    }

    pub fn lookup_shorthand(&self, c: char) -> Option<&Flag> {
        self.flags.iter().find(|f| f.shorthand == Some(c))
    }

    /// Returns true if `name` was given on the command line.
    pub fn changed(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|f| f.changed)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Flag> {
        self.flags.iter()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Positional arguments left over from the last [`FlagSet::parse`].
    ///
    /// After a failed parse this holds the arguments collected before the
    /// failure.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Parses `args`, applying flag values and collecting positionals.
    pub fn parse(&mut self, args: &[String]) -> std::result::Result<(), FlagError> {
        self.args.clear();

        let raw = RawArgs::new(args.iter());
        let mut cursor = raw.cursor();
        let mut pos = 0;
        while let Some(arg) = raw.next(&mut cursor) {
            let at = pos;
            pos += 1;
            if arg.is_escape() {
                self.args.extend(raw.remaining(&mut cursor).map(lossy));
                break;
            }
            if arg.is_empty() || arg.is_stdio() || arg.is_negative_number() {
                self.args.push(lossy(arg.to_value_os()));
                continue;
            }
            if let Some((name, inline)) = arg.to_long() {
                let name = name.map_err(|n| FlagError::NotUnicode(lossy(n)))?;
                let inline = match inline {
                    Some(v) => Some(v.to_str().ok_or_else(|| FlagError::NotUnicode(lossy(v)))?),
                    None => None,
                };
                let mut consumed = false;
                self.parse_long(name, inline, at, || {
                    consumed = true;
                    raw.next_os(&mut cursor)
                })?;
                if consumed {
                    pos += 1;
                }
                continue;
            }
            if arg.is_short() {
                let token = arg
                    .to_value()
                    .map_err(|v| FlagError::NotUnicode(lossy(v)))?;
                let cluster = &token[1..];
                let mut consumed = false;
                self.parse_short(cluster, at, || {
                    consumed = true;
                    raw.next_os(&mut cursor)
                })?;
                if consumed {
                    pos += 1;
                }
                continue;
            }
            self.args.push(lossy(arg.to_value_os()));
        }
        Ok(())
    }

    fn parse_long<'a>(
        &mut self,
        name: &str,
        inline: Option<&str>,
        at: usize,
        next: impl FnOnce() -> Option<&'a OsStr>,
    ) -> std::result::Result<(), FlagError> {
        if name.is_empty() || name.starts_with('-') {
            return Err(FlagError::BadSyntax(format!("--{name}")));
        }
        let Some(idx) = self.flags.iter().position(|f| f.name == name) else {
            if name == "help" {
                return Err(FlagError::Help);
            }
            return Err(FlagError::UnknownFlag(name.to_string()));
        };
        let value = match (inline, &self.flags[idx].no_opt_default) {
            (Some(v), _) => v.to_string(),
            (None, Some(default)) => default.clone(),
            (None, None) => match next() {
                Some(v) => lossy(v),
                None => return Err(FlagError::MissingArgument(name.to_string())),
            },
        };
        self.apply(idx, &value, (at, 0))
    }

    fn parse_short<'a>(
        &mut self,
        cluster: &str,
        at: usize,
        next: impl FnOnce() -> Option<&'a OsStr>,
    ) -> std::result::Result<(), FlagError> {
        let mut rest = cluster;
        let mut next = Some(next);
        while let Some(c) = rest.chars().next() {
            let offset = cluster.len() - rest.len() + 1;
            let after = &rest[c.len_utf8()..];
            let Some(idx) = self.flags.iter().position(|f| f.shorthand == Some(c)) else {
                if c == 'h' {
                    return Err(FlagError::Help);
                }
                return Err(FlagError::UnknownShorthand {
                    shorthand: c,
                    cluster: cluster.to_string(),
                });
            };
            let value;
            if let Some(inline) = after.strip_prefix('=').filter(|v| !v.is_empty()) {
                value = inline.to_string();
                rest = "";
            } else if let Some(default) = &self.flags[idx].no_opt_default {
                value = default.clone();
                rest = after;
            } else if !after.is_empty() {
                value = after.to_string();
                rest = "";
            } else {
                match next.take().and_then(|take| take()) {
                    Some(v) => value = lossy(v),
                    None => {
                        return Err(FlagError::MissingArgument(
                            self.flags[idx].name.clone(),
                        ))
                    }
                }
                rest = "";
            }
            self.apply(idx, &value, (at, offset))?;
        }
        Ok(())
    }

    fn apply(
        &mut self,
        idx: usize,
        value: &str,
        position: (usize, usize),
    ) -> std::result::Result<(), FlagError> {
        let flag = &mut self.flags[idx];
        if flag.applied.contains(&position) {
            return Ok(());
        }
        if flag.applied.is_empty() && flag.value.borrow().is_slice() {
            flag.value.borrow_mut().reset();
        }
        flag.value
            .set(value)
            .map_err(|source| FlagError::InvalidValue {
                flag: flag.name.clone(),
                value: value.to_string(),
                source,
            })?;
        flag.applied.insert(position);
        flag.changed = true;
        Ok(())
    }
}

fn lossy(s: &OsStr) -> String {
    s.to_string_lossy().into_owned()
}
