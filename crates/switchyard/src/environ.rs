//! Environment snapshots.
//!
//! Resolution never reads the process environment directly. A run receives
//! an [`Environ`] captured up front (or built by hand in tests), so the same
//! inputs always resolve the same way.

use std::fmt;

/// Prefix tried when an option's environment binding is unset.
pub const FALLBACK_PREFIX: &str = "HOMEBREW_";

/// One `NAME=value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// An ordered snapshot of environment variables.
///
/// Names are case-sensitive and unique; setting an existing name replaces
/// its value in place.
///
/// ```rust
/// use switchyard::Environ;
///
/// let env = Environ::parse(["APP_TOKEN=abc", "PATH=/bin"], "APP_");
/// assert_eq!(env.get("TOKEN"), "abc");
/// assert_eq!(env.lookup("PATH"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environ(Vec<EnvVar>);

impl Environ {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `NAME=value` strings.
    ///
    /// With a non-empty `prefix`, only names carrying it are kept and the
    /// prefix is stripped. Entries without `=` are skipped.
    pub fn parse<I, S>(entries: I, prefix: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut env = Environ::new();
        for entry in entries {
            let Some((name, value)) = entry.as_ref().split_once('=') else {
                continue;
            };
            let Some(name) = name.strip_prefix(prefix) else {
                continue;
            };
            env.set(name, value);
        }
        env
    }

    /// Captures the process environment. Non-unicode entries are skipped.
    pub fn from_os(prefix: &str) -> Self {
        let entries = std::env::vars_os().filter_map(|(name, value)| {
            Some(format!("{}={}", name.into_string().ok()?, value.into_string().ok()?))
        });
        Self::parse(entries, prefix)
    }

    /// Adds a variable, replacing any existing value.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|var| var.name == name)
            .map(|var| var.value.as_str())
    }

    /// Returns the value of `name`, or an empty string when unset.
    pub fn get(&self, name: &str) -> &str {
        self.lookup(name).unwrap_or_default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|var| var.name == name) {
            Some(var) => var.value = value,
            None => self.0.push(EnvVar { name, value }),
        }
    }

    /// Looks up `name`, falling back to the [`FALLBACK_PREFIX`]ed name.
    ///
    /// Returns the value together with the name it was found under.
    pub fn lookup_with_fallback(&self, name: &str) -> Option<(String, &str)> {
        if let Some(value) = self.lookup(name) {
            return Some((name.to_string(), value));
        }
        let alt = format!("{FALLBACK_PREFIX}{name}");
        let value = self.lookup(&alt)?;
        Some((alt, value))
    }

    /// Renders the snapshot back to `NAME=value` strings.
    pub fn to_os(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnvVar> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environ {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut env = Environ::new();
        for (k, v) in iter {
            env.set(k, v);
        }
        env
    }
}
