//! Value provenance.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which binding supplied an option's current value.
///
/// Sources are totally ordered by precedence, highest first:
/// `Flag > Env > Yaml > Default > None`. A lower-priority stage never
/// overwrites a value set by a higher one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    #[default]
    #[serde(rename = "")]
    None,
    Flag,
    Env,
    Yaml,
    Default,
}

impl ValueSource {
    /// Precedence rank; larger wins.
    pub fn priority(self) -> u8 {
        match self {
            ValueSource::None => 0,
            ValueSource::Default => 1,
            ValueSource::Yaml => 2,
            ValueSource::Env => 3,
            ValueSource::Flag => 4,
        }
    }

    /// Returns true once any binding has supplied a value.
    pub fn is_set(self) -> bool {
        self != ValueSource::None
    }

    /// Returns true for sources a user controls directly at invocation time.
    pub fn is_user(self) -> bool {
        matches!(self, ValueSource::Flag | ValueSource::Env)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueSource::None => "",
            ValueSource::Flag => "flag",
            ValueSource::Env => "env",
            ValueSource::Yaml => "yaml",
            ValueSource::Default => "default",
        }
    }
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
