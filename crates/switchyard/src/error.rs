//! Error types for resolution and dispatch.
//!
//! Construction problems (duplicate names, conflicting defaults, lint
//! failures) abort a run before any handler executes. Per-option resolution
//! failures are collected into [`Errors`] so a user sees every problem in a
//! single pass.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A value could not be parsed from its textual or structured form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wraps any displayable error as a parse error.
    pub fn from_display(err: impl fmt::Display) -> Self {
        Self::new(err.to_string())
    }
}

/// A flag-set parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    /// `--help` or `-h` was given and no flag of that name exists.
    #[error("help requested")]
    Help,

    #[error("unknown flag: --{0}")]
    UnknownFlag(String),

    #[error("unknown shorthand flag: {shorthand:?} in -{cluster}")]
    UnknownShorthand { shorthand: char, cluster: String },

    #[error("flag needs an argument: {0}")]
    MissingArgument(String),

    #[error("invalid argument {value:?} for {flag:?} flag: {source}")]
    InvalidValue {
        flag: String,
        value: String,
        #[source]
        source: ParseError,
    },

    #[error("bad flag syntax: {0}")]
    BadSyntax(String),

    #[error("argument is not valid unicode: {0}")]
    NotUnicode(String),
}

impl FlagError {
    /// Returns true if this is the help sentinel.
    pub fn is_help(&self) -> bool {
        matches!(self, FlagError::Help)
    }
}

/// No child command matched and the command cannot take the arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown subcommand {:?}", .args.join(" "))]
pub struct UnknownSubcommandError {
    pub args: Vec<String>,
}

/// A handler returned an error.
///
/// The error is annotated with the full name of the command that ran it.
#[derive(Debug)]
pub struct RunCommandError {
    pub command: String,
    pub source: anyhow::Error,
}

impl fmt::Display for RunCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "running command {:?}: {:#}", self.command, self.source)
    }
}

impl std::error::Error for RunCommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

/// Errors produced by the switchyard engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse {option:?}: {source}")]
    Parse {
        option: String,
        #[source]
        source: ParseError,
    },

    #[error("parse {0:?}: no value set")]
    NoValue(String),

    #[error("parse {option:?}: multiple defaults set for the same value: {default:?} and {other_default:?} ({other_option:?})")]
    ConflictingDefaults {
        option: String,
        default: String,
        other_option: String,
        other_default: String,
    },

    #[error("duplicate command name: {0}")]
    DuplicateCommand(String),

    #[error("flag redefined: {0}")]
    DuplicateFlag(String),

    #[error("unable to redefine {shorthand:?} shorthand in {flag:?} flag: already used for {existing:?}")]
    DuplicateShorthand {
        shorthand: char,
        flag: String,
        existing: String,
    },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("command {command}: {source}")]
    InCommand {
        command: String,
        #[source]
        source: Box<Error>,
    },

    #[error("parsing flags ({args:?}) for {command:?}: {source}")]
    Flags {
        args: Vec<String>,
        command: String,
        #[source]
        source: FlagError,
    },

    #[error("missing values for the required flags: {}", .0.join(", "))]
    MissingRequired(Vec<String>),

    #[error(transparent)]
    UnknownSubcommand(#[from] UnknownSubcommandError),

    #[error(transparent)]
    RunCommand(#[from] RunCommandError),

    #[error("argument {0:?} not found")]
    ArgNotFound(String),

    #[error("unknown option {0:?}")]
    UnknownOption(String),

    #[error("group yaml name is empty for {0:?}")]
    EmptyGroupYaml(String),

    #[error("expected a mapping at {0:?}")]
    NotMapping(String),

    #[error("reading config {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decoding yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("decoding json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    Context {
        context: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("panic recovered for {command}: {message}")]
    Panic { command: String, message: String },

    #[error("writing output: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Multiple(Errors),
}

impl Error {
    /// Wraps the error with a short description of the stage that failed.
    pub fn context(context: &'static str, source: Error) -> Self {
        Error::Context {
            context,
            source: Box::new(source),
        }
    }

    /// Returns the unknown-subcommand error if this error is (or wraps) one.
    pub fn as_unknown_subcommand(&self) -> Option<&UnknownSubcommandError> {
        match self {
            Error::UnknownSubcommand(e) => Some(e),
            Error::RunCommand(e) => e.source.downcast_ref::<UnknownSubcommandError>(),
            Error::Context { source, .. } | Error::InCommand { source, .. } => {
                source.as_unknown_subcommand()
            }
            _ => None,
        }
    }

    /// Returns the names listed by a missing-required error.
    pub fn missing_required(&self) -> Option<&[String]> {
        match self {
            Error::MissingRequired(names) => Some(names),
            _ => None,
        }
    }
}

/// A collection of errors reported together.
#[derive(Debug, Default)]
pub struct Errors(Vec<Error>);

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: Error) {
        self.0.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }

    /// Converts the collection into a result.
    ///
    /// A single collected error is returned as itself rather than wrapped.
    pub fn into_result(mut self) -> Result<(), Error> {
        match self.0.len() {
            0 => Ok(()),
            1 => Err(self.0.remove(0)),
            _ => Err(Error::Multiple(self)),
        }
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}

impl IntoIterator for Errors {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
