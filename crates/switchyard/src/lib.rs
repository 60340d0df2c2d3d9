//! Layered option resolution and nested command dispatch for CLIs.
//!
//! `switchyard` resolves every option of a command from up to five sources
//! and dispatches a run through a tree of nested commands.
//!
//! # Features
//!
//! - **Layered resolution**: flag, then environment, then YAML config, then
//!   default. The source that supplied each value is recorded.
//! - **Shared values**: several options may hold the same value slot and
//!   resolve together, which is how renamed flags and env aliases work
//! - **Command trees**: children, aliases, raw-argument commands, hidden
//!   and deprecated commands, middleware around handlers
//! - **Config documents**: options marshal to and from nested YAML along
//!   their group paths, and to and from JSON records
//! - **Completion and help**: shell completion candidates and a plain help
//!   page without extra wiring
//!
//! # Precedence
//!
//! | Source    | Wins over                 |
//! |-----------|---------------------------|
//! | `Flag`    | everything                |
//! | `Env`     | `Yaml`, `Default`, `None` |
//! | `Yaml`    | `Default`, `None`         |
//! | `Default` | `None`                    |
//!
//! # Example
//!
//! ```rust
//! use switchyard::{Command, Environ, Opt, Shared, StringValue, ValueSource};
//!
//! let region = Shared::new(StringValue::default());
//! let mut root = Command::new("app").child(
//!     Command::new("sub")
//!         .option(
//!             Opt::new("Region")
//!                 .flag("region")
//!                 .env("APP_REGION")
//!                 .default_value("us-east")
//!                 .value(region.handle()),
//!         )
//!         .handler(|inv| {
//!             inv.println(&inv.args.join(","))?;
//!             Ok(())
//!         }),
//! );
//!
//! let mut out = Vec::new();
//! root.invoke(["sub", "--region", "eu-west", "pos1"])
//!     .environ(Environ::new().with_var("APP_REGION", "ap-south"))
//!     .stdout(&mut out)
//!     .run()
//!     .unwrap();
//!
//! assert_eq!(region.borrow().get(), "eu-west");
//! assert_eq!(root.children[0].options[0].value_source, ValueSource::Flag);
//! assert_eq!(String::from_utf8(out).unwrap(), "pos1\n");
//! ```

// Values and options
mod environ;
mod error;
mod group;
mod option;
mod option_set;
mod source;
pub mod value;

// Parsing and encodings
mod flags;
mod json;
mod yaml;

// Commands and runs
mod command;
mod completion;
mod dispatch;
mod help;
mod invocation;
mod middleware;

pub use environ::{EnvVar, Environ, FALLBACK_PREFIX};
pub use error::{
    Error, Errors, FlagError, ParseError, Result, RunCommandError, UnknownSubcommandError,
};
pub use group::{Annotations, Group};
pub use option::Opt;
pub use option_set::OptionSet;
pub use source::ValueSource;
pub use value::{
    BoolValue, Discard, Enum, EnumArray, Int64Value, Shared, StringArray, StringValue, Struct,
    Value, ValueId, ValueRef, YamlConfigPath,
};

pub use flags::{Flag, FlagSet};
pub use yaml::{load_yaml, Strictness, YamlMarshal};

pub use command::{handler, middleware, Command, HandlerFn, MiddlewareFn};
pub use completion::{default_completion_handler, CompletionHandlerFn};
pub use help::default_help;
pub use invocation::{Invocation, InvocationBuilder, COMPLETION_MODE_ENV};
pub use middleware::{chain, require_n_args, require_range_args};
