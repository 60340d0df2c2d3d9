//! A single configurable option.

use std::fmt;
use std::rc::Rc;

use crate::completion::CompletionHandlerFn;
use crate::group::{Annotations, Group};
use crate::invocation::Invocation;
use crate::source::ValueSource;
use crate::value::ValueRef;

/// One configurable value slot and its bindings.
///
/// An option may be bound to a long flag (with optional shorthand), an
/// environment variable, a YAML key and a default literal. Every binding is
/// optional. The value itself is shared: several options may hold handles
/// to the same slot, in which case they resolve together.
///
/// ```rust
/// use switchyard::{Opt, Shared, StringValue};
///
/// let token = Shared::new(StringValue::default());
/// let opt = Opt::new("Token")
///     .description("API token.")
///     .flag("token")
///     .env("APP_TOKEN")
///     .yaml("token")
///     .required()
///     .value(token.handle());
///
/// assert_eq!(opt.flag, "token");
/// ```
#[derive(Clone, Default)]
pub struct Opt {
    pub name: String,
    pub description: String,
    /// The option must end up with a source other than `None`.
    pub required: bool,
    /// Long flag name without dashes. Empty disables flag binding.
    pub flag: String,
    pub flag_shorthand: Option<char>,
    /// Environment variable name. Empty disables environment binding.
    pub env: String,
    /// YAML key. Empty disables config binding.
    pub yaml: String,
    /// Parsed into the value when no other source supplies one.
    pub default: String,
    pub value: Option<ValueRef>,
    pub annotations: Annotations,
    pub group: Option<Group>,
    /// Options to suggest in place of this deprecated one.
    pub use_instead: Vec<Opt>,
    pub hidden: bool,
    pub value_source: ValueSource,
    pub completion_handler: Option<CompletionHandlerFn>,
}

impl Opt {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = flag.into();
        self
    }

    pub fn shorthand(mut self, c: char) -> Self {
        self.flag_shorthand = Some(c);
        self
    }

    pub fn env(mut self, name: impl Into<String>) -> Self {
        self.env = name.into();
        self
    }

    pub fn yaml(mut self, key: impl Into<String>) -> Self {
        self.yaml = key.into();
        self
    }

    pub fn default_value(mut self, literal: impl Into<String>) -> Self {
        self.default = literal.into();
        self
    }

    pub fn value(mut self, value: ValueRef) -> Self {
        self.value = Some(value);
        self
    }

    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations = self.annotations.mark(key, value);
        self
    }

    pub fn group(mut self, group: Group) -> Self {
        self.group = Some(group);
        self
    }

    pub fn use_instead(mut self, opt: Opt) -> Self {
        self.use_instead.push(opt);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Supplies value candidates for `--flag <TAB>` and `--flag=<TAB>`.
    pub fn completion_handler(
        mut self,
        handler: impl Fn(&Invocation<'_>) -> Vec<String> + 'static,
    ) -> Self {
        self.completion_handler = Some(Rc::new(handler));
        self
    }

    /// Dotted YAML path: group keys from the root, then the option's key.
    ///
    /// Empty when the option has no YAML binding.
    ///
    /// ```rust
    /// use switchyard::{Group, Opt};
    ///
    /// let family = Group::new("Family").yaml("family");
    /// let kids = Group::new("Kids").yaml("kids").parent(family);
    /// let opt = Opt::new("Names").yaml("names").group(kids);
    ///
    /// assert_eq!(opt.yaml_path(), "family.kids.names");
    /// ```
    pub fn yaml_path(&self) -> String {
        if self.yaml.is_empty() {
            return String::new();
        }
        let mut segments: Vec<&str> = self
            .group
            .as_ref()
            .map(Group::yaml_segments)
            .unwrap_or_default();
        segments.push(&self.yaml);
        segments.join(".")
    }

    /// Returns true if the option's flag is a list that accumulates.
    pub fn is_slice(&self) -> bool {
        self.value.as_ref().is_some_and(|v| v.borrow().is_slice())
    }
}

impl fmt::Debug for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opt")
            .field("name", &self.name)
            .field("flag", &self.flag)
            .field("flag_shorthand", &self.flag_shorthand)
            .field("env", &self.env)
            .field("yaml", &self.yaml)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("value", &self.value)
            .field("value_source", &self.value_source)
            .field("group", &self.group.as_ref().map(Group::full_name))
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}
