//! The command tree.
//!
//! A [`Command`] is one node: its usage line (whose first word is its
//! name), options, children and handlers. Trees are built with chained
//! builder methods and never store parent links; the path from the root is
//! known during a walk or a run and is handed to whoever needs it.
//!
//! ```rust
//! use switchyard::{Command, Opt, Shared, StringValue};
//!
//! let target = Shared::new(StringValue::default());
//! let mut root = Command::new("deploy <service>")
//!     .short("Deploy a service.")
//!     .option(
//!         Opt::new("Target")
//!             .description("Where to deploy.")
//!             .flag("target")
//!             .default_value("staging")
//!             .value(target.handle()),
//!     )
//!     .handler(|inv| {
//!         inv.println(&format!("deploying {:?}", inv.args))?;
//!         Ok(())
//!     });
//!
//! let mut out = Vec::new();
//! root.invoke(["api", "--target", "prod"])
//!     .stdout(&mut out)
//!     .run()
//!     .unwrap();
//!
//! assert_eq!(target.borrow().get(), "prod");
//! assert_eq!(String::from_utf8(out).unwrap(), "deploying [\"api\"]\n");
//! ```

use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Errors, Result};
use crate::group::Annotations;
use crate::invocation::Invocation;
use crate::option::Opt;
use crate::option_set::OptionSet;
use crate::value::{BoolValue, Shared};

/// Runs a command.
pub type HandlerFn = Rc<dyn Fn(&mut Invocation<'_>) -> anyhow::Result<()>>;

/// Wraps a handler in another handler.
pub type MiddlewareFn = Rc<dyn Fn(HandlerFn) -> HandlerFn>;

/// Produces completion candidates.
pub type CompletionHandlerFn = Rc<dyn Fn(&Invocation<'_>) -> Vec<String>>;

/// Boxes a closure as a [`HandlerFn`].
pub fn handler(f: impl Fn(&mut Invocation<'_>) -> anyhow::Result<()> + 'static) -> HandlerFn {
    Rc::new(f)
}

/// Boxes a closure as a [`MiddlewareFn`].
pub fn middleware(f: impl Fn(HandlerFn) -> HandlerFn + 'static) -> MiddlewareFn {
    Rc::new(f)
}

/// A node of the command tree.
#[derive(Clone, Default)]
pub struct Command {
    /// Usage line, e.g. `"deploy [flags] <service>"`. The first word is the
    /// command's name.
    pub usage: String,
    pub aliases: Vec<String>,
    /// One-line description.
    pub short: String,
    /// Detailed description shown on the command's own help page.
    pub long: String,
    pub hidden: bool,
    /// When non-empty the command is deprecated and this is the message.
    pub deprecated: String,
    /// Skip flag parsing and hand the handler the unparsed arguments.
    pub raw_args: bool,
    pub options: OptionSet,
    pub annotations: Annotations,
    pub children: Vec<Command>,
    pub middleware: Option<MiddlewareFn>,
    pub handler: Option<HandlerFn>,
    pub help_handler: Option<HandlerFn>,
    pub completion_handler: Option<CompletionHandlerFn>,
    /// When non-empty on the root, `--version` prints `<name> <version>`.
    pub version: String,
}

impl Command {
    pub fn new(usage: impl Into<String>) -> Self {
        Self {
            usage: usage.into(),
            ..Default::default()
        }
    }

    pub fn short(mut self, text: impl Into<String>) -> Self {
        self.short = text.into();
        self
    }

    pub fn long(mut self, text: impl Into<String>) -> Self {
        self.long = text.into();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = message.into();
        self
    }

    pub fn raw_args(mut self) -> Self {
        self.raw_args = true;
        self
    }

    pub fn option(mut self, opt: Opt) -> Self {
        self.options.add(opt);
        self
    }

    pub fn options(mut self, opts: impl IntoIterator<Item = Opt>) -> Self {
        self.options.extend(opts);
        self
    }

    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations = self.annotations.mark(key, value);
        self
    }

    pub fn child(mut self, child: Command) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Command>) -> Self {
        self.children.extend(children);
        self
    }

    /// Sets the middleware run around the handler. Use
    /// [`chain`](crate::chain) to combine several.
    pub fn middleware(mut self, mw: MiddlewareFn) -> Self {
        self.middleware = Some(mw);
        self
    }

    pub fn handler(
        mut self,
        f: impl Fn(&mut Invocation<'_>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.handler = Some(Rc::new(f));
        self
    }

    pub fn help_handler(
        mut self,
        f: impl Fn(&mut Invocation<'_>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.help_handler = Some(Rc::new(f));
        self
    }

    pub fn completion_handler(
        mut self,
        f: impl Fn(&Invocation<'_>) -> Vec<String> + 'static,
    ) -> Self {
        self.completion_handler = Some(Rc::new(f));
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The first word of the usage line.
    pub fn name(&self) -> &str {
        self.usage.split(' ').next().unwrap_or_default()
    }

    /// Visits the command and every descendant, depth first.
    ///
    /// The visitor receives each command together with its ancestors,
    /// root first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Command, &[&'a Command])) {
        fn inner<'a>(
            cmd: &'a Command,
            parents: &mut Vec<&'a Command>,
            visit: &mut impl FnMut(&'a Command, &[&'a Command]),
        ) {
            visit(cmd, parents);
            parents.push(cmd);
            for child in &cmd.children {
                inner(child, parents, visit);
            }
            parents.pop();
        }
        inner(self, &mut Vec::new(), visit);
    }

    /// Fills in defaults and lints the tree.
    ///
    /// - an empty usage becomes `"unnamed"`
    /// - unnamed options take their flag, env or YAML key as name
    /// - descriptions must start with a capital letter and end with a period
    /// - options and children are sorted by name
    /// - a root with a version gets a `--version` switch unless it has one
    ///
    /// Every problem in the tree is reported at once.
    pub fn init(&mut self) -> Result<()> {
        self.init_node(true)
    }

    fn init_node(&mut self, is_root: bool) -> Result<()> {
        if self.usage.is_empty() {
            self.usage = "unnamed".into();
        }
        let mut errs = Errors::new();

        for opt in self.options.iter_mut() {
            if opt.name.is_empty() {
                match [&opt.flag, &opt.env, &opt.yaml].into_iter().find(|s| !s.is_empty()) {
                    Some(name) => opt.name = name.clone(),
                    None => errs.push(Error::InvalidOption(
                        "option must have a name, flag, env or yaml field".into(),
                    )),
                }
            }
            if let Some(first) = opt.description.chars().next() {
                if first.is_lowercase() {
                    errs.push(Error::InvalidOption(format!(
                        "option {:?} description should start with a capital letter",
                        opt.name
                    )));
                }
                if !opt.description.ends_with('.') {
                    errs.push(Error::InvalidOption(format!(
                        "option {:?} description should end with a period",
                        opt.name
                    )));
                }
            }
        }

        self.options.sort_by(|a, b| a.name.cmp(&b.name));
        self.children.sort_by(|a, b| a.name().cmp(b.name()));

        for child in &mut self.children {
            if let Err(err) = child.init_node(false) {
                errs.push(Error::InCommand {
                    command: child.name().to_string(),
                    source: Box::new(err),
                });
            }
        }

        if is_root
            && !self.version.is_empty()
            && self.options.by_name("version").is_none()
            && self.options.by_flag("version").is_none()
        {
            self.options.add(
                Opt::new("version")
                    .flag("version")
                    .description("Print the version and exit.")
                    .value(Shared::new(BoolValue::default()).handle()),
            );
        }

        errs.into_result()
    }
}

/// Joins command names into the invocation path, e.g. `"app deploy"`.
pub(crate) fn full_name(lineage: &[&Command]) -> String {
    lineage
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("usage", &self.usage)
            .field("aliases", &self.aliases)
            .field("raw_args", &self.raw_args)
            .field("options", &self.options)
            .field("children", &self.children)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::StringValue;

    fn opt(name: &str) -> Opt {
        Opt::new(name).value(Shared::new(StringValue::default()).handle())
    }

    #[test]
    fn test_name_is_first_word() {
        assert_eq!(Command::new("deploy [flags] <svc>").name(), "deploy");
        assert_eq!(Command::new("").name(), "");
    }

    #[test]
    fn test_init_names_from_bindings() {
        let mut cmd = Command::new("x")
            .option(opt("").flag("from-flag"))
            .option(opt("").env("FROM_ENV"))
            .option(opt("").yaml("fromYaml"));
        cmd.init().unwrap();
        let names: Vec<_> = cmd.options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["FROM_ENV", "from-flag", "fromYaml"]);
    }

    #[test]
    fn test_init_requires_identity() {
        let mut cmd = Command::new("x").option(opt(""));
        assert!(matches!(cmd.init(), Err(Error::InvalidOption(_))));
    }

    #[test]
    fn test_init_lints_descriptions() {
        let mut cmd = Command::new("x").option(opt("A").description("lowercase no period"));
        let err = cmd.init().unwrap_err();
        let Error::Multiple(errs) = err else {
            panic!("expected two lint errors, got {err}");
        };
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn test_init_reports_child_errors_with_name() {
        let mut cmd = Command::new("root").child(Command::new("kid").option(opt("")));
        let err = cmd.init().unwrap_err();
        assert!(err.to_string().starts_with("command kid: "));
    }

    #[test]
    fn test_init_sorts_children() {
        let mut cmd = Command::new("root")
            .child(Command::new("zeta"))
            .child(Command::new("alpha"));
        cmd.init().unwrap();
        assert_eq!(cmd.children[0].name(), "alpha");
    }

    #[test]
    fn test_version_option_added_once() {
        let mut cmd = Command::new("root").version("1.2.3");
        cmd.init().unwrap();
        cmd.init().unwrap();
        assert_eq!(cmd.options.iter().filter(|o| o.flag == "version").count(), 1);
    }

    #[test]
    fn test_version_only_on_root() {
        let mut cmd = Command::new("root").child(Command::new("kid").version("1"));
        cmd.init().unwrap();
        assert!(cmd.children[0].options.by_flag("version").is_none());
    }

    #[test]
    fn test_walk_passes_ancestry() {
        let cmd = Command::new("a").child(Command::new("b").child(Command::new("c")));
        let mut seen = Vec::new();
        cmd.walk(&mut |c, parents| {
            let mut names: Vec<&str> = parents.iter().map(|p| p.name()).collect();
            names.push(c.name());
            seen.push(names.join(" "));
        });
        assert_eq!(seen, ["a", "a b", "a b c"]);
    }
}
