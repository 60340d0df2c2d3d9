//! Invocations: one run of a command tree.
//!
//! [`Command::invoke`] returns an [`InvocationBuilder`] holding the
//! argument vector, environment snapshot, I/O streams and execution
//! context. By default output is discarded, input is empty and the
//! environment is empty; [`InvocationBuilder::with_os`] wires the process
//! instead. [`InvocationBuilder::run`] resolves and dispatches.
//!
//! Handlers receive an [`Invocation`], which exposes the command that was
//! selected, the path of commands that led to it, the remaining arguments
//! and the streams.

use std::io::{self, Read, Write};

use switchyard_term::Message;
use tokio_util::sync::CancellationToken;

use crate::command::{full_name, Command};
use crate::environ::Environ;
use crate::flags::FlagSet;
use crate::option::Opt;

/// Environment variable whose presence switches dispatch to completion.
pub const COMPLETION_MODE_ENV: &str = "COMPLETION_MODE";

/// A pending run of a command tree.
pub struct InvocationBuilder<'a> {
    pub(crate) command: &'a mut Command,
    pub(crate) args: Vec<String>,
    pub(crate) environ: Environ,
    pub(crate) stdout: Box<dyn Write + 'a>,
    pub(crate) stderr: Box<dyn Write + 'a>,
    pub(crate) stdin: Box<dyn Read + 'a>,
    pub(crate) ctx: CancellationToken,
    pub(crate) test_mode: bool,
}

impl Command {
    /// Prepares a run of this command with `args` (program name excluded).
    pub fn invoke<I, S>(&mut self, args: I) -> InvocationBuilder<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InvocationBuilder {
            command: self,
            args: args.into_iter().map(Into::into).collect(),
            environ: Environ::new(),
            stdout: Box::new(io::sink()),
            stderr: Box::new(io::sink()),
            stdin: Box::new(io::empty()),
            ctx: CancellationToken::new(),
            test_mode: false,
        }
    }
}

impl<'a> InvocationBuilder<'a> {
    /// Uses the process arguments, environment and standard streams.
    pub fn with_os(mut self) -> Self {
        self.args = std::env::args().skip(1).collect();
        self.environ = Environ::from_os("");
        self.stdout = Box::new(io::stdout());
        self.stderr = Box::new(io::stderr());
        self.stdin = Box::new(io::stdin());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn environ(mut self, environ: Environ) -> Self {
        self.environ = environ;
        self
    }

    pub fn stdout(mut self, w: impl Write + 'a) -> Self {
        self.stdout = Box::new(w);
        self
    }

    pub fn stderr(mut self, w: impl Write + 'a) -> Self {
        self.stderr = Box::new(w);
        self
    }

    pub fn stdin(mut self, r: impl Read + 'a) -> Self {
        self.stdin = Box::new(r);
        self
    }

    /// Parent execution context. Handlers run under a child of it.
    pub fn context(mut self, ctx: CancellationToken) -> Self {
        self.ctx = ctx;
        self
    }

    /// Re-raises panics with the name of the command that was running,
    /// instead of returning them as [`Error::Panic`](crate::Error::Panic).
    pub fn test_mode(mut self) -> Self {
        self.test_mode = true;
        self
    }
}

/// A live run, as seen by handlers.
pub struct Invocation<'a> {
    /// The selected command.
    pub command: &'a Command,
    pub(crate) lineage: Vec<&'a Command>,
    /// Remaining positional arguments.
    pub args: Vec<String>,
    pub environ: Environ,
    pub stdout: Box<dyn Write + 'a>,
    pub stderr: Box<dyn Write + 'a>,
    pub stdin: Box<dyn Read + 'a>,
    pub(crate) ctx: CancellationToken,
    pub(crate) parsed_flags: FlagSet,
}

impl<'a> Invocation<'a> {
    /// Commands from the root down to the selected one.
    pub fn lineage(&self) -> &[&'a Command] {
        &self.lineage
    }

    /// The selected command's parent, if any.
    pub fn parent(&self) -> Option<&'a Command> {
        self.lineage.iter().rev().nth(1).copied()
    }

    /// Names from the root to the selected command, space separated.
    pub fn full_name(&self) -> String {
        full_name(&self.lineage)
    }

    /// Parent names followed by the selected command's usage line.
    pub fn full_usage(&self) -> String {
        let parents = &self.lineage[..self.lineage.len().saturating_sub(1)];
        let mut parts: Vec<&str> = parents.iter().map(|c| c.name()).collect();
        parts.push(&self.command.usage);
        parts.join(" ")
    }

    /// Options of every command in the lineage, root first.
    pub fn full_options(&self) -> Vec<&'a Opt> {
        self.lineage
            .iter()
            .flat_map(|c| c.options.iter())
            .collect()
    }

    /// The execution context. Canceled once the run returns.
    pub fn context(&self) -> &CancellationToken {
        &self.ctx
    }

    /// The flag set accumulated along the lineage.
    pub fn parsed_flags(&self) -> &FlagSet {
        &self.parsed_flags
    }

    pub fn is_completion_mode(&self) -> bool {
        self.environ.lookup(COMPLETION_MODE_ENV).is_some()
    }

    /// The word before the cursor and the word under it.
    pub fn cur_words(&self) -> (&str, &str) {
        match self.args.as_slice() {
            [] => ("", ""),
            [cur] => ("", cur.as_str()),
            [.., prev, cur] => (prev.as_str(), cur.as_str()),
        }
    }

    pub fn print(&mut self, text: &str) -> io::Result<()> {
        self.stdout.write_all(text.as_bytes())
    }

    pub fn println(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.stdout, "{text}")
    }

    pub fn eprint(&mut self, text: &str) -> io::Result<()> {
        self.stderr.write_all(text.as_bytes())
    }

    pub fn eprintln(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.stderr, "{text}")
    }

    /// Writes a highlighted informational message to stderr.
    pub fn info<I, S>(&mut self, header: &str, lines: I) -> io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        write!(self.stderr, "{}", Message::info(header, lines))
    }

    /// Writes a `WARNING:` message to stderr.
    pub fn warn<I, S>(&mut self, header: &str, lines: I) -> io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        write!(self.stderr, "{}", Message::warn(header, lines))
    }

    /// Writes an `ERROR:` message to stderr.
    pub fn error<I, S>(&mut self, header: &str, lines: I) -> io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        write!(self.stderr, "{}", Message::error(header, lines))
    }
}
