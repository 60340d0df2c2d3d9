//! Running an invocation.
//!
//! A run walks the argument vector down the command tree one depth at a
//! time. At every command:
//!
//! 1. environment bindings of the command's own options are applied
//! 2. the command's flags are merged into the flags accumulated from its
//!    ancestors, replacing inherited flags of the same name
//! 3. the whole argument vector is parsed against the accumulated flags
//!    (skipped for raw-argument commands); a parse failure is remembered,
//!    not raised, since a deeper command may own the unknown flag
//! 4. options whose flags were given are marked, config documents named by
//!    the options are applied, then defaults
//! 5. if the positional argument at the current depth names a child, the
//!    run descends into it
//!
//! The command where descent stops is the terminal command. It completes
//! instead of running when the invocation is in completion mode, surfaces
//! the remembered flag error, checks required options, computes its
//! arguments, handles `--version` and finally runs either the help handler
//! or its middleware-wrapped handler.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::debug;

use crate::command::{full_name, Command};
use crate::completion::complete;
use crate::error::{Error, FlagError, Result, RunCommandError, UnknownSubcommandError};
use crate::flags::{Flag, FlagSet};
use crate::help::default_help;
use crate::invocation::{Invocation, InvocationBuilder, COMPLETION_MODE_ENV};
use crate::yaml::{load_yaml, Strictness};
use crate::Environ;

/// Mutable state threaded through the descent.
#[derive(Default)]
struct RunState {
    all_args: Vec<String>,
    depth: usize,
    flag_err: Option<FlagError>,
    flags: FlagSet,
    /// Child index taken at each depth.
    path: Vec<usize>,
    /// The token that selected the child at each depth.
    matched: Vec<String>,
    /// Positional residue of the terminal command's parse.
    parsed_args: Vec<String>,
    /// Names of the commands entered so far.
    names: Vec<String>,
}

impl<'a> InvocationBuilder<'a> {
    /// Initializes the tree, resolves every option on the way to the
    /// selected command and runs it.
    ///
    /// A panic anywhere in the run is caught. In test mode it is raised
    /// again with the name of the command that was running; otherwise it is
    /// returned as [`Error::Panic`].
    pub fn run(self) -> Result<()> {
        let InvocationBuilder {
            command,
            args,
            environ,
            stdout,
            stderr,
            stdin,
            ctx,
            test_mode,
        } = self;

        command
            .init()
            .map_err(|e| Error::context("initializing command", e))?;

        let current = RefCell::new(command.name().to_string());
        let io = Streams {
            stdout,
            stderr,
            stdin,
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            dispatch(command, args, environ, io, ctx, &current)
        }));

        match outcome {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                let command = current.into_inner();
                if test_mode {
                    panic!("panic recovered for {command}: {message}");
                }
                Err(Error::Panic { command, message })
            }
        }
    }
}

struct Streams<'a> {
    stdout: Box<dyn Write + 'a>,
    stderr: Box<dyn Write + 'a>,
    stdin: Box<dyn std::io::Read + 'a>,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn dispatch<'a>(
    root: &'a mut Command,
    args: Vec<String>,
    environ: Environ,
    mut io: Streams<'a>,
    ctx: tokio_util::sync::CancellationToken,
    current: &RefCell<String>,
) -> Result<()> {
    let mut state = RunState {
        all_args: args,
        ..Default::default()
    };
    resolve(root, &mut state, &environ, &mut io.stderr, current)?;
    mark_lineage(root, &state.path, &state.flags);

    let root: &'a Command = root;
    let mut lineage = vec![root];
    let mut cmd = root;
    for &i in &state.path {
        cmd = &cmd.children[i];
        lineage.push(cmd);
    }
    let name = full_name(&lineage);

    let help_requested = matches!(state.flag_err, Some(FlagError::Help));
    let completing = environ.lookup(COMPLETION_MODE_ENV).is_some();

    let mut inv = Invocation {
        command: cmd,
        lineage,
        args: state.all_args.clone(),
        environ,
        stdout: io.stdout,
        stderr: io.stderr,
        stdin: io.stdin,
        ctx: ctx.child_token(),
        parsed_flags: state.flags.clone(),
    };

    if completing {
        debug!(command = %name, "completing");
        for candidate in complete(&inv) {
            writeln!(inv.stdout, "{candidate}")?;
        }
        return Ok(());
    }

    if let Some(err) = state.flag_err.take() {
        if !cmd.raw_args && !err.is_help() {
            return Err(Error::Flags {
                args: state.all_args,
                command: name,
                source: err,
            });
        }
    }

    let missing = cmd.options.missing_required();
    if !missing.is_empty() && !help_requested {
        return Err(Error::MissingRequired(missing));
    }

    inv.args = if cmd.raw_args {
        match state.matched.last() {
            None => state.all_args.clone(),
            Some(token) => {
                let pos = find_arg(token, &state.all_args, &state.flags)?;
                state.all_args[pos + 1..].to_vec()
            }
        }
    } else {
        state
            .parsed_args
            .get(state.depth..)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    };

    if !cmd.version.is_empty() {
        if let Some(opt) = cmd.options.by_flag("version") {
            if state.flags.changed(&opt.flag) {
                inv.println(&format!("{} {}", cmd.name(), cmd.version))?;
                return Ok(());
            }
        }
    }

    let _guard = inv.ctx.clone().drop_guard();

    if cmd.handler.is_none() || help_requested {
        debug!(command = %name, "running help");
        let help = cmd.help_handler.clone();
        let result = match help {
            Some(h) => h(&mut inv),
            None => default_help(&mut inv),
        };
        return result.map_err(|err| match err.downcast::<UnknownSubcommandError>() {
            Ok(unknown) => Error::UnknownSubcommand(unknown),
            Err(source) => Error::RunCommand(RunCommandError {
                command: name,
                source,
            }),
        });
    }

    let Some(handler) = cmd.handler.clone() else {
        return Ok(());
    };
    let handler = match &cmd.middleware {
        Some(mw) => mw(handler),
        None => handler,
    };
    debug!(command = %name, args = ?inv.args, "running handler");
    handler(&mut inv).map_err(|source| {
        Error::RunCommand(RunCommandError {
            command: name,
            source,
        })
    })
}

/// Resolves `cmd` and descends while a positional names a child.
fn resolve(
    cmd: &mut Command,
    state: &mut RunState,
    environ: &Environ,
    stderr: &mut Box<dyn Write + '_>,
    current: &RefCell<String>,
) -> Result<()> {
    state.names.push(cmd.name().to_string());
    let name = state.names.join(" ");
    current.replace(name.clone());

    if !cmd.deprecated.is_empty() {
        writeln!(
            stderr,
            "{} {:?} is deprecated! {}",
            switchyard_term::header("warning"),
            name,
            cmd.deprecated
        )?;
    }

    cmd.options
        .apply_env(environ)
        .map_err(|e| Error::context("parsing env", e))?;

    let mut children: HashMap<String, usize> = HashMap::new();
    for (i, child) in cmd.children.iter().enumerate() {
        for alias in child.aliases.iter().map(String::as_str).chain([child.name()]) {
            if children.insert(alias.to_string(), i).is_some() {
                return Err(Error::DuplicateCommand(alias.to_string()));
            }
        }
    }

    let own = cmd.options.flag_set()?;
    state.flags.merge_override(own)?;

    let mut parsed_args = Vec::new();
    if !cmd.raw_args {
        state.flag_err = state.flags.parse(&state.all_args).err();
        parsed_args = state.flags.args().to_vec();
    }

    cmd.options.mark_flag_sources(&state.flags);

    for path in cmd.options.config_paths() {
        let doc = load_yaml(Path::new(&path))?;
        cmd.options
            .apply_yaml(&doc, Strictness::Strict)
            .map_err(|e| Error::context("applying yaml", e))?;
    }

    cmd.options
        .set_defaults()
        .map_err(|e| Error::context("setting defaults", e))?;

    if let Some(next) = parsed_args.get(state.depth) {
        if let Some(&i) = children.get(next) {
            debug!(command = %name, child = %next, depth = state.depth + 1, "descending");
            state.path.push(i);
            state.matched.push(next.clone());
            state.depth += 1;
            return resolve(&mut cmd.children[i], state, environ, stderr, current);
        }
    }

    state.parsed_args = parsed_args;
    Ok(())
}

/// Marks flag sources on every command along `path`.
///
/// A flag for an ancestor's option can appear after a flag only a
/// descendant knows, in which case the ancestor's own parse stopped before
/// reaching it.
fn mark_lineage(root: &mut Command, path: &[usize], flags: &FlagSet) {
    let mut cmd = root;
    cmd.options.mark_flag_sources(flags);
    for &i in path {
        cmd = &mut cmd.children[i];
        cmd.options.mark_flag_sources(flags);
    }
}

/// Index of the first positional `want` in `args`, skipping flags and the
/// values they consume.
fn find_arg(want: &str, args: &[String], flags: &FlagSet) -> Result<usize> {
    let flag_error = |source| Error::Flags {
        args: args.to_vec(),
        command: want.to_string(),
        source,
    };
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if !arg.starts_with('-') || arg == "-" || is_negative_number(arg) {
            if arg == want {
                return Ok(i);
            }
            i += 1;
            continue;
        }
        if arg == "--" || arg.contains('=') {
            i += 1;
            continue;
        }
        let wants_value = match arg.strip_prefix("--") {
            Some(long) => {
                let flag = flags.lookup(long).ok_or_else(|| {
                    flag_error(FlagError::UnknownFlag(long.to_string()))
                })?;
                (!flag.takes_no_value()).then_some(flag)
            }
            None => value_shorthand(&arg[1..], flags).map_err(|c| {
                flag_error(FlagError::UnknownShorthand {
                    shorthand: c,
                    cluster: arg[1..].to_string(),
                })
            })?,
        };
        match wants_value {
            Some(flag) if i == args.len() - 1 => {
                return Err(flag_error(FlagError::MissingArgument(flag.name.clone())));
            }
            Some(_) => i += 2,
            None => i += 1,
        }
    }
    Err(Error::ArgNotFound(want.to_string()))
}

/// Walks a shorthand cluster and returns the flag that takes the next
/// token as its value, if any. Fails with the first unknown shorthand.
fn value_shorthand<'f>(
    cluster: &str,
    flags: &'f FlagSet,
) -> std::result::Result<Option<&'f Flag>, char> {
    let mut rest = cluster;
    while let Some(c) = rest.chars().next() {
        let flag = flags.lookup_shorthand(c).ok_or(c)?;
        rest = &rest[c.len_utf8()..];
        if !flag.takes_no_value() {
            // Anything left in the cluster is the value itself.
            return Ok(rest.is_empty().then_some(flag));
        }
    }
    Ok(None)
}

fn is_negative_number(arg: &str) -> bool {
    arg.strip_prefix('-')
        .is_some_and(|n| n.starts_with(|c: char| c.is_ascii_digit()) && n.parse::<f64>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{BoolValue, Shared, StringValue};

    fn flags() -> FlagSet {
        let mut fs = FlagSet::new();
        fs.add(Flag::new("name", Shared::new(StringValue::default()).handle()).shorthand(Some('n')))
            .unwrap();
        fs.add(Flag::new("quiet", Shared::new(BoolValue::default()).handle()))
            .unwrap();
        fs
    }

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_arg_skips_flag_values() {
        let argv = args(&["--name", "exec", "exec", "--x"]);
        assert_eq!(find_arg("exec", &argv, &flags()).unwrap(), 2);
    }

    #[test]
    fn test_find_arg_bool_flags_take_nothing() {
        let argv = args(&["--quiet", "exec"]);
        assert_eq!(find_arg("exec", &argv, &flags()).unwrap(), 1);
    }

    #[test]
    fn test_find_arg_shorthand() {
        let argv = args(&["-n", "exec", "exec"]);
        assert_eq!(find_arg("exec", &argv, &flags()).unwrap(), 2);
    }

    #[test]
    fn test_find_arg_shorthand_cluster() {
        let mut fs = flags();
        fs.add(Flag::new("verbose", Shared::new(BoolValue::default()).handle()).shorthand(Some('v')))
            .unwrap();
        let argv = args(&["-vn", "exec", "exec", "x"]);
        assert_eq!(find_arg("exec", &argv, &fs).unwrap(), 2);

        let argv = args(&["-vnexec", "exec", "x"]);
        assert_eq!(find_arg("exec", &argv, &fs).unwrap(), 1);

        let argv = args(&["-vz", "exec"]);
        assert!(matches!(
            find_arg("exec", &argv, &fs),
            Err(Error::Flags {
                source: FlagError::UnknownShorthand { shorthand: 'z', .. },
                ..
            })
        ));
    }

    #[test]
    fn test_find_arg_negative_number_is_positional() {
        let argv = args(&["-5", "exec"]);
        assert_eq!(find_arg("exec", &argv, &flags()).unwrap(), 1);
    }

    #[test]
    fn test_find_arg_inline_values() {
        let argv = args(&["--name=exec", "exec"]);
        assert_eq!(find_arg("exec", &argv, &flags()).unwrap(), 1);
    }

    #[test]
    fn test_find_arg_unknown_flag() {
        let argv = args(&["--bogus", "exec"]);
        assert!(matches!(
            find_arg("exec", &argv, &flags()),
            Err(Error::Flags { .. })
        ));
    }

    #[test]
    fn test_find_arg_missing() {
        assert!(matches!(
            find_arg("exec", &args(&["other"]), &flags()),
            Err(Error::ArgNotFound(_))
        ));
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "unknown panic payload");
    }
}
