//! Handler middleware.
//!
//! A middleware takes the next handler and returns a handler that runs
//! around it. [`chain`] composes several so that the first one listed runs
//! outermost.

use std::rc::Rc;

use anyhow::bail;

use crate::command::{HandlerFn, MiddlewareFn};
use crate::invocation::Invocation;

/// Composes middleware. `chain([a, b])(h)` runs `a`, then `b`, then `h`.
pub fn chain(ms: impl IntoIterator<Item = MiddlewareFn>) -> MiddlewareFn {
    let list: Vec<MiddlewareFn> = ms.into_iter().collect();
    Rc::new(move |next: HandlerFn| list.iter().rev().fold(next, |acc, mw| mw(acc)))
}

/// Requires exactly `n` positional arguments.
pub fn require_n_args(n: usize) -> MiddlewareFn {
    require_range_args(n, Some(n))
}

/// Requires between `start` and `end` positional arguments, inclusive.
/// `None` leaves the upper end open.
///
/// A command with children that takes no arguments reports a stray
/// argument as an unrecognized subcommand.
pub fn require_range_args(start: usize, end: Option<usize>) -> MiddlewareFn {
    Rc::new(move |next: HandlerFn| {
        Rc::new(move |inv: &mut Invocation<'_>| {
            let got = inv.args.len();
            match end {
                Some(end) if start == end && got != start => {
                    if start == 0 {
                        if !inv.command.children.is_empty() {
                            bail!("unrecognized subcommand {:?}", inv.args[0]);
                        }
                        bail!("wanted no args but got {got} {:?}", inv.args);
                    }
                    bail!("wanted {start} args but got {got} {:?}", inv.args);
                }
                Some(end) if start > end => {
                    bail!("invalid argument range: start {start} is greater than end {end}")
                }
                Some(end) if got < start || got > end => {
                    bail!("wanted between {start} and {end} args but got {got}")
                }
                None if got < start => bail!("wanted at least {start} args but got {got}"),
                _ => next(inv),
            }
        }) as HandlerFn
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::command::{middleware, Command};

    fn run(cmd: Command, args: &[&str]) -> crate::Result<()> {
        let mut cmd = cmd;
        cmd.invoke(args.iter().copied()).run()
    }

    fn ok_cmd(mw: MiddlewareFn) -> Command {
        Command::new("app").middleware(mw).handler(|_| Ok(()))
    }

    #[test]
    fn test_chain_runs_in_listed_order() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let tag = |name: &'static str| {
            let trace = Rc::clone(&trace);
            middleware(move |next| {
                let trace = Rc::clone(&trace);
                Rc::new(move |inv: &mut Invocation<'_>| {
                    trace.borrow_mut().push(name);
                    next(inv)
                })
            })
        };
        let seen = Rc::clone(&trace);
        let mut cmd = Command::new("app")
            .middleware(chain([tag("first"), tag("second")]))
            .handler(move |_| {
                seen.borrow_mut().push("handler");
                Ok(())
            });
        cmd.invoke(Vec::<String>::new()).run().unwrap();
        assert_eq!(*trace.borrow(), ["first", "second", "handler"]);
    }

    #[test]
    fn test_empty_chain_is_identity() {
        run(ok_cmd(chain(Vec::new())), &[]).unwrap();
    }

    #[test]
    fn test_exact_count() {
        run(ok_cmd(require_n_args(2)), &["a", "b"]).unwrap();
        let err = run(ok_cmd(require_n_args(2)), &["a"]).unwrap_err();
        assert!(err.to_string().contains(r#"wanted 2 args but got 1 ["a"]"#), "{err}");
    }

    #[test]
    fn test_no_args() {
        let err = run(ok_cmd(require_n_args(0)), &["x"]).unwrap_err();
        assert!(err.to_string().contains("wanted no args but got 1"), "{err}");
    }

    #[test]
    fn test_no_args_with_children_reads_as_subcommand() {
        let cmd = ok_cmd(require_n_args(0)).child(Command::new("real").handler(|_| Ok(())));
        let err = run(cmd, &["bogus"]).unwrap_err();
        assert!(err.to_string().contains(r#"unrecognized subcommand "bogus""#), "{err}");
    }

    #[test]
    fn test_open_range() {
        run(ok_cmd(require_range_args(1, None)), &["a", "b", "c"]).unwrap();
        let err = run(ok_cmd(require_range_args(1, None)), &[]).unwrap_err();
        assert!(err.to_string().contains("wanted at least 1 args but got 0"), "{err}");
    }

    #[test]
    fn test_closed_range() {
        run(ok_cmd(require_range_args(1, Some(2))), &["a"]).unwrap();
        let err = run(ok_cmd(require_range_args(1, Some(2))), &["a", "b", "c"]).unwrap_err();
        assert!(
            err.to_string().contains("wanted between 1 and 2 args but got 3"),
            "{err}"
        );
    }

    #[test]
    fn test_inverted_range_is_an_error() {
        assert!(run(ok_cmd(require_range_args(3, Some(1))), &[]).is_err());
    }
}
