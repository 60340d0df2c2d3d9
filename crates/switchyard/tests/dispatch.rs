//! Running command trees end to end.

use std::cell::RefCell;
use std::rc::Rc;

use switchyard::{
    require_n_args, BoolValue, Command, Environ, Error, FlagError, Opt, Shared, StringArray,
    StringValue, ValueSource,
};
use tokio_util::sync::CancellationToken;

/// Output captured from one run.
struct Run {
    stdout: String,
    stderr: String,
    result: switchyard::Result<()>,
}

fn run(cmd: &mut Command, args: &[&str], env: Environ) -> Run {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let result = cmd
        .invoke(args.iter().copied())
        .environ(env)
        .stdout(&mut stdout)
        .stderr(&mut stderr)
        .run();
    Run {
        stdout: String::from_utf8(stdout).unwrap(),
        stderr: String::from_utf8(stderr).unwrap(),
        result,
    }
}

fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&mut switchyard::Invocation<'_>) -> anyhow::Result<()>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |inv: &mut switchyard::Invocation<'_>| {
        *sink.borrow_mut() = inv.args.clone();
        Ok(())
    })
}

// ============================================================================
// Routing
// ============================================================================

#[test]
fn routes_to_child_with_flag_and_positional() {
    let flag = Shared::new(StringValue::default());
    let (seen, handler) = recorder();
    let mut root = Command::new("app").child(
        Command::new("sub <arg>")
            .option(Opt::new("Flag").flag("flag").value(flag.handle()))
            .middleware(require_n_args(1))
            .handler(handler),
    );

    let out = run(&mut root, &["sub", "--flag", "x", "pos1"], Environ::new());
    out.result.unwrap();
    assert_eq!(flag.borrow().get(), "x");
    assert_eq!(root.children[0].options[0].value_source, ValueSource::Flag);
    assert_eq!(*seen.borrow(), ["pos1"]);
}

#[test]
fn aliases_route_like_names() {
    let (seen, handler) = recorder();
    let mut root = Command::new("app").child(Command::new("remove").alias("rm").handler(handler));
    run(&mut root, &["rm", "a"], Environ::new()).result.unwrap();
    assert_eq!(*seen.borrow(), ["a"]);
}

#[test]
fn duplicate_children_are_rejected() {
    let mut root = Command::new("app")
        .child(Command::new("one").alias("x"))
        .child(Command::new("two").alias("x"));
    let out = run(&mut root, &[], Environ::new());
    assert!(matches!(out.result, Err(Error::DuplicateCommand(ref n)) if n == "x"));
}

#[test]
fn child_flag_replaces_inherited_flag() {
    let parent = Shared::new(StringValue::default());
    let child = Shared::new(StringValue::default());
    let mut root = Command::new("app")
        .option(Opt::new("Out").flag("out").value(parent.handle()))
        .child(
            Command::new("sub")
                .option(Opt::new("Out").flag("out").value(child.handle()))
                .handler(|_| Ok(())),
        );
    run(&mut root, &["sub", "--out", "file"], Environ::new())
        .result
        .unwrap();
    assert_eq!(child.borrow().get(), "file");
    assert_eq!(root.children[0].options[0].value_source, ValueSource::Flag);
}

#[test]
fn ancestor_flag_after_child_flag_is_marked() {
    let verbose = Shared::new(BoolValue::default());
    let mut root = Command::new("app")
        .option(Opt::new("Verbose").flag("verbose").value(verbose.handle()))
        .child(
            Command::new("sub")
                .option(
                    Opt::new("Name")
                        .flag("name")
                        .value(Shared::new(StringValue::default()).handle()),
                )
                .handler(|_| Ok(())),
        );
    run(&mut root, &["sub", "--name", "n", "--verbose"], Environ::new())
        .result
        .unwrap();
    assert!(verbose.borrow().get());
    assert_eq!(root.options[0].value_source, ValueSource::Flag);
}

#[test]
fn ancestor_flags_repeat_after_child_flag() {
    let tags = Shared::new(StringArray::default());
    let name = Shared::new(StringValue::default());
    let mut root = Command::new("app")
        .option(Opt::new("Tags").flag("tag").value(tags.handle()))
        .option(Opt::new("Name").flag("name").value(name.handle()))
        .child(
            Command::new("sub")
                .option(
                    Opt::new("X")
                        .flag("x")
                        .value(Shared::new(StringValue::default()).handle()),
                )
                .handler(|_| Ok(())),
        );
    let argv = [
        "sub", "--tag", "a", "--name", "first", "--x", "1", "--tag", "b", "--name", "last",
    ];
    run(&mut root, &argv, Environ::new()).result.unwrap();
    assert_eq!(tags.borrow().get(), ["a", "b"]);
    assert_eq!(name.borrow().get(), "last");
    assert_eq!(root.options.by_name("Tags").unwrap().value_source, ValueSource::Flag);
}

#[test]
fn unknown_flag_is_reported_with_command() {
    let mut root = Command::new("app").handler(|_| Ok(()));
    let out = run(&mut root, &["--nope"], Environ::new());
    match out.result {
        Err(Error::Flags {
            command, source, ..
        }) => {
            assert_eq!(command, "app");
            assert!(matches!(source, FlagError::UnknownFlag(ref f) if f == "nope"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn handler_errors_carry_full_name() {
    let mut root = Command::new("app").child(
        Command::new("sub").handler(|_| Err(anyhow::anyhow!("boom"))),
    );
    let err = run(&mut root, &["sub"], Environ::new()).result.unwrap_err();
    assert_eq!(err.to_string(), r#"running command "app sub": boom"#);
}

// ============================================================================
// Required options and help
// ============================================================================

fn with_required(ran: Rc<RefCell<bool>>) -> Command {
    Command::new("app")
        .option(
            Opt::new("Token")
                .flag("token")
                .required()
                .value(Shared::new(StringValue::default()).handle()),
        )
        .handler(move |_| {
            *ran.borrow_mut() = true;
            Ok(())
        })
}

#[test]
fn missing_required_option_stops_the_run() {
    let ran = Rc::new(RefCell::new(false));
    let mut root = with_required(Rc::clone(&ran));
    let err = run(&mut root, &[], Environ::new()).result.unwrap_err();
    assert_eq!(err.missing_required(), Some(&["Token".to_string()][..]));
    assert!(!*ran.borrow());
}

#[test]
fn help_suppresses_required_check() {
    let ran = Rc::new(RefCell::new(false));
    let mut root = with_required(Rc::clone(&ran));
    let out = run(&mut root, &["--help"], Environ::new());
    out.result.unwrap();
    assert!(out.stdout.contains("USAGE:"), "{}", out.stdout);
    assert!(!*ran.borrow());
}

#[test]
fn unknown_subcommand_is_distinguished() {
    let mut root = Command::new("app").child(Command::new("sub").handler(|_| Ok(())));
    let out = run(&mut root, &["bogus"], Environ::new());
    let err = out.result.unwrap_err();
    assert_eq!(
        err.as_unknown_subcommand().map(|e| e.args.clone()),
        Some(vec!["bogus".to_string()])
    );
    assert!(out.stderr.contains(r#"unknown subcommand "bogus""#));
}

// ============================================================================
// Raw arguments
// ============================================================================

#[test]
fn raw_child_gets_everything_after_its_name() {
    let (seen, handler) = recorder();
    let mut root = Command::new("app")
        .option(
            Opt::new("Dir")
                .flag("dir")
                .value(Shared::new(StringValue::default()).handle()),
        )
        .child(Command::new("exec").raw_args().handler(handler));
    run(
        &mut root,
        &["--dir", "exec", "exec", "--unknown", "-x", "value"],
        Environ::new(),
    )
    .result
    .unwrap();
    assert_eq!(*seen.borrow(), ["--unknown", "-x", "value"]);
}

fn raw_tree(
    quiet: &Shared<BoolValue>,
    name: &Shared<StringValue>,
    handler: impl Fn(&mut switchyard::Invocation<'_>) -> anyhow::Result<()> + 'static,
) -> Command {
    Command::new("app")
        .option(
            Opt::new("Quiet")
                .flag("quiet")
                .shorthand('q')
                .value(quiet.handle()),
        )
        .option(
            Opt::new("Name")
                .flag("name")
                .shorthand('n')
                .value(name.handle()),
        )
        .child(Command::new("exec").raw_args().handler(handler))
}

#[test]
fn raw_child_after_shorthand_cluster_with_value() {
    let quiet = Shared::new(BoolValue::default());
    let name = Shared::new(StringValue::default());
    let (seen, handler) = recorder();
    let mut root = raw_tree(&quiet, &name, handler);
    run(&mut root, &["-qn", "exec", "exec", "x"], Environ::new())
        .result
        .unwrap();
    assert!(quiet.borrow().get());
    assert_eq!(name.borrow().get(), "exec");
    assert_eq!(*seen.borrow(), ["x"]);
}

#[test]
fn raw_child_after_shorthand_value_named_like_child() {
    let quiet = Shared::new(BoolValue::default());
    let name = Shared::new(StringValue::default());
    let (seen, handler) = recorder();
    let mut root = raw_tree(&quiet, &name, handler);
    run(&mut root, &["-n", "exec", "exec", "-z", "y"], Environ::new())
        .result
        .unwrap();
    assert_eq!(name.borrow().get(), "exec");
    assert_eq!(*seen.borrow(), ["-z", "y"]);
}

#[test]
fn raw_root_gets_all_arguments() {
    let (seen, handler) = recorder();
    let mut root = Command::new("app").raw_args().handler(handler);
    run(&mut root, &["--x", "y"], Environ::new()).result.unwrap();
    assert_eq!(*seen.borrow(), ["--x", "y"]);
}

// ============================================================================
// Version, deprecation, context, panics
// ============================================================================

#[test]
fn version_flag_prints_and_skips_handler() {
    let ran = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&ran);
    let mut root = Command::new("app").version("1.2.3").handler(move |_| {
        *flag.borrow_mut() = true;
        Ok(())
    });
    let out = run(&mut root, &["--version"], Environ::new());
    out.result.unwrap();
    assert_eq!(out.stdout, "app 1.2.3\n");
    assert!(!*ran.borrow());
}

#[test]
fn deprecated_command_warns() {
    let mut root = Command::new("app").child(
        Command::new("old")
            .deprecated("Use new instead.")
            .handler(|_| Ok(())),
    );
    let out = run(&mut root, &["old"], Environ::new());
    out.result.unwrap();
    assert!(
        out.stderr.contains(r#""app old" is deprecated! Use new instead."#),
        "{}",
        out.stderr
    );
}

#[test]
fn handler_context_is_canceled_after_run() {
    let captured: Rc<RefCell<Option<CancellationToken>>> = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&captured);
    let parent = CancellationToken::new();
    let mut root = Command::new("app").handler(move |inv| {
        assert!(!inv.context().is_cancelled());
        *slot.borrow_mut() = Some(inv.context().clone());
        Ok(())
    });
    root.invoke(Vec::<String>::new())
        .context(parent.clone())
        .run()
        .unwrap();
    assert!(captured.borrow().as_ref().unwrap().is_cancelled());
    assert!(!parent.is_cancelled());
}

#[test]
fn panics_become_errors() {
    let mut root = Command::new("app").child(Command::new("sub").handler(|_| panic!("oops")));
    let err = run(&mut root, &["sub"], Environ::new()).result.unwrap_err();
    match err {
        Error::Panic { command, message } => {
            assert_eq!(command, "app sub");
            assert_eq!(message, "oops");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
#[should_panic(expected = "panic recovered for app sub: oops")]
fn panics_are_reraised_in_test_mode() {
    let mut root = Command::new("app").child(Command::new("sub").handler(|_| panic!("oops")));
    let _ = root.invoke(["sub"]).test_mode().run();
}

#[test]
fn init_errors_abort_before_resolution() {
    let mut root = Command::new("app")
        .option(
            Opt::new("Bad")
                .description("no capital or period")
                .value(Shared::new(StringValue::default()).handle()),
        )
        .handler(|_| Ok(()));
    let err = run(&mut root, &[], Environ::new()).result.unwrap_err();
    assert!(err.to_string().starts_with("initializing command"), "{err}");
}
