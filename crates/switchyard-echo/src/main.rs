//! `echo`: prints its arguments, shaped by flags, environment and config.
//!
//! ```text
//! echo [flags] <text...>
//! echo reverse <text...>
//! echo raw -- anything --goes
//! ```
//!
//! Every setting can come from a flag, an `ECHO_*` environment variable or
//! the YAML file named by `--config`, in that order of precedence.

use std::process::ExitCode;

use switchyard::{
    require_range_args, BoolValue, Command, Enum, Error, Group, Int64Value, Invocation, Opt,
    Shared, StringArray, YamlConfigPath,
};
use tracing::debug;

/// Handles on the resolved settings, read by the handlers.
#[derive(Clone)]
struct Settings {
    upper: Shared<BoolValue>,
    repeat: Shared<Int64Value>,
    style: Shared<Enum>,
    tags: Shared<StringArray>,
    config: Shared<YamlConfigPath>,
}

impl Settings {
    fn new() -> Self {
        Self {
            upper: Shared::new(BoolValue::default()),
            repeat: Shared::new(Int64Value::default()),
            style: Shared::new(Enum::new(["plain", "quoted", "banner"])),
            tags: Shared::new(StringArray::default()),
            config: Shared::new(YamlConfigPath::default()),
        }
    }

    fn options(&self) -> Vec<Opt> {
        let output = Group::new("Output")
            .yaml("output")
            .description("How the text is printed.");
        vec![
            Opt::new("Upper")
                .description("Print the text in upper case.")
                .flag("upper")
                .shorthand('u')
                .env("ECHO_UPPER")
                .yaml("upper")
                .group(output.clone())
                .value(self.upper.handle()),
            Opt::new("Shout")
                .description("Same as --upper.")
                .flag("shout")
                .hidden()
                .use_instead(Opt::new("Upper").flag("upper"))
                .value(self.upper.handle()),
            Opt::new("Repeat")
                .description("Print the text this many times.")
                .flag("repeat")
                .shorthand('n')
                .env("ECHO_REPEAT")
                .yaml("repeat")
                .default_value("1")
                .group(output.clone())
                .value(self.repeat.handle()),
            Opt::new("Style")
                .description("Decoration around the text.")
                .flag("style")
                .env("ECHO_STYLE")
                .yaml("style")
                .default_value("plain")
                .group(output)
                .value(self.style.handle()),
            Opt::new("Tags")
                .description("Labels printed before the text.")
                .flag("tag")
                .env("ECHO_TAGS")
                .yaml("tags")
                .value(self.tags.handle()),
            Opt::new("Config")
                .description("Path to a YAML config file.")
                .flag("config")
                .shorthand('c')
                .env("ECHO_CONFIG")
                .value(self.config.handle()),
        ]
    }

    fn render(&self, text: &str) -> String {
        let mut text = text.to_string();
        if self.upper.borrow().get() {
            text = text.to_uppercase();
        }
        text = match self.style.borrow().get() {
            "quoted" => format!("{text:?}"),
            "banner" => {
                let bar = "=".repeat(text.chars().count());
                format!("{bar}\n{text}\n{bar}")
            }
            _ => text,
        };
        let tags = self.tags.borrow();
        if tags.get().is_empty() {
            text
        } else {
            format!("[{}] {text}", tags.get().join(","))
        }
    }
}

fn print_repeated(inv: &mut Invocation<'_>, settings: &Settings, text: &str) -> anyhow::Result<()> {
    let times = settings.repeat.borrow().get();
    if times < 0 {
        anyhow::bail!("--repeat must not be negative, got {times}");
    }
    let line = settings.render(text);
    for _ in 0..times {
        inv.println(&line)?;
    }
    Ok(())
}

fn build(settings: &Settings) -> Command {
    let echo = settings.clone();
    let reverse = settings.clone();

    Command::new("echo <text...>")
        .short("Print the given text.")
        .long("Joins its arguments with spaces and prints them, decorated as configured.")
        .version(env!("CARGO_PKG_VERSION"))
        .options(settings.options())
        .middleware(require_range_args(1, None))
        .handler(move |inv| {
            debug!(config = %echo.config.borrow(), "echoing");
            let text = inv.args.join(" ");
            print_repeated(inv, &echo, &text)
        })
        .child(
            Command::new("reverse <text...>")
                .short("Print the text backwards.")
                .alias("rev")
                .middleware(require_range_args(1, None))
                .handler(move |inv| {
                    let text: String = inv.args.join(" ").chars().rev().collect();
                    print_repeated(inv, &reverse, &text)
                }),
        )
        .child(
            Command::new("raw [args...]")
                .short("Print the arguments exactly as given, one per line.")
                .raw_args()
                .handler(|inv| {
                    for arg in inv.args.clone() {
                        inv.println(&arg)?;
                    }
                    Ok(())
                }),
        )
        .child(
            Command::new("yell <text...>")
                .short("Print the text in upper case.")
                .deprecated("Use --upper instead.")
                .hidden()
                .handler(|inv| {
                    let text = inv.args.join(" ").to_uppercase();
                    inv.warn("yell", ["this command will be removed"])?;
                    inv.println(&text)?;
                    Ok(())
                }),
        )
}

/// Exit status for a failed run.
fn exit_code(err: &Error) -> u8 {
    if err.as_unknown_subcommand().is_some() {
        return 2;
    }
    match err {
        Error::Flags { .. } | Error::MissingRequired(_) => 2,
        _ => 1,
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::new();
    let mut cmd = build(&settings);
    match cmd.invoke(Vec::<String>::new()).with_os().run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err.as_unknown_subcommand().is_none() {
                eprint!("{}", switchyard_term::Message::error("echo", [err.to_string()]));
            }
            ExitCode::from(exit_code(&err))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use switchyard::Environ;

    use super::*;

    fn run_echo(args: &[&str], env: Environ) -> (Settings, String, switchyard::Result<()>) {
        let settings = Settings::new();
        let mut cmd = build(&settings);
        let mut out = Vec::new();
        let result = cmd
            .invoke(args.iter().copied())
            .environ(env)
            .stdout(&mut out)
            .run();
        (settings, String::from_utf8(out).unwrap(), result)
    }

    #[test]
    fn test_plain_echo() {
        let (_, out, result) = run_echo(&["hello", "world"], Environ::new());
        result.unwrap();
        assert_eq!(out, "hello world\n");
    }

    #[test]
    fn test_flags_shape_output() {
        let (_, out, result) = run_echo(
            &["-u", "--style", "quoted", "-n", "2", "hi"],
            Environ::new(),
        );
        result.unwrap();
        assert_eq!(out, "\"HI\"\n\"HI\"\n");
    }

    #[test]
    fn test_hidden_alias_sets_same_value() {
        let (settings, out, result) = run_echo(&["--shout", "hi"], Environ::new());
        result.unwrap();
        assert!(settings.upper.borrow().get());
        assert_eq!(out, "HI\n");
    }

    #[test]
    fn test_env_and_config() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        writeln!(config, "output:\n  style: banner\n  repeat: 3\ntags: [a, b]").unwrap();
        let env = Environ::new()
            .with_var("ECHO_CONFIG", config.path().display().to_string())
            .with_var("ECHO_REPEAT", "1");
        let (_, out, result) = run_echo(&["ok"], env);
        result.unwrap();
        assert_eq!(out, "[a,b] ==\nok\n==\n");
    }

    #[test]
    fn test_reverse_by_alias() {
        let (_, out, result) = run_echo(&["rev", "abc"], Environ::new());
        result.unwrap();
        assert_eq!(out, "cba\n");
    }

    #[test]
    fn test_raw_passes_flags_through() {
        let (_, out, result) = run_echo(&["raw", "--upper", "-x"], Environ::new());
        result.unwrap();
        assert_eq!(out, "--upper\n-x\n");
    }

    #[test]
    fn test_missing_text() {
        let (_, _, result) = run_echo(&[], Environ::new());
        let err = result.unwrap_err();
        assert_eq!(exit_code(&err), 1);
        assert!(err.to_string().contains("wanted at least 1 args"), "{err}");
    }

    #[test]
    fn test_bad_enum_is_usage_error() {
        let (_, _, result) = run_echo(&["--style", "loud", "x"], Environ::new());
        let err = result.unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_style_completion() {
        let env = Environ::new().with_var(switchyard::COMPLETION_MODE_ENV, "1");
        let (_, out, result) = run_echo(&["--style", ""], env);
        result.unwrap();
        assert_eq!(out, "plain\nquoted\nbanner\n");
    }

    #[test]
    fn test_version() {
        let (_, out, result) = run_echo(&["--version"], Environ::new());
        result.unwrap();
        assert_eq!(out, format!("echo {}\n", env!("CARGO_PKG_VERSION")));
    }
}
