//! Default help output.
//!
//! Help goes to stdout: a help request and a mistyped subcommand look the
//! same from here, so the page is printed either way and the caller learns
//! about the mistake through the returned error.

use std::fmt::Write as _;

use switchyard_term::{header, indent, keyword, placeholder, wrap, terminal_width};

use crate::command::Command;
use crate::error::UnknownSubcommandError;
use crate::invocation::Invocation;
use crate::option::Opt;

/// Columns between a subcommand's name and its description.
const NAME_GAP: usize = 4;

/// Prints the help page of the selected command.
///
/// Leftover arguments mean the user named a subcommand that does not exist.
/// They produce an [`UnknownSubcommandError`] after the page is printed,
/// plus a note on stderr unless the usage line declares `<arguments>`.
pub fn default_help(inv: &mut Invocation<'_>) -> anyhow::Result<()> {
    let page = render_help(inv);
    inv.print(&page)?;

    if let Some(first) = inv.args.first() {
        if !wants_args(&inv.command.usage) {
            let note = format!("---\nerror: unknown subcommand {first:?}\n");
            inv.eprint(&note)?;
        }
        return Err(UnknownSubcommandError {
            args: inv.args.clone(),
        }
        .into());
    }
    Ok(())
}

fn wants_args(usage: &str) -> bool {
    usage
        .find('<')
        .is_some_and(|open| usage[open..].contains('>'))
}

/// Options sharing a group, in display order.
struct OptionGroup<'a> {
    name: String,
    description: String,
    options: Vec<&'a Opt>,
}

fn option_groups<'a>(options: impl IntoIterator<Item = &'a Opt>) -> Vec<OptionGroup<'a>> {
    let mut groups = vec![OptionGroup {
        name: String::new(),
        description: String::new(),
        options: Vec::new(),
    }];
    let mut options: Vec<&Opt> = options.into_iter().filter(|o| !o.hidden).collect();
    options.sort_by(|a, b| a.name.cmp(&b.name));

    for opt in options {
        let Some(group) = opt.group.as_ref() else {
            groups[0].options.push(opt);
            continue;
        };
        let name = group.full_name();
        match groups.iter_mut().find(|g| g.name == name) {
            Some(existing) => existing.options.push(opt),
            None => groups.push(OptionGroup {
                name,
                description: group.description.clone(),
                options: vec![opt],
            }),
        }
    }
    groups.sort_by(|a, b| a.name.cmp(&b.name));
    groups.retain(|g| !g.options.is_empty());
    groups
}

fn render_help(inv: &Invocation<'_>) -> String {
    let cmd = inv.command;
    let mut out = String::new();

    let _ = writeln!(out, "{}", header("usage"));
    out.push_str(&indent(&inv.full_usage(), 2));
    out.push('\n');

    if !cmd.short.is_empty() {
        out.push_str(&indent(&cmd.short, 2));
        out.push('\n');
    }
    if !cmd.aliases.is_empty() {
        let _ = writeln!(out, "  Aliases: {}\n", cmd.aliases.join(", "));
    }
    if !cmd.long.is_empty() {
        out.push_str(&indent(&cmd.long, 2));
        out.push('\n');
    }

    render_subcommands(&mut out, cmd);

    for group in option_groups(cmd.options.iter()) {
        let title = if group.name.is_empty() {
            "options".to_string()
        } else {
            format!("{} options", group.name)
        };
        render_group(&mut out, &title, &group);
    }

    let ancestors = &inv.lineage()[..inv.lineage().len().saturating_sub(1)];
    let globals = option_groups(ancestors.iter().flat_map(|c| c.options.iter()));
    for group in globals {
        let title = if group.name.is_empty() {
            "global options".to_string()
        } else {
            format!("global {} options", group.name)
        };
        render_group(&mut out, &title, &group);
    }

    let root = inv.lineage().first().map_or(cmd.name(), |c| c.name());
    let _ = writeln!(
        out,
        "---\nRun `{}` for more information.",
        keyword(&format!("{root} --help"))
    );
    out
}

fn render_subcommands(out: &mut String, cmd: &Command) {
    let visible: Vec<&Command> = cmd.children.iter().filter(|c| !c.hidden).collect();
    if visible.is_empty() {
        return;
    }
    let width = visible.iter().map(|c| c.name().len()).max().unwrap_or(0);
    let desc_start = NAME_GAP + width + NAME_GAP;
    let desc_width = terminal_width().saturating_sub(desc_start);

    let _ = writeln!(out, "{}", header("subcommands"));
    for child in visible {
        let _ = write!(
            out,
            "{:gap$}{}{:pad$}",
            "",
            keyword(child.name()),
            "",
            gap = NAME_GAP,
            pad = width - child.name().len() + NAME_GAP,
        );
        let short = wrap(&child.short, desc_width);
        for (i, line) in short.lines().enumerate() {
            if i > 0 {
                out.push_str(&" ".repeat(desc_start));
            }
            out.push_str(line);
            out.push('\n');
        }
        if short.is_empty() {
            out.push('\n');
        }
    }
    out.push('\n');
}

fn render_group(out: &mut String, title: &str, group: &OptionGroup<'_>) {
    let _ = writeln!(out, "{}", header(title));
    if !group.description.is_empty() {
        out.push_str(&indent(&group.description.replace('\n', " "), 2));
        out.push('\n');
    }
    for opt in &group.options {
        let _ = writeln!(out, "  {}", option_signature(opt));
        let mut body = opt.description.clone();
        if !opt.default.is_empty() {
            let _ = write!(body, " (default: {})", opt.default);
        }
        if !opt.use_instead.is_empty() {
            let _ = write!(body, "\nDEPRECATED: Use {} instead.", use_instead(opt));
        }
        let body = body.trim();
        if !body.is_empty() {
            out.push_str(&indent(body, 6));
        }
        out.push('\n');
    }
}

/// `-s, --flag <type>, $ENV`, omitting what the option does not bind.
fn option_signature(opt: &Opt) -> String {
    let mut parts = Vec::new();
    if !opt.flag.is_empty() {
        let mut flag = String::new();
        if let Some(c) = opt.flag_shorthand {
            let _ = write!(flag, "-{c}, ");
        }
        let _ = write!(flag, "--{}", opt.flag);
        if let Some(kind) = type_hint(opt) {
            let _ = write!(flag, " {}", placeholder(&kind));
        }
        parts.push(keyword(&flag));
    }
    if !opt.env.is_empty() {
        parts.push(format!("${}", opt.env));
    }
    if parts.is_empty() {
        return keyword(&opt.name);
    }
    parts.join(", ")
}

/// Placeholder for the option's argument. Switches take none.
fn type_hint(opt: &Opt) -> Option<String> {
    let value = opt.value.as_ref()?;
    let value = value.borrow();
    if value.no_opt_default().is_some() {
        return None;
    }
    Some(match value.choices() {
        Some(choices) if value.is_slice() => format!("[{}]", choices.join("|")),
        Some(choices) => choices.join("|"),
        None => value.type_name(),
    })
}

/// Human list of the replacements for a deprecated option.
fn use_instead(opt: &Opt) -> String {
    let names: Vec<String> = opt
        .use_instead
        .iter()
        .map(|s| {
            if !s.flag.is_empty() {
                format!("--{}", s.flag)
            } else if let Some(c) = s.flag_shorthand {
                format!("-{c}")
            } else if !s.env.is_empty() {
                format!("${}", s.env)
            } else {
                s.name.clone()
            }
        })
        .collect();
    match names.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {last}", rest.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::group::Group;
    use crate::value::{BoolValue, Enum, Shared, StringValue};

    fn render(cmd: Command, args: &[&str]) -> (String, String, crate::Result<()>) {
        let _ = switchyard_term::init_color_profile(switchyard_term::ColorProfile::Ascii);
        let mut cmd = cmd;
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = cmd
            .invoke(args.iter().copied())
            .stdout(&mut out)
            .stderr(&mut err)
            .run();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
            result,
        )
    }

    fn app() -> Command {
        Command::new("app")
            .short("Does app things.")
            .option(
                Opt::new("Verbose")
                    .description("Talk more.")
                    .flag("verbose")
                    .shorthand('v')
                    .value(Shared::new(BoolValue::default()).handle()),
            )
            .child(
                Command::new("deploy <service>")
                    .short("Deploy a service.")
                    .alias("d")
                    .option(
                        Opt::new("Mode")
                            .description("Rollout mode.")
                            .flag("mode")
                            .env("APP_MODE")
                            .default_value("fast")
                            .group(Group::new("Rollout"))
                            .value(Shared::new(Enum::new(["fast", "safe"])).handle()),
                    )
                    .handler(|_| Ok(())),
            )
            .child(Command::new("internal").hidden().handler(|_| Ok(())))
    }

    #[test]
    fn test_root_page_lists_visible_subcommands() {
        let (out, _, result) = render(app(), &[]);
        result.unwrap();
        assert!(out.starts_with("USAGE:\n  app\n"), "{out}");
        assert!(out.contains("SUBCOMMANDS:\n    deploy    Deploy a service.\n"), "{out}");
        assert!(!out.contains("internal"));
        assert!(out.contains("-v, --verbose\n"), "{out}");
    }

    #[test]
    fn test_child_page_shows_groups_and_globals() {
        let (out, _, result) = render(app(), &["deploy", "--help"]);
        result.unwrap();
        assert!(out.contains("USAGE:\n  app deploy <service>\n"), "{out}");
        assert!(out.contains("Aliases: d"), "{out}");
        assert!(out.contains("ROLLOUT OPTIONS:"), "{out}");
        assert!(out.contains("--mode fast|safe, $APP_MODE"), "{out}");
        assert!(out.contains("(default: fast)"), "{out}");
        assert!(out.contains("GLOBAL OPTIONS:"), "{out}");
    }

    #[test]
    fn test_unknown_subcommand() {
        let (out, err, result) = render(app(), &["bogus"]);
        assert!(out.starts_with("USAGE:"));
        assert_eq!(err, "---\nerror: unknown subcommand \"bogus\"\n");
        let err = result.unwrap_err();
        assert_eq!(
            err.as_unknown_subcommand().map(|e| e.args.clone()),
            Some(vec!["bogus".to_string()])
        );
        assert!(matches!(err, Error::UnknownSubcommand(_)));
    }

    #[test]
    fn test_deprecated_option_names_replacements() {
        let opt = Opt::new("Old")
            .use_instead(Opt::new("a").flag("new"))
            .use_instead(Opt::new("b").env("NEW"))
            .use_instead(Opt::new("c").value(Shared::new(StringValue::default()).handle()));
        assert_eq!(use_instead(&opt), "--new, $NEW and c");
    }

    #[test]
    fn test_wants_args() {
        assert!(wants_args("deploy <service>"));
        assert!(!wants_args("deploy [flags]"));
    }
}
