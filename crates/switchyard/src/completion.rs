//! Shell completion.
//!
//! With [`COMPLETION_MODE_ENV`](crate::COMPLETION_MODE_ENV) present, a run
//! resolves the command tree as usual and then, instead of running the
//! selected command, prints candidates for the word under the cursor, one
//! per line. Candidates are not filtered by prefix; shells do that.

pub use crate::command::CompletionHandlerFn;
use crate::invocation::Invocation;
use crate::source::ValueSource;

/// Candidates for the word under the cursor.
pub(crate) fn complete(inv: &Invocation<'_>) -> Vec<String> {
    let (prev, cur) = inv.cur_words();

    if let Some(flag) = cur.strip_prefix("--") {
        if let Some((name, _)) = flag.split_once('=') {
            if let Some(out) = complete_flag(inv, name) {
                return out
                    .into_iter()
                    .map(|value| format!("--{name}={value}"))
                    .collect();
            }
        } else if inv.command.options.by_flag(flag).is_some() {
            // Echo a complete flag so the shell moves the cursor on.
            return vec![cur.to_string()];
        }
    }

    if let Some(flag) = prev.strip_prefix("--") {
        if let Some(out) = complete_flag(inv, flag) {
            return out;
        }
    }

    if inv.command.name() == cur {
        return vec![cur.to_string()];
    }

    let mut out = inv
        .command
        .completion_handler
        .as_ref()
        .map(|h| h(inv))
        .unwrap_or_default();
    out.extend(default_completion_handler(inv));
    out
}

/// Value candidates for the option bound to `--flag`. `None` when no
/// option has that flag or it offers nothing to complete.
fn complete_flag(inv: &Invocation<'_>, flag: &str) -> Option<Vec<String>> {
    let opt = inv.command.options.by_flag(flag)?;
    if let Some(h) = &opt.completion_handler {
        return Some(h(inv));
    }
    let value = opt.value.as_ref()?;
    let value = value.borrow();
    value.choices().map(<[String]>::to_vec)
}

/// Visible child names, then `--flag` for every option a user could still
/// give: those no source has set beyond their default, and lists, which
/// accept repeats.
pub fn default_completion_handler(inv: &Invocation<'_>) -> Vec<String> {
    let children = inv
        .command
        .children
        .iter()
        .filter(|c| !c.hidden)
        .map(|c| c.name().to_string());
    let flags = inv
        .command
        .options
        .iter()
        .filter(|o| !o.flag.is_empty() && !o.hidden)
        .filter(|o| o.value_source.priority() <= ValueSource::Default.priority() || o.is_slice())
        .map(|o| format!("--{}", o.flag));
    children.chain(flags).collect()
}
