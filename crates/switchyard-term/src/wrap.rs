//! Width-aware word wrapping.

use unicode_width::UnicodeWidthStr;

/// Width used when no terminal is attached.
pub const DEFAULT_WIDTH: usize = 80;

/// Gets the current terminal width, or [`DEFAULT_WIDTH`] if not available.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Wraps text to the terminal width.
pub fn wrap_tty(text: &str) -> String {
    wrap(text, terminal_width())
}

/// Greedy word wrap that keeps existing line breaks.
///
/// Words longer than `width` are left on their own line rather than split.
///
/// ```rust
/// use switchyard_term::wrap;
///
/// assert_eq!(wrap("one two three", 7), "one two\nthree");
/// ```
pub fn wrap(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let mut current = 0;
        for word in line.split_whitespace() {
            let w = word.width();
            if current > 0 && current + 1 + w > width {
                out.push('\n');
                current = 0;
            } else if current > 0 {
                out.push(' ');
                current += 1;
            }
            out.push_str(word);
            current += w;
        }
    }
    out
}

/// Wraps `body` so it fits next to `spaces` columns of indentation, then
/// indents every line.
pub fn indent(body: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    let limit = terminal_width().saturating_sub(spaces);
    wrap(body, limit)
        .lines()
        .map(|line| format!("{pad}{line}\n"))
        .collect()
}
