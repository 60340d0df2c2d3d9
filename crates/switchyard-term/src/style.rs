//! Default style palette and the helpers that apply it.
//!
//! Every helper consults [`color_profile`](crate::color_profile) and returns
//! the input unchanged on plain terminals, so callers never branch on
//! terminal capabilities themselves.

use console::{Color, Style};
use once_cell::sync::Lazy;

use crate::profile::color_profile;

/// Named styles used by messages and help output.
#[derive(Debug, Clone)]
pub struct Styles {
    pub bold: Style,
    pub code: Style,
    pub error: Style,
    pub field: Style,
    pub header: Style,
    pub hyperlink: Style,
    pub keyword: Style,
    pub placeholder: Style,
    pub warn: Style,
}

impl Default for Styles {
    fn default() -> Self {
        // No light/dark adaptation: that would need a terminal round-trip.
        Self {
            bold: Style::new().bold(),
            code: Style::new().color256(204).on_color256(236),
            error: Style::new().red(),
            field: Style::new().white().on_color256(235),
            header: Style::new().color256(67).bold(),
            hyperlink: Style::new().magenta().underlined(),
            keyword: Style::new().green(),
            placeholder: Style::new().magenta(),
            warn: Style::new().yellow(),
        }
    }
}

impl Styles {
    /// Applies `style` to `text` when the terminal accepts styling.
    pub fn paint(style: &Style, text: &str) -> String {
        if color_profile().is_styled() {
            style.clone().force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}

/// The palette shared by the whole process.
pub static DEFAULT_STYLES: Lazy<Styles> = Lazy::new(Styles::default);

/// Renders text in bold.
pub fn bold(text: &str) -> String {
    Styles::paint(&DEFAULT_STYLES.bold, text)
}

pub fn code(text: &str) -> String {
    Styles::paint(&DEFAULT_STYLES.code, text)
}

pub fn error(text: &str) -> String {
    Styles::paint(&DEFAULT_STYLES.error, text)
}

pub fn field(text: &str) -> String {
    Styles::paint(&DEFAULT_STYLES.field, text)
}

pub fn keyword(text: &str) -> String {
    Styles::paint(&DEFAULT_STYLES.keyword, text)
}

pub fn placeholder(text: &str) -> String {
    Styles::paint(&DEFAULT_STYLES.placeholder, text)
}

pub fn warn(text: &str) -> String {
    Styles::paint(&DEFAULT_STYLES.warn, text)
}

/// Formats a section header: upper-cased, colon-terminated, colored.
///
/// ```rust
/// use switchyard_term::{header, init_color_profile, ColorProfile};
///
/// let _ = init_color_profile(ColorProfile::Ascii);
/// assert_eq!(header("usage"), "USAGE:");
/// ```
pub fn header(text: &str) -> String {
    let upper = format!("{}:", text.to_uppercase());
    Styles::paint(&DEFAULT_STYLES.header, &upper)
}

/// Formats `key:value` with the field and keyword styles.
pub fn key_value_pair(key: &str, value: &str) -> String {
    format!("{}:{}", field(key), keyword(value))
}

/// Returns a style that paints with a 256-color foreground.
pub fn fg256(index: u8) -> Style {
    Style::new().fg(Color::Color256(index))
}
