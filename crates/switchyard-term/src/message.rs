//! Human-readable CLI messages.
//!
//! A message is a styled header followed by indented, bar-prefixed lines:
//!
//! ```text
//! WARNING: Config file ignored
//!   | No such file.
//! ```

use std::fmt;

use console::Style;

use crate::style::{bold, Styles, DEFAULT_STYLES};

/// Severity of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Warn,
    Error,
}

/// A header plus detail lines, rendered with the default palette.
#[derive(Debug, Clone)]
pub struct Message {
    pub kind: MessageKind,
    pub header: String,
    pub lines: Vec<String>,
}

impl Message {
    pub fn new<I, S>(kind: MessageKind, header: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            header: header.into(),
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn info<I, S>(header: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(MessageKind::Info, header, lines)
    }

    pub fn warn<I, S>(header: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(MessageKind::Warn, header, lines)
    }

    pub fn error<I, S>(header: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(MessageKind::Error, header, lines)
    }

    fn style(&self) -> Style {
        match self.kind {
            MessageKind::Info => Style::new(),
            MessageKind::Warn => DEFAULT_STYLES.warn.clone(),
            MessageKind::Error => DEFAULT_STYLES.error.clone(),
        }
    }

    fn prefix(&self) -> Option<&'static str> {
        match self.kind {
            MessageKind::Info => None,
            MessageKind::Warn => Some("WARNING: "),
            MessageKind::Error => Some("ERROR: "),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = self.style();
        if let Some(prefix) = self.prefix() {
            write!(f, "{}", bold(prefix))?;
        }
        write!(f, "{}\r\n", Styles::paint(&style, &self.header))?;
        let bar = Styles::paint(&style, "|");
        for line in &self.lines {
            write!(f, "  {} {}\r\n", bar, line)?;
        }
        Ok(())
    }
}
