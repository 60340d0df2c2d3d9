//! # Switchyard Term - terminal helpers for switchyard CLIs
//!
//! This crate holds the small amount of terminal awareness the command
//! framework needs: a color profile detected once per process, the default
//! style palette, human-readable CLI messages and width-aware wrapping.
//!
//! ## Color profile lifecycle
//!
//! The [`ColorProfile`] is detected lazily on first use and never changes
//! afterwards. Programs (and tests that want deterministic output) can pin it
//! up front with [`init_color_profile`]; after initialization every read is
//! lock-free and safe from any thread.
//!
//! ```rust
//! use switchyard_term::{init_color_profile, color_profile, ColorProfile};
//!
//! let _ = init_color_profile(ColorProfile::Ascii);
//! assert_eq!(color_profile(), ColorProfile::Ascii);
//! ```
//!
//! ## Messages
//!
//! ```rust
//! use switchyard_term::Message;
//!
//! let msg = Message::warn("Config file ignored", ["No such file."]);
//! assert!(msg.to_string().contains("Config file ignored"));
//! ```

mod message;
mod profile;
mod style;
mod wrap;

pub use message::{Message, MessageKind};
pub use profile::{color_profile, detect_color_profile, init_color_profile, ColorProfile};
pub use style::{
    bold, code, error, fg256, field, header, key_value_pair, keyword, placeholder, warn, Styles,
    DEFAULT_STYLES,
};
pub use wrap::{indent, terminal_width, wrap, wrap_tty, DEFAULT_WIDTH};
