//! Process-wide color profile.
//!
//! The profile is computed at most once. The first call to [`color_profile`]
//! runs detection unless [`init_color_profile`] already pinned a value, and
//! from then on the answer is immutable for the lifetime of the process.
//!
//! # Detection
//!
//! - `NO_COLOR` set to any non-empty value forces [`ColorProfile::Ascii`]
//! - otherwise `console`'s stdout color detection decides

use once_cell::sync::OnceCell;

/// How much styling the terminal accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorProfile {
    /// No escape sequences at all.
    Ascii,
    /// ANSI escape sequences are emitted.
    Ansi,
}

impl ColorProfile {
    /// Returns true when styles should be applied.
    pub fn is_styled(self) -> bool {
        matches!(self, ColorProfile::Ansi)
    }
}

static PROFILE: OnceCell<ColorProfile> = OnceCell::new();

/// Returns the process color profile, detecting it on first use.
pub fn color_profile() -> ColorProfile {
    *PROFILE.get_or_init(detect_color_profile)
}

/// Pins the process color profile.
///
/// Must run before the first [`color_profile`] read to take effect. Returns
/// the already-installed profile as the error when initialization already
/// happened.
pub fn init_color_profile(profile: ColorProfile) -> Result<(), ColorProfile> {
    PROFILE.set(profile).map_err(|_| color_profile())
}

/// Runs color detection without touching the process-wide profile.
pub fn detect_color_profile() -> ColorProfile {
    match std::env::var("NO_COLOR") {
        Ok(val) if !val.is_empty() => ColorProfile::Ascii,
        _ if console::colors_enabled() => ColorProfile::Ansi,
        _ => ColorProfile::Ascii,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_no_color_forces_ascii() {
        std::env::set_var("NO_COLOR", "1");
        assert_eq!(detect_color_profile(), ColorProfile::Ascii);
        std::env::remove_var("NO_COLOR");
    }

    #[test]
    #[serial]
    fn test_profile_is_initialized_once() {
        let first = color_profile();
        let other = match first {
            ColorProfile::Ascii => ColorProfile::Ansi,
            ColorProfile::Ansi => ColorProfile::Ascii,
        };
        assert_eq!(init_color_profile(other), Err(first));
        assert_eq!(color_profile(), first);
    }

    #[test]
    fn test_is_styled() {
        assert!(ColorProfile::Ansi.is_styled());
        assert!(!ColorProfile::Ascii.is_styled());
    }
}
