//! Terminal styling and color detection.

/// ANSI escape codes used by the text renderers.
pub mod colors {
    /// Reset all styling.
    pub const RESET: &str = "\x1b[0m";

    /// Bold reverse red for SPEED badges.
    pub const TAG_SPEED: &str = "\x1b[1;7;31m";
    /// Bold reverse yellow for GEOFENCE badges.
    pub const TAG_GEOFENCE: &str = "\x1b[1;7;33m";

    /// Bright bold white for emphasis (zone and bus names).
    pub const WHITE_BOLD: &str = "\x1b[1;97m";
    /// Gray for secondary details (timestamps, inactive zones).
    pub const GRAY: &str = "\x1b[90m";
    /// Green for zones that pass validation.
    pub const GREEN: &str = "\x1b[32m";
    /// Red for zones that fail validation.
    pub const RED: &str = "\x1b[31m";
}

/// Resolved color codes, either ANSI sequences or empty strings when color
/// is disabled.
#[derive(Debug, Clone, Copy)]
pub struct ColorPalette {
    pub reset: &'static str,
    pub tag_speed: &'static str,
    pub tag_geofence: &'static str,
    pub white_bold: &'static str,
    pub gray: &'static str,
    pub green: &'static str,
    pub red: &'static str,
}

impl ColorPalette {
    #[must_use]
    pub const fn colored() -> Self {
        Self {
            reset: colors::RESET,
            tag_speed: colors::TAG_SPEED,
            tag_geofence: colors::TAG_GEOFENCE,
            white_bold: colors::WHITE_BOLD,
            gray: colors::GRAY,
            green: colors::GREEN,
            red: colors::RED,
        }
    }

    #[must_use]
    pub const fn plain() -> Self {
        Self {
            reset: "",
            tag_speed: "",
            tag_geofence: "",
            white_bold: "",
            gray: "",
            green: "",
            red: "",
        }
    }

    /// `colored()` when [`supports_color`] allows it, otherwise `plain()`.
    #[must_use]
    pub fn detect() -> Self {
        if supports_color() {
            Self::colored()
        } else {
            Self::plain()
        }
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::detect()
    }
}

/// Check whether stdout should receive ANSI color codes.
///
/// Respects `NO_COLOR` (<https://no-color.org/>), `TERM=dumb`, and output
/// that is not a terminal.
#[must_use]
pub fn supports_color() -> bool {
    use std::io::IsTerminal;

    std::io::stdout().is_terminal()
        && color_allowed(
            std::env::var_os("NO_COLOR").is_some(),
            std::env::var("TERM").ok().as_deref(),
        )
}

fn color_allowed(no_color: bool, term: Option<&str>) -> bool {
    if no_color {
        return false;
    }
    !term.is_some_and(|t| t.eq_ignore_ascii_case("dumb"))
}
