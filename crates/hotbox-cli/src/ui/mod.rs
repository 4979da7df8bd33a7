//! Terminal output for people watching the server.
//!
//! Status lines go to stderr with a colored glyph. Machine-filterable events
//! go through `tracing` instead (see [`crate::logger`]).

mod format;
mod messages;

pub use format::format_duration;
pub use messages::{info, success, warning};

/// Check if color output should be enabled.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise colors follow whether stderr
/// is a terminal.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Apply the color decision to `owo-colors`' global override.
pub fn init_colors(no_color: bool) {
    owo_colors::set_override(!no_color && should_use_color());
}
