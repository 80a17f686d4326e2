//! Styled CLI output with theme-aware colors.
//!
//! Colors are only emitted when the target stream is a terminal and
//! `NO_COLOR` is unset (`--color never` sets it at startup).

use std::io::IsTerminal;

/// Check if colors should be disabled based on NO_COLOR env var.
fn colors_disabled() -> bool {
    std::env::var("NO_COLOR")
        .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
        .unwrap_or(false)
}

fn is_terminal_output(stderr: bool) -> bool {
    if stderr {
        std::io::stderr().is_terminal()
    } else {
        std::io::stdout().is_terminal()
    }
}

/// Whether styled text should carry ANSI codes on the given stream.
pub fn use_colors(stderr: bool) -> bool {
    !colors_disabled() && is_terminal_output(stderr)
}

/// Brand colors for dark terminal backgrounds.
mod dark_theme {
    pub const SUCCESS: &str = "\x1b[38;2;91;154;107m"; // Forest #5B9A6B
    pub const ERROR: &str = "\x1b[38;2;199;93;93m"; // Rust #C75D5D
    pub const ACCENT: &str = "\x1b[38;2;74;155;155m"; // Teal #4A9B9B
    pub const DIM: &str = "\x1b[38;2;130;154;177m";
}

/// Darker variants for light backgrounds.
mod light_theme {
    pub const SUCCESS: &str = "\x1b[38;2;46;110;62m";
    pub const ERROR: &str = "\x1b[38;2;170;51;51m";
    pub const ACCENT: &str = "\x1b[38;2;30;105;105m";
    pub const DIM: &str = "\x1b[38;2;100;100;100m";
}

const RESET: &str = "\x1b[0m";

/// Detect a light terminal background from COLORFGBG ("fg;bg").
fn is_light_theme() -> bool {
    if let Ok(colorfgbg) = std::env::var("COLORFGBG")
        && let Some(bg_str) = colorfgbg.split(';').next_back()
        && let Ok(bg_num) = bg_str.parse::<u8>()
    {
        return bg_num >= 7;
    }
    false
}

/// Message type for styled output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Success,
    Error,
    /// Teal accent for names and commands
    Accent,
    Dim,
}

impl MessageType {
    fn icon(&self) -> &'static str {
        match self {
            MessageType::Success => "[OK]",
            MessageType::Error => "[ERROR]",
            MessageType::Accent => "[INFO]",
            MessageType::Dim => "-",
        }
    }

    fn color(&self) -> &'static str {
        let light = is_light_theme();
        match (self, light) {
            (MessageType::Success, false) => dark_theme::SUCCESS,
            (MessageType::Error, false) => dark_theme::ERROR,
            (MessageType::Accent, false) => dark_theme::ACCENT,
            (MessageType::Dim, false) => dark_theme::DIM,
            (MessageType::Success, true) => light_theme::SUCCESS,
            (MessageType::Error, true) => light_theme::ERROR,
            (MessageType::Accent, true) => light_theme::ACCENT,
            (MessageType::Dim, true) => light_theme::DIM,
        }
    }
}

fn format_styled(msg_type: MessageType, message: &str, to_stderr: bool) -> String {
    if use_colors(to_stderr) {
        format!("{}{} {}{}", msg_type.color(), msg_type.icon(), message, RESET)
    } else {
        format!("{} {}", msg_type.icon(), message)
    }
}

/// Print an error message to stderr: `[ERROR] message`.
pub fn print_error(message: &str) {
    eprintln!("{}", format_styled(MessageType::Error, message, true));
}

/// Print a success message to stdout: `[OK] message`.
pub fn println_success(message: &str) {
    println!("{}", format_styled(MessageType::Success, message, false));
}

/// Color a label for inline use on stdout or stderr.
pub fn styled_label(msg_type: MessageType, label: &str, to_stderr: bool) -> String {
    if use_colors(to_stderr) {
        format!("{}{}{}", msg_type.color(), label, RESET)
    } else {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_message_type_icons() {
        assert_eq!(MessageType::Success.icon(), "[OK]");
        assert_eq!(MessageType::Error.icon(), "[ERROR]");
        assert_eq!(MessageType::Dim.icon(), "-");
    }

    #[test]
    #[serial]
    fn test_format_styled_no_color() {
        // SAFETY: These tests run serially and we restore env vars immediately
        unsafe { std::env::set_var("NO_COLOR", "1") };
        assert_eq!(
            format_styled(MessageType::Error, "boom", true),
            "[ERROR] boom"
        );
        assert_eq!(styled_label(MessageType::Accent, "v1.2.3", true), "v1.2.3");
        unsafe { std::env::remove_var("NO_COLOR") };
    }

    #[test]
    #[serial]
    fn test_colors_disabled() {
        // SAFETY: These tests run serially and we restore env vars immediately
        unsafe { std::env::set_var("NO_COLOR", "1") };
        assert!(colors_disabled());
        unsafe { std::env::set_var("NO_COLOR", "true") };
        assert!(colors_disabled());
        unsafe { std::env::set_var("NO_COLOR", "0") };
        assert!(!colors_disabled());
        unsafe { std::env::set_var("NO_COLOR", "false") };
        assert!(!colors_disabled());
        unsafe { std::env::set_var("NO_COLOR", "") };
        assert!(!colors_disabled());
        unsafe { std::env::remove_var("NO_COLOR") };
    }

    #[test]
    #[serial]
    fn test_light_theme_detection() {
        // SAFETY: These tests run serially and we restore env vars immediately
        unsafe { std::env::set_var("COLORFGBG", "0;15") };
        assert!(is_light_theme());
        assert_eq!(MessageType::Error.color(), light_theme::ERROR);
        unsafe { std::env::set_var("COLORFGBG", "15;0") };
        assert!(!is_light_theme());
        unsafe { std::env::remove_var("COLORFGBG") };
    }
}
