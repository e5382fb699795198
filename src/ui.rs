use console::{strip_ansi_codes, Term};
use owo_colors::OwoColorize;
use unicode_width::UnicodeWidthStr;

use panorama::routing::Access;
use panorama::session::SessionState;

/// Terminal output helpers
pub struct UI {
    term: Term,
}

impl UI {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    /// Helper method to conditionally apply color based on terminal support
    fn colorize<F>(&self, text: &str, color_fn: F) -> String
    where
        F: FnOnce(&str) -> String,
    {
        if self.supports_color() {
            color_fn(text)
        } else {
            text.to_string()
        }
    }

    pub fn success(&self, message: &str) {
        let output = self.colorize(message, |m| m.green().bold().to_string());
        println!("{}", output);
    }

    pub fn error(&self, message: &str) {
        let output = self.colorize(message, |m| m.red().bold().to_string());
        eprintln!("{}", output);
    }

    pub fn warning(&self, message: &str) {
        let output = self.colorize(message, |m| m.yellow().bold().to_string());
        println!("{}", output);
    }

    pub fn info(&self, message: &str) {
        let output = self.colorize(message, |m| m.blue().bold().to_string());
        println!("{}", output);
    }

    /// Format session state with appropriate color (if supported)
    pub fn format_session_state(&self, state: SessionState) -> String {
        let text = session_state_label(state);
        match state {
            SessionState::Authenticated => self.colorize(text, |t| t.green().to_string()),
            SessionState::Loading | SessionState::Uninitialized => {
                self.colorize(text, |t| t.yellow().to_string())
            }
            SessionState::Unauthenticated => self.colorize(text, |t| t.red().to_string()),
        }
    }

    /// Format a guard decision
    pub fn format_access(&self, access: Access) -> String {
        let text = access_label(access);
        match access {
            Access::Allow => self.colorize(&text, |t| t.green().to_string()),
            Access::Wait => self.colorize(&text, |t| t.yellow().to_string()),
            Access::Redirect(_) => self.colorize(&text, |t| t.red().to_string()),
        }
    }

    /// Format user field with fallback for missing data
    pub fn format_user_field(&self, value: Option<String>) -> String {
        value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "-".to_string())
    }

    /// Create a card-style display for information
    pub fn card(&self, title: &str, content: Vec<(&str, String)>) {
        let term_width = self.width();
        let card_width = term_width.saturating_sub(4).clamp(50, 80);

        let supports_color = self.supports_color();

        println!("╭{}╮", "─".repeat(card_width - 2));
        let title_width = title.width();
        let title_spaces = card_width.saturating_sub(title_width + 4);
        if supports_color {
            println!("│ {} {}│", title.cyan().bold(), " ".repeat(title_spaces));
        } else {
            println!("│ {} {}│", title, " ".repeat(title_spaces));
        }
        println!("├{}┤", "─".repeat(card_width - 2));

        for (label, value) in content {
            // Strip ANSI codes for width calculations
            let label_plain = strip_ansi_codes(label);
            let value_plain = strip_ansi_codes(&value);

            let content_width = label_plain.width() + value_plain.width() + 4;
            let spaces = if content_width < card_width - 1 {
                card_width - content_width - 1
            } else {
                1
            };

            if supports_color {
                println!("│ {}: {}{}│", label.dimmed(), value, " ".repeat(spaces));
            } else {
                println!("│ {}: {}{}│", label, value, " ".repeat(spaces));
            }
        }

        println!("╰{}╯", "─".repeat(card_width - 2));
        println!();
    }

    /// Get terminal width for responsive layout
    pub fn width(&self) -> usize {
        self.term.size().1 as usize
    }

    /// Check if terminal supports color
    pub fn supports_color(&self) -> bool {
        self.term.features().colors_supported()
    }
}

impl Default for UI {
    fn default() -> Self {
        Self::new()
    }
}

pub fn session_state_label(state: SessionState) -> &'static str {
    match state {
        SessionState::Uninitialized => "Not checked",
        SessionState::Loading => "Checking",
        SessionState::Authenticated => "Authenticated",
        SessionState::Unauthenticated => "Not authenticated",
    }
}

pub fn access_label(access: Access) -> String {
    match access {
        Access::Allow => "Allowed".to_string(),
        Access::Wait => "Waiting for session".to_string(),
        Access::Redirect(route) => format!("Redirect to {}", route),
    }
}

/// Human readable remaining lifetime, e.g. `59m 58s`
pub fn format_remaining(secs: i64) -> String {
    let secs = secs.max(0);
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m {}s", minutes, seconds)
    }
}
