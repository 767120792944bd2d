//! Colored status output

use std::sync::LazyLock;

use owo_colors::{OwoColorize, colors::css};

static COLOR: LazyLock<bool> =
    LazyLock::new(|| supports_color::on(supports_color::Stream::Stdout).is_some());

/// How a piece of status output should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A document that parsed cleanly (green)
    Passed,
    /// A document with problems (amber)
    Failed,
    /// Totals and other summaries (blue)
    Summary,
    /// Annotations in the margin (dimmed)
    Margin,
}

/// Extension trait for styling status output
pub trait Colorize {
    /// Styles the text, or returns it unchanged if stdout has no color
    /// support.
    fn styled(&self, status: Status) -> String;
}

impl Colorize for str {
    fn styled(&self, status: Status) -> String {
        if !*COLOR {
            return self.to_string();
        }
        match status {
            Status::Passed => self.fg::<css::Green>().to_string(),
            Status::Failed => self.fg::<css::Orange>().to_string(),
            Status::Summary => self.fg::<css::LightBlue>().to_string(),
            Status::Margin => self.dimmed().to_string(),
        }
    }
}

impl Colorize for String {
    fn styled(&self, status: Status) -> String {
        self.as_str().styled(status)
    }
}
