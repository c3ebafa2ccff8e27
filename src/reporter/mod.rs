//! Reporter module for output formatting

pub mod console;
pub mod embed;
pub mod html;
pub mod json;

pub use console::ConsoleReporter;
pub use html::HtmlReporter;
pub use json::JsonReporter;

/// Human-readable duration: `1.23s` below a minute, `2m3.45s` above
pub fn format_duration(seconds: f64) -> String {
    if seconds >= 60.0 {
        let minutes = (seconds / 60.0).floor();
        let rest = seconds - minutes * 60.0;
        format!("{}m{:.2}s", minutes as u64, rest)
    } else {
        format!("{:.2}s", seconds)
    }
}
