use crate::diagnostics::Diagnostic;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::SEARCH, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().dim.clone()), value);
}

/// Print one diagnostic in the `line:col ***ERROR*** message` form.
///
/// Goes to stdout so the listing can be piped and diffed.
pub fn diagnostic(diag: &Diagnostic) {
    println!(
        "{} {} {}",
        diag.pos.style(theme().position.clone()),
        "***ERROR***".style(theme().error.clone()),
        diag.message
    );
}
