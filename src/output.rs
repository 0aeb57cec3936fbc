use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Whether `BACH_QUIET` asks for banners and summaries to be suppressed.
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| std::env::var("BACH_QUIET").map(|v| parse_flag(&v)).unwrap_or(false))
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
