// Filters registered on the guide template environment.

pub use self::italic as filter_italic;
pub use self::heading as filter_heading;

/// Wraps text in the markup dialect's italic markers.
pub fn italic(s: String) -> String {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("*{}*", trimmed)
    }
}

/// Collapses a title onto a single line so it cannot break the header.
pub fn heading(s: String) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
