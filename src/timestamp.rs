use chrono::NaiveDateTime;

/// Accepted timestamp layouts, tried in order. ISO layouts come first and
/// day/month is preferred over month/day when both would match.
pub const TIMESTAMP_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %I:%M %p",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %I:%M %p",
    "%Y/%m/%d %H:%M",
];

/// Parse a loosely formatted timestamp.
///
/// Returns `None` for empty input or when no layout in [`TIMESTAMP_FORMATS`]
/// matches. Callers treat `None` as "cannot compute" for the row.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}
