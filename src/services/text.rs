/// Collapses every whitespace run, newlines included, into one space and
/// trims both ends.
///
/// The ASCII information separators (U+001C..=U+001F) count as whitespace
/// as well.
pub fn normalize_whitespace(raw: &str) -> String {
    raw.split(is_separator)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}
