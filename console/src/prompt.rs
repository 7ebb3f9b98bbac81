//! Prompt rendering from the host's working directory hint

/// Longest directory shown in the prompt without shortening
pub const MAX_DISPLAY_LEN: usize = 30;

pub const DEFAULT_PROMPT: &str = ">";

const ELLIPSIS: char = '…';

/// Shorten a directory for display.
///
/// Long paths keep their last component when it fits comfortably,
/// otherwise their last `MAX_DISPLAY_LEN` characters.
pub fn display_path(path: &str) -> String {
    let chars: Vec<char> = path.chars().collect();
    let len = chars.len();
    if len <= MAX_DISPLAY_LEN {
        return path.to_string();
    }

    let start = match chars.iter().rposition(|c| *c == '/' || *c == '\\') {
        Some(sep) if sep > len - MAX_DISPLAY_LEN + 5 => sep,
        _ => len - MAX_DISPLAY_LEN,
    };

    std::iter::once(ELLIPSIS)
        .chain(chars[start..].iter().copied())
        .collect()
}

/// Prompt for a working directory hint
pub fn prompt_for(path: &str) -> String {
    format!("{}>", display_path(path))
}
