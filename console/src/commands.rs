//! Commands the console answers itself

/// Help block printed by `help`
pub const HELP_LINES: &[&str] = &[
    " ",
    " ",
    "Available commands:",
    "  clear   - Clears the console output.",
    "  help    - Displays this help message.",
    "  echo <text> - Prints the given text.",
    "  show_dir - Displays the backend path variable.",
    " ",
    "Native OS commands will be executed if the companion native application is installed.",
];

/// Banner shown when the console starts
pub const WELCOME_LINES: &[&str] = &[
    " >",
    " ",
    "Type \"help\" for a list of internal commands.",
    "Native commands require the companion app.",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalCommand<'a> {
    Clear,
    Help,
    Echo(&'a str),
}

/// Recognise a local command in trimmed input. Keywords are matched
/// without regard to case; echoed text is kept as typed.
pub fn parse(input: &str) -> Option<LocalCommand<'_>> {
    if input.eq_ignore_ascii_case("clear") {
        return Some(LocalCommand::Clear);
    }
    if input.eq_ignore_ascii_case("help") {
        return Some(LocalCommand::Help);
    }
    match input.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("echo ") => Some(LocalCommand::Echo(&input[5..])),
        _ => None,
    }
}
