//! Command history with shell-style recall

/// Submitted commands, most recent first.
///
/// `cursor` is `None` while the user is not browsing history.
#[derive(Debug, Default, Clone)]
pub struct History {
    entries: Vec<String>,
    cursor: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submitted command and stop browsing.
    ///
    /// A command equal to the most recent entry is not recorded again.
    pub fn push(&mut self, command: &str) {
        if self.entries.first().map(String::as_str) != Some(command) {
            self.entries.insert(0, command.to_string());
        }
        self.cursor = None;
    }

    /// Step toward older entries. Returns the text to show, or `None` when
    /// there is nothing older.
    pub fn up(&mut self) -> Option<&str> {
        let next = match self.cursor {
            None => 0,
            Some(i) => i + 1,
        };
        if next >= self.entries.len() {
            return None;
        }
        self.cursor = Some(next);
        self.entries.get(next).map(String::as_str)
    }

    /// Step toward newer entries. Stepping past the newest entry leaves
    /// history and yields an empty line. Returns `None` when not browsing.
    pub fn down(&mut self) -> Option<&str> {
        match self.cursor? {
            0 => {
                self.cursor = None;
                Some("")
            }
            i => {
                self.cursor = Some(i - 1);
                self.entries.get(i - 1).map(String::as_str)
            }
        }
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
