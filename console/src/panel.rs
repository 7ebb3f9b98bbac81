//! Console state: scrollback, prompt, history and the in-flight placeholder
//!
//! The console never talks to the relay itself. [`Console::submit`] tells the
//! caller whether a command must be dispatched, and relay traffic comes back
//! in through [`Console::handle_message`].

use console_relay::{Error, HostResponse, RelayMessage};
use tracing::debug;

use crate::commands::{self, LocalCommand};
use crate::history::History;
use crate::prompt::{self, DEFAULT_PROMPT};

pub const AWAITING_PLACEHOLDER: &str = "... (awaiting native response)";
pub const NO_OUTPUT: &str = "Command executed with no output.";
pub const BUSY_NOTICE: &str =
    "A command is still awaiting a native response. Wait for it, or type \"clear\" to release the console.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Output,
    Error,
    Command,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub style: LineStyle,
    pub text: String,
}

/// What the caller must do after a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Empty input; nothing happened
    Ignored,
    /// Answered locally
    Local,
    /// Send this command to the native host
    Dispatch(String),
    /// Rejected because a command is still in flight; keep the input
    Busy,
}

#[derive(Debug)]
pub struct Console {
    lines: Vec<Line>,
    placeholder: Option<usize>,
    prompt: String,
    history: History,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            placeholder: None,
            prompt: DEFAULT_PROMPT.to_string(),
            history: History::new(),
        }
    }

    /// Console showing the start-up banner
    pub fn with_welcome() -> Self {
        let mut console = Self::new();
        for line in commands::WELCOME_LINES {
            console.append(LineStyle::Output, *line);
        }
        console
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn has_pending(&self) -> bool {
        self.placeholder.is_some()
    }

    /// Handle one line typed by the user
    pub fn submit(&mut self, raw: &str) -> Submission {
        let input = raw.trim();
        if input.is_empty() {
            return Submission::Ignored;
        }

        if let Some(local) = commands::parse(input) {
            match local {
                LocalCommand::Clear => self.clear(),
                LocalCommand::Help => {
                    self.history.push(input);
                    self.clear();
                    for line in commands::HELP_LINES {
                        self.append(LineStyle::Output, *line);
                    }
                }
                LocalCommand::Echo(text) => {
                    self.echo_command(input);
                    self.append(LineStyle::Output, text);
                }
            }
            return Submission::Local;
        }

        if self.has_pending() {
            self.append(LineStyle::Info, BUSY_NOTICE);
            return Submission::Busy;
        }

        self.echo_command(input);
        self.append(LineStyle::Info, AWAITING_PLACEHOLDER);
        self.placeholder = Some(self.lines.len() - 1);

        Submission::Dispatch(input.to_string())
    }

    /// Report that a dispatched command never reached the relay.
    ///
    /// Connection failures are skipped: the relay broadcasts those as events
    /// and they are shown when the event arrives.
    pub fn dispatch_failed(&mut self, error: &Error) {
        if error.is_reported_as_event() {
            debug!("Dispatch failure will arrive as an event: {}", error);
            return;
        }
        self.remove_placeholder();
        self.append(
            LineStyle::Error,
            format!("Error sending command to relay: {}", error),
        );
    }

    /// Apply a message broadcast by the relay
    pub fn handle_message(&mut self, message: &RelayMessage) {
        match message {
            RelayMessage::NativeHostResponse { payload } => self.show_response(payload),
            RelayMessage::NativeHostDisconnected { error }
            | RelayMessage::NativeHostConnectionFailed { error } => {
                self.remove_placeholder();
                self.append(
                    LineStyle::Error,
                    format!("Native host status: {}. Some commands may not work.", error),
                );
            }
            RelayMessage::ExecuteNativeCommand { .. } => {
                debug!("Ignoring {} broadcast", message.kind());
            }
        }
    }

    /// Step back in history; returns the text for the input line
    pub fn history_up(&mut self) -> Option<String> {
        self.history.up().map(str::to_string)
    }

    /// Step forward in history; returns the text for the input line
    pub fn history_down(&mut self) -> Option<String> {
        self.history.down().map(str::to_string)
    }

    fn show_response(&mut self, response: &HostResponse) {
        self.remove_placeholder();

        let output = response.output_text();
        if let Some(output) = output {
            self.append(LineStyle::Output, output);
        }
        match response.error_text() {
            Some(error) => self.append(LineStyle::Error, format!("Error: {}", error)),
            None if output.is_none() => self.append(LineStyle::Output, NO_OUTPUT),
            None => {}
        }

        if let Some(dir) = response.directory_hint() {
            self.prompt = prompt::prompt_for(dir);
        }
    }

    /// Show the submitted line after the prompt and record it in history
    fn echo_command(&mut self, input: &str) {
        let line = format!("{}{}", self.prompt, input);
        self.append(LineStyle::Command, line);
        self.history.push(input);
    }

    fn append(&mut self, style: LineStyle, text: impl Into<String>) {
        self.lines.push(Line {
            style,
            text: text.into(),
        });
    }

    fn clear(&mut self) {
        self.lines.clear();
        self.placeholder = None;
    }

    fn remove_placeholder(&mut self) {
        if let Some(index) = self.placeholder.take() {
            self.lines.remove(index);
        }
    }
}
