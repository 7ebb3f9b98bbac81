//! Crossterm front-end.
//!
//! Terminal input is read on a dedicated OS thread and forwarded over a
//! `tokio::sync::mpsc` channel; everything else runs on the tokio runtime.
//! Relay dispatches run in spawned tasks so the loop never waits on the relay.

use std::io::{self, Write};
use std::time::Duration;

use console_relay::{RelayClient, Result as RelayResult};
use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::panel::{Console, Line, LineStyle, Submission};

/// Terminal events forwarded from the reader thread
enum TermEvent {
    Key(KeyEvent),
    Resize,
}

/// Outcome of a single key press
#[derive(Debug, PartialEq, Eq)]
enum KeyAction {
    None,
    Quit,
    Dispatch(String),
}

/// Restores the terminal when the front-end exits, including on error paths
struct ScreenGuard;

impl ScreenGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Run the interactive console until the user quits
pub async fn run(client: RelayClient) -> anyhow::Result<()> {
    let mut relay_rx = client.subscribe();
    let (dispatch_tx, mut dispatch_rx) = mpsc::channel::<RelayResult<()>>(16);

    let _screen = ScreenGuard::enter()?;

    let cancel = CancellationToken::new();
    let (term_tx, mut term_rx) = mpsc::channel::<TermEvent>(64);
    let reader_cancel = cancel.clone();
    let reader = std::thread::spawn(move || read_terminal(term_tx, reader_cancel));

    let mut console = Console::with_welcome();
    let mut input = String::new();
    let mut stdout = io::stdout();
    draw(&mut stdout, &console, &input)?;

    info!("Console started");

    let result: anyhow::Result<()> = loop {
        tokio::select! {
            term_event = term_rx.recv() => {
                let Some(term_event) = term_event else {
                    break Ok(());
                };
                let TermEvent::Key(key) = term_event else {
                    draw(&mut stdout, &console, &input)?;
                    continue;
                };
                match handle_key(&mut console, &mut input, key) {
                    KeyAction::Quit => break Ok(()),
                    KeyAction::Dispatch(command) => {
                        let client = client.clone();
                        let tx = dispatch_tx.clone();
                        tokio::spawn(async move {
                            let result = client.execute(command).await;
                            let _ = tx.send(result).await;
                        });
                    }
                    KeyAction::None => {}
                }
            }
            message = relay_rx.recv() => {
                match message {
                    Ok(message) => console.handle_message(&message),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Console lagged; {} relay messages skipped", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break Err(anyhow::anyhow!("relay closed"));
                    }
                }
            }
            Some(result) = dispatch_rx.recv() => {
                if let Err(e) = result {
                    warn!(code = e.code(), "Dispatch failed: {}", e);
                    console.dispatch_failed(&e);
                }
            }
        }
        draw(&mut stdout, &console, &input)?;
    };

    cancel.cancel();
    drop(term_rx);
    let _ = reader.join();

    info!("Console stopped");
    result
}

/// Poll crossterm for input until told to stop or the UI loop goes away
fn read_terminal(tx: mpsc::Sender<TermEvent>, cancel: CancellationToken) {
    while !cancel.is_cancelled() {
        if !event::poll(Duration::from_millis(50)).unwrap_or(false) {
            continue;
        }
        let forwarded = match event::read() {
            Ok(Event::Key(key)) if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) => {
                TermEvent::Key(key)
            }
            Ok(Event::Resize(_, _)) => TermEvent::Resize,
            _ => continue,
        };
        if tx.blocking_send(forwarded).is_err() {
            break;
        }
    }
}

fn handle_key(console: &mut Console, input: &mut String, key: KeyEvent) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('d') if ctrl => KeyAction::Quit,
        KeyCode::Esc => KeyAction::Quit,
        KeyCode::Enter => match console.submit(input) {
            Submission::Busy => KeyAction::None,
            Submission::Dispatch(command) => {
                input.clear();
                KeyAction::Dispatch(command)
            }
            Submission::Local | Submission::Ignored => {
                input.clear();
                KeyAction::None
            }
        },
        KeyCode::Up => {
            if let Some(text) = console.history_up() {
                *input = text;
            }
            KeyAction::None
        }
        KeyCode::Down => {
            if let Some(text) = console.history_down() {
                *input = text;
            }
            KeyAction::None
        }
        KeyCode::Backspace => {
            input.pop();
            KeyAction::None
        }
        KeyCode::Char(c) if !ctrl => {
            input.push(c);
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

/// Screen rows for the scrollback, newest at the bottom.
///
/// Multi-line entries are split into rows and rows wider than the screen are
/// wrapped by display width, so only the last `height` rows are kept.
fn visible_rows(lines: &[Line], width: usize, height: usize) -> Vec<(LineStyle, String)> {
    let width = width.max(1);
    let mut rows: Vec<(LineStyle, String)> = Vec::new();
    for line in lines {
        for text in line.text.split('\n') {
            for row in wrap(text.trim_end_matches('\r'), width) {
                rows.push((line.style, row));
            }
        }
    }
    let skip = rows.len().saturating_sub(height);
    rows.split_off(skip)
}

/// Split one row of text into pieces at most `width` columns wide.
/// A glyph wider than the screen still gets a row of its own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width && !current.is_empty() {
            rows.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(c);
        used += w;
    }
    rows.push(current);
    rows
}

/// Screen column just after `edit_line`, kept on screen
fn caret_column(edit_line: &str, cols: u16) -> u16 {
    let last = usize::from(cols.saturating_sub(1));
    u16::try_from(edit_line.width().min(last)).unwrap_or(cols.saturating_sub(1))
}

fn draw<W: Write>(out: &mut W, console: &Console, input: &str) -> io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let scrollback = usize::from(rows.saturating_sub(1));

    queue!(out, Clear(ClearType::All))?;
    for (row, (style, text)) in visible_rows(console.lines(), usize::from(cols), scrollback)
        .into_iter()
        .enumerate()
    {
        queue!(out, MoveTo(0, row as u16))?;
        match style {
            LineStyle::Command => queue!(out, SetAttribute(Attribute::Bold), Print(text))?,
            LineStyle::Error => queue!(out, SetForegroundColor(Color::Red), Print(text))?,
            LineStyle::Info => queue!(out, SetAttribute(Attribute::Dim), Print(text))?,
            LineStyle::Output => queue!(out, Print(text))?,
        }
        queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
    }

    let edit_line = format!("{}{}", console.prompt(), input);
    let caret = caret_column(&edit_line, cols);
    queue!(
        out,
        MoveTo(0, rows.saturating_sub(1)),
        Print(edit_line),
        MoveTo(caret, rows.saturating_sub(1))
    )?;
    out.flush()
}
