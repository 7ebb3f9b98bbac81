//! Scriptable native messaging host used by the integration tests.
//!
//! Commands:
//! - `cd <dir>`: change directory and report it
//! - `show_dir`: report the working directory
//! - `args`: echo the launch arguments
//! - `fail <msg>`: answer with an error and no output
//! - `silent`: answer with neither output nor error
//! - `garbage`: send a frame that is not JSON
//! - `quit`: exit with status 0
//! - `exit <code>`: exit with the given status
//! - anything else: answer `ran: <command>`

use std::path::Path;

use console_relay::protocol::native::{self, MAX_OUTBOUND_MESSAGE_SIZE};
use console_relay::OutboundRequest;
use serde_json::{json, Value};
use tokio::io::{self, AsyncWriteExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut stdin = io::stdin();
    let mut stdout = io::stdout();

    while let Some(request) =
        native::read_message::<_, OutboundRequest>(&mut stdin, MAX_OUTBOUND_MESSAGE_SIZE).await?
    {
        eprintln!("fake host received {:?}", request.command);

        let command = request.command.trim();
        let (verb, rest) = command.split_once(' ').unwrap_or((command, ""));
        let answer = match verb {
            "quit" => std::process::exit(0),
            "exit" => std::process::exit(rest.parse().unwrap_or(1)),
            "garbage" => {
                stdout.write_all(&3u32.to_ne_bytes()).await?;
                stdout.write_all(b"{x}").await?;
                stdout.flush().await?;
                continue;
            }
            "cd" => match std::env::set_current_dir(Path::new(rest)) {
                Ok(()) => reply("", ""),
                Err(e) => reply("", &format!("cd: {}: {}", rest, e)),
            },
            "show_dir" => reply(&current_dir(), ""),
            "args" => reply(&std::env::args().skip(1).collect::<Vec<_>>().join(" "), ""),
            "fail" => reply("", rest),
            "silent" => json!({}),
            _ => reply(&format!("ran: {}", command), ""),
        };

        native::write_message(&mut stdout, &answer).await?;
    }

    Ok(())
}

fn current_dir() -> String {
    std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default()
}

fn reply(output: &str, error: &str) -> Value {
    json!({
        "output": output,
        "error": error,
        "current_dir_for_browser": current_dir(),
        "return_code": if error.is_empty() { 0 } else { 1 },
    })
}
