//! System clipboard access through the platform's copy command.

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

#[cfg(target_os = "macos")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("pbcopy", &[])];
#[cfg(target_os = "windows")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("cmd", &["/C", "clip"])];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Copies `text` using the first clipboard command that succeeds.
pub fn copy_to_clipboard(text: &str) -> Result<(), String> {
    for (cmd, args) in CLIPBOARD_COMMANDS {
        match run_with_stdin(cmd, args, text) {
            Ok(()) => return Ok(()),
            Err(err) => debug!("{err}"),
        }
    }
    let tried: Vec<&str> = CLIPBOARD_COMMANDS.iter().map(|(cmd, _)| *cmd).collect();
    Err(format!(
        "No clipboard command succeeded (tried {})",
        tried.join(", ")
    ))
}

fn run_with_stdin(cmd: &str, args: &[&str], input: &str) -> Result<(), String> {
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|_| format!("Clipboard command `{cmd}` not available"))?;

    if let Some(mut stdin) = child.stdin.take() {
        // Dropping stdin closes the pipe so the command sees end of input.
        let _ = stdin.write_all(input.as_bytes());
    }
    match child.wait() {
        Ok(status) if status.success() => Ok(()),
        _ => Err(format!("Clipboard command `{cmd}` failed")),
    }
}
