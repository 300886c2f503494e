//! User-facing console lines.
//! Prefixed status messages are colored only when the stream is a TTY; worker
//! progress lines are plain so they can be piped and scripted against.

use owo_colors::OwoColorize;
use std::io::{self, Write};

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn is_tty(self) -> bool {
        match self {
            Stream::Stdout => atty::is(atty::Stream::Stdout),
            Stream::Stderr => atty::is(atty::Stream::Stderr),
        }
    }
}

fn emit(stream: Stream, prefix: &str, colored: String, msg: &str) {
    let line = if stream.is_tty() {
        format!("{colored} {msg}")
    } else {
        format!("{prefix} {msg}")
    };
    // Output is best-effort; a closed pipe must not take the process down.
    let _ = match stream {
        Stream::Stdout => writeln!(io::stdout().lock(), "{line}"),
        Stream::Stderr => writeln!(io::stderr().lock(), "{line}"),
    };
}

pub fn print_info(msg: &str) {
    emit(Stream::Stdout, "info:", "info:".cyan().bold().to_string(), msg);
}

pub fn print_warn(msg: &str) {
    emit(Stream::Stderr, "warn:", "warn:".yellow().bold().to_string(), msg);
}

pub fn print_error(msg: &str) {
    emit(Stream::Stderr, "error:", "error:".red().bold().to_string(), msg);
}

/// Print a plain line (no prefix) and flush, so progress shows up promptly
/// even when stdout is a pipe.
pub fn print_user(msg: &str) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{msg}");
    let _ = out.flush();
}
