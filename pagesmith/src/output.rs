//! Operator-facing console output.
//!
//! Everything here writes to a caller-supplied [`Write`] so the same
//! formatting serves stdout and tests. Diagnostics go through `tracing`
//! (stderr) instead.

use std::io::{self, Write};

use crate::driver::TurnObserver;
use crate::transcript::{Message, Transcript};

const RULE: &str = "=============================";

/// Print a message with its author prefix.
pub fn say<W: Write>(out: &mut W, author: &str, text: &str) -> io::Result<()> {
    writeln!(out, "[{author}] {}\n", text.trim_end())
}

/// One-line status update.
pub fn status<W: Write>(out: &mut W, emoji: &str, text: &str) -> io::Result<()> {
    writeln!(out, "{emoji} {text}")
}

pub fn error<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    status(out, "❌", text)
}

/// Framed section title.
pub fn banner<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out, "\n{RULE}\n{title}\n{RULE}\n")
}

pub fn write_message<W: Write>(out: &mut W, message: &Message) -> io::Result<()> {
    say(out, message.author(), message.content())
}

/// Print the whole conversation, oldest first.
pub fn write_transcript<W: Write>(out: &mut W, transcript: &Transcript) -> io::Result<()> {
    banner(out, "Conversation for review")?;
    for message in transcript.messages() {
        write_message(out, message)?;
    }
    Ok(())
}

/// Streams each new message to stdout as the agents talk.
#[derive(Debug, Default)]
pub struct Console;

impl TurnObserver for Console {
    fn on_message(&mut self, message: &Message) {
        let mut out = io::stdout().lock();
        if let Err(e) = write_message(&mut out, message).and_then(|_| out.flush()) {
            tracing::warn!(error = %e, "Failed to print message");
        }
    }
}
