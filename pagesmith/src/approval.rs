//! Human sign-off between "the agents are done" and "publish".
//!
//! The gate keeps asking until it reads an explicit decision. There is no
//! retry limit; end of input is reported as an error rather than guessed.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;

use crate::output;
use crate::transcript::Transcript;

pub const PROMPT: &str = ">>> Type 'APPROVED' to finalize and push, or 'REJECT' to cancel: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    Approved,
    Rejected,
}

/// The decision plus how many times the operator had to be asked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDecision {
    pub approval: Approval,
    pub reprompts: usize,
}

/// Map a line of operator input to a decision, if it is one.
pub fn parse_decision(line: &str) -> Option<Approval> {
    match line.trim().to_uppercase().as_str() {
        "APPROVED" => Some(Approval::Approved),
        "REJECT" => Some(Approval::Rejected),
        _ => None,
    }
}

/// Run the prompt loop over arbitrary input and output streams.
///
/// With `review` set, the whole transcript is written out first.
pub fn ask<R: BufRead, W: Write>(
    transcript: &Transcript,
    review: bool,
    input: &mut R,
    out: &mut W,
) -> io::Result<GateDecision> {
    if review {
        output::write_transcript(out, transcript)?;
    }
    writeln!(
        out,
        "\n✅ The agents have completed their work. Please review the conversation."
    )?;

    let mut reprompts = 0;
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let mut raw = Vec::new();
        if input.read_until(b'\n', &mut raw)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before a decision was made",
            ));
        }

        match parse_decision(&String::from_utf8_lossy(&raw)) {
            Some(approval) => {
                tracing::info!(?approval, reprompts, "Operator decision");
                return Ok(GateDecision {
                    approval,
                    reprompts,
                });
            }
            None => {
                writeln!(out, "   Invalid input. Please try again.")?;
                reprompts += 1;
            }
        }
    }
}

/// Source of the publish decision for a finished conversation.
#[async_trait]
pub trait Approver: Send + Sync {
    async fn decide(&self, transcript: &Transcript) -> io::Result<GateDecision>;
}

/// Asks on the controlling terminal.
#[derive(Debug, Clone, Copy)]
pub struct TerminalGate {
    pub review: bool,
}

#[async_trait]
impl Approver for TerminalGate {
    async fn decide(&self, transcript: &Transcript) -> io::Result<GateDecision> {
        let transcript = transcript.clone();
        let review = self.review;
        tokio::task::spawn_blocking(move || {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut out = io::stdout();
            ask(&transcript, review, &mut input, &mut out)
        })
        .await
        .map_err(io::Error::other)?
    }
}
