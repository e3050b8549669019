//! pagesmith: three AI agents draft a web page, a human approves it, a
//! script pushes it.
//!
//! The agents' conversation streams to stdout. Once the product owner
//! replies READY FOR USER APPROVAL the operator types APPROVED or REJECT.
//! On approval the engineer's ```html blocks are written to `--output` and
//! `--publish-script` is run with the commit message.
//!
//! Provider settings come from flags or the environment:
//!   AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_API_KEY, AZURE_OPENAI_DEPLOYMENT_NAME
//!   or, with `--provider anthropic`, ANTHROPIC_API_KEY.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use pagesmith::approval::TerminalGate;
use pagesmith::config::Cli;
use pagesmith::error::RunError;
use pagesmith::llm::LlmClient;
use pagesmith::output::{self, Console};
use pagesmith::publish::{PublishError, ScriptPublisher};
use pagesmith::studio::{RunOutcome, Studio};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagesmith=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Cli::parse();

    let roster = args.roster().context("Failed to load the roster file")?;
    let client = LlmClient::new(args.provider_config()?).context("Invalid provider configuration")?;

    tracing::info!(
        provider = ?args.provider,
        agents = roster.len(),
        implementer = %roster.implementer(),
        output = %args.output.display(),
        "Starting pagesmith"
    );

    let studio = Studio::new(
        Box::new(client),
        roster,
        Box::new(TerminalGate {
            review: !args.skip_review,
        }),
        Box::new(ScriptPublisher::new(&args.publish_script, args.publish_timeout())),
        args.studio_config(),
    );

    let mut out = io::stdout();
    output::banner(&mut out, &format!("Starting Agent Collaboration for: '{}'", args.prompt))?;

    let mut console = Console;
    let mut run = Box::pin(studio.run(&args.prompt, &mut console));
    let finished = tokio::select! {
        result = &mut run => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    let Some(result) = finished else {
        // kills a publish script that is still running
        drop(run);
        tracing::warn!("Interrupted");
        output::error(&mut out, "Interrupted.")?;
        out.flush()?;
        // a pending stdin read would otherwise hold the runtime open
        std::process::exit(130);
    };

    match result {
        Ok(report) => {
            output::banner(&mut out, "Agent Collaboration Finished")?;
            match report.outcome {
                RunOutcome::NotReady => {
                    output::status(
                        &mut out,
                        "⚠️",
                        "Chat concluded without reaching the user approval stage. Exiting.",
                    )?;
                }
                RunOutcome::Rejected => {
                    output::status(&mut out, "🛑", "User has rejected the work. Exiting without action.")?;
                }
                RunOutcome::Published { path, output: publish_output, .. } => {
                    output::status(
                        &mut out,
                        "✅",
                        &format!("Successfully extracted HTML and saved to '{}'", path.display()),
                    )?;
                    if !publish_output.stdout.trim().is_empty() {
                        writeln!(out, "{}", publish_output.stdout.trim_end())?;
                    }
                    output::status(&mut out, "✅", "Git push process completed successfully.")?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            report_failure(&mut out, &args, &e)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report_failure<W: Write>(out: &mut W, args: &Cli, err: &RunError) -> io::Result<()> {
    match err {
        RunError::Publish(publish_err) => {
            output::status(
                out,
                "✅",
                &format!("Successfully extracted HTML and saved to '{}'", args.output.display()),
            )?;
            output::error(out, "Error during Git push process:")?;
            match publish_err {
                PublishError::Failed { stderr, .. } => writeln!(out, "{}", stderr.trim_end()),
                other => writeln!(out, "{other}"),
            }
        }
        RunError::NoContentExtracted(reason) => {
            output::error(out, &format!("{reason}. No file created."))
        }
        other => output::error(out, &other.to_string()),
    }
}
