//! One full run: conversation, approval, extraction, write, publish.

use std::path::PathBuf;

use crate::agents::AgentRoster;
use crate::approval::{Approval, Approver};
use crate::driver::{ConversationDriver, DriverLimits, RunResult, TurnObserver};
use crate::error::RunError;
use crate::extract;
use crate::llm::CompletionProvider;
use crate::publish::{self, PublishOutput, Publisher};
use crate::termination::{SentinelPolicy, TerminationPolicy};

/// Run-level settings.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Where the extracted HTML is written.
    pub output_path: PathBuf,
    pub limits: DriverLimits,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("index.html"),
            limits: DriverLimits::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Turn limit reached before the agents signalled readiness.
    NotReady,
    /// The operator declined; nothing was written.
    Rejected,
    Published {
        path: PathBuf,
        commit_message: String,
        output: PublishOutput,
    },
}

#[derive(Debug)]
pub struct RunReport {
    pub run: RunResult,
    pub outcome: RunOutcome,
}

pub struct Studio {
    provider: Box<dyn CompletionProvider>,
    roster: AgentRoster,
    policy: Box<dyn TerminationPolicy>,
    approver: Box<dyn Approver>,
    publisher: Box<dyn Publisher>,
    config: StudioConfig,
}

impl Studio {
    pub fn new(
        provider: Box<dyn CompletionProvider>,
        roster: AgentRoster,
        approver: Box<dyn Approver>,
        publisher: Box<dyn Publisher>,
        config: StudioConfig,
    ) -> Self {
        Self {
            provider,
            roster,
            policy: Box::new(SentinelPolicy::default()),
            approver,
            publisher,
            config,
        }
    }

    pub fn with_policy(mut self, policy: Box<dyn TerminationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub async fn run(
        &self,
        prompt: &str,
        observer: &mut dyn TurnObserver,
    ) -> Result<RunReport, RunError> {
        let driver = ConversationDriver::new(
            self.provider.as_ref(),
            &self.roster,
            self.policy.as_ref(),
            self.config.limits,
        );
        let mut run = driver.run(prompt, observer).await?;

        if !run.terminated {
            return Ok(RunReport {
                run,
                outcome: RunOutcome::NotReady,
            });
        }

        let decision = self
            .approver
            .decide(&run.transcript)
            .await
            .map_err(RunError::Approval)?;
        run.approved = Some(decision.approval == Approval::Approved);

        if decision.approval == Approval::Rejected {
            tracing::info!("Operator rejected the work");
            return Ok(RunReport {
                run,
                outcome: RunOutcome::Rejected,
            });
        }

        let payload = extract::extract_html(&run.transcript, self.roster.implementer())?;
        let path = self.config.output_path.clone();
        publish::write_payload(&path, &payload).await?;

        let commit_message = publish::commit_message(&path);
        let output = self.publisher.publish(&path, &commit_message).await?;
        tracing::info!(path = %path.display(), "Published");

        Ok(RunReport {
            run,
            outcome: RunOutcome::Published {
                path,
                commit_message,
                output,
            },
        })
    }
}
