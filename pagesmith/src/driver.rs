//! Round-robin conversation between the agents.
//!
//! One agent speaks per turn, in roster order. After every reply the
//! termination policy looks at the transcript; the loop also stops at the
//! turn limit. A failed or timed-out completion aborts the run and nothing
//! is appended for that turn.

use std::time::Duration;

use crate::agents::AgentRoster;
use crate::error::RunError;
use crate::llm::CompletionProvider;
use crate::termination::TerminationPolicy;
use crate::transcript::{Message, Transcript};

/// Receives each message as soon as it is appended.
pub trait TurnObserver {
    fn on_message(&mut self, message: &Message);
}

impl<F: FnMut(&Message)> TurnObserver for F {
    fn on_message(&mut self, message: &Message) {
        self(message)
    }
}

/// Bounds on a single conversation.
#[derive(Debug, Clone, Copy)]
pub struct DriverLimits {
    /// Agent replies allowed before giving up.
    pub max_turns: usize,
    /// Per-completion timeout.
    pub turn_timeout: Duration,
}

impl Default for DriverLimits {
    fn default() -> Self {
        Self {
            max_turns: 30,
            turn_timeout: Duration::from_secs(120),
        }
    }
}

/// Outcome of one conversation.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub transcript: Transcript,
    /// The termination policy fired (as opposed to hitting the turn limit).
    pub terminated: bool,
    /// Human decision; `None` until the approval gate has run.
    pub approved: Option<bool>,
}

pub struct ConversationDriver<'a> {
    provider: &'a dyn CompletionProvider,
    roster: &'a AgentRoster,
    policy: &'a dyn TerminationPolicy,
    limits: DriverLimits,
}

impl<'a> ConversationDriver<'a> {
    pub fn new(
        provider: &'a dyn CompletionProvider,
        roster: &'a AgentRoster,
        policy: &'a dyn TerminationPolicy,
        limits: DriverLimits,
    ) -> Self {
        Self {
            provider,
            roster,
            policy,
            limits,
        }
    }

    /// Run the conversation from the operator's opening request.
    pub async fn run(
        &self,
        prompt: &str,
        observer: &mut dyn TurnObserver,
    ) -> Result<RunResult, RunError> {
        let mut transcript = Transcript::new();
        observer.on_message(transcript.push_user(prompt));

        for turn in 0..self.limits.max_turns {
            let agent = self.roster.for_turn(turn);
            tracing::info!(turn = turn + 1, agent = %agent.name, "Agent turn");

            let reply = match tokio::time::timeout(
                self.limits.turn_timeout,
                self.provider.complete(agent, &transcript),
            )
            .await
            {
                Ok(Ok(reply)) => reply,
                Ok(Err(source)) => {
                    tracing::error!(agent = %agent.name, error = %source, "Completion failed");
                    return Err(RunError::Provider {
                        agent: agent.name.clone(),
                        source,
                    });
                }
                Err(_) => {
                    tracing::error!(agent = %agent.name, "Completion timed out");
                    return Err(RunError::ProviderTimeout {
                        agent: agent.name.clone(),
                        timeout: self.limits.turn_timeout,
                    });
                }
            };

            observer.on_message(transcript.push_agent(agent.name.as_str(), reply));

            if self.policy.should_terminate(&transcript) {
                tracing::info!(agent = %agent.name, turns = turn + 1, "Termination signal received");
                return Ok(RunResult {
                    transcript,
                    terminated: true,
                    approved: None,
                });
            }
        }

        tracing::warn!(
            max_turns = self.limits.max_turns,
            turns = transcript.agent_turns(),
            "Turn limit reached without a ready signal"
        );
        Ok(RunResult {
            transcript,
            terminated: false,
            approved: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AgentDefinition, PRODUCT_OWNER};
    use crate::llm::ProviderError;
    use crate::termination::SentinelPolicy;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies and records who was asked.
    struct Scripted {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        asked: Mutex<Vec<(String, usize)>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                asked: Mutex::new(Vec::new()),
            }
        }

        fn ok(replies: &[&str]) -> Self {
            Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
        }

        fn asked(&self) -> Vec<(String, usize)> {
            self.asked.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionProvider for Scripted {
        async fn complete(
            &self,
            agent: &AgentDefinition,
            transcript: &Transcript,
        ) -> Result<String, ProviderError> {
            self.asked
                .lock()
                .unwrap()
                .push((agent.name.clone(), transcript.len()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("still working".to_string()))
        }
    }

    struct Stalled;

    #[async_trait]
    impl CompletionProvider for Stalled {
        async fn complete(&self, _: &AgentDefinition, _: &Transcript) -> Result<String, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    fn limits(max_turns: usize) -> DriverLimits {
        DriverLimits {
            max_turns,
            turn_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn agents_take_turns_in_roster_order() {
        let provider = Scripted::ok(&["plan", "```html\n<p>x</p>\n```", "READY FOR USER APPROVAL"]);
        let roster = AgentRoster::default();
        let policy = SentinelPolicy::default();
        let driver = ConversationDriver::new(&provider, &roster, &policy, limits(10));

        let mut seen = Vec::new();
        let mut observer = |m: &Message| seen.push(m.author().to_string());
        let result = driver.run("landing page", &mut observer).await.unwrap();

        assert!(result.terminated);
        assert_eq!(result.approved, None);
        assert_eq!(result.transcript.len(), 4);
        assert_eq!(seen, vec!["User", "BusinessAnalyst", "SoftwareEngineer", "ProductOwner"]);
        // each agent sees everything appended before its turn
        assert_eq!(
            provider.asked(),
            vec![
                ("BusinessAnalyst".to_string(), 1),
                ("SoftwareEngineer".to_string(), 2),
                ("ProductOwner".to_string(), 3),
            ]
        );
    }

    #[tokio::test]
    async fn termination_is_checked_after_every_message() {
        // the analyst signals readiness mid-round
        let provider = Scripted::ok(&["READY FOR USER APPROVAL"]);
        let roster = AgentRoster::default();
        let policy = SentinelPolicy::default();
        let driver = ConversationDriver::new(&provider, &roster, &policy, limits(10));

        let result = driver.run("page", &mut |_: &Message| {}).await.unwrap();
        assert!(result.terminated);
        assert_eq!(result.transcript.agent_turns(), 1);
    }

    #[tokio::test]
    async fn wraps_around_the_roster() {
        let provider = Scripted::ok(&["a", "b", "Missing footer", "a2", "b2", "ready for user approval "]);
        let roster = AgentRoster::default();
        let policy = SentinelPolicy::default();
        let driver = ConversationDriver::new(&provider, &roster, &policy, limits(10));

        let result = driver.run("page", &mut |_: &Message| {}).await.unwrap();
        assert!(result.terminated);
        assert_eq!(result.transcript.agent_turns(), 6);
        assert_eq!(result.transcript.last().unwrap().author(), PRODUCT_OWNER);
    }

    #[tokio::test]
    async fn stops_at_turn_limit() {
        let provider = Scripted::ok(&[]);
        let roster = AgentRoster::default();
        let policy = SentinelPolicy::default();
        let driver = ConversationDriver::new(&provider, &roster, &policy, limits(4));

        let result = driver.run("page", &mut |_: &Message| {}).await.unwrap();
        assert!(!result.terminated);
        assert_eq!(result.transcript.agent_turns(), 4);
    }

    #[tokio::test]
    async fn provider_error_aborts_without_appending() {
        let provider = Scripted::new(vec![
            Ok("plan".to_string()),
            Err(ProviderError::RateLimited("quota".to_string())),
        ]);
        let roster = AgentRoster::default();
        let policy = SentinelPolicy::default();
        let driver = ConversationDriver::new(&provider, &roster, &policy, limits(10));

        let mut appended = 0;
        let mut observer = |_: &Message| appended += 1;
        let err = driver.run("page", &mut observer).await.unwrap_err();

        match err {
            RunError::Provider { agent, source } => {
                assert_eq!(agent, "SoftwareEngineer");
                assert!(matches!(source, ProviderError::RateLimited(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        // user message + analyst reply only
        assert_eq!(appended, 2);
        assert_eq!(provider.asked().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let roster = AgentRoster::default();
        let policy = SentinelPolicy::default();
        let driver = ConversationDriver::new(
            &Stalled,
            &roster,
            &policy,
            DriverLimits {
                max_turns: 3,
                turn_timeout: Duration::from_secs(30),
            },
        );

        let err = driver.run("page", &mut |_: &Message| {}).await.unwrap_err();
        assert!(matches!(
            err,
            RunError::ProviderTimeout { ref agent, timeout } if agent == "BusinessAnalyst" && timeout == Duration::from_secs(30)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn sub_second_timeout_is_reported_exactly() {
        let roster = AgentRoster::default();
        let policy = SentinelPolicy::default();
        let driver = ConversationDriver::new(
            &Stalled,
            &roster,
            &policy,
            DriverLimits {
                max_turns: 3,
                turn_timeout: Duration::from_millis(500),
            },
        );

        let err = driver.run("page", &mut |_: &Message| {}).await.unwrap_err();
        assert_eq!(err.to_string(), "BusinessAnalyst did not answer within 500ms");
    }
}
