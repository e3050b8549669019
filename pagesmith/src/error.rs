//! Failures that end a run.
//!
//! None of these are retried. `main` reports them and exits non-zero.

use std::time::Duration;

use crate::extract::NoContent;
use crate::llm::ProviderError;
use crate::publish::{PublishError, WriteError};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{agent} could not get a completion: {source}")]
    Provider {
        agent: String,
        #[source]
        source: ProviderError,
    },
    #[error("{agent} did not answer within {timeout:?}")]
    ProviderTimeout { agent: String, timeout: Duration },
    #[error("approval aborted: {0}")]
    Approval(#[source] std::io::Error),
    #[error("nothing to publish: {0}")]
    NoContentExtracted(#[from] NoContent),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}
