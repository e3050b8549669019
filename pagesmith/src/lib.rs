//! pagesmith: a three-agent page builder with a human in the loop.
//!
//! A business analyst, a software engineer and a product owner take turns
//! on a shared transcript until the product owner signals readiness. A human
//! then approves or rejects; on approval the engineer's HTML is written to
//! disk and handed to a publish script.
//!
//! - Conversation: round-robin driver with a pluggable termination policy
//! - Approval: terminal gate, blocking on an explicit decision
//! - Publish: HTML extraction, file write, push script

pub mod agents;
pub mod approval;
pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
pub mod llm;
pub mod output;
pub mod publish;
pub mod studio;
pub mod termination;
pub mod transcript;
