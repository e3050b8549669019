//! Agent roles and the roster that orders them.
//!
//! Every agent has the same capability (reply to the transcript under its
//! own instructions), so roles are plain values rather than types.
//!
//! The default roster:
//! - BusinessAnalyst: turns the request into requirements
//! - SoftwareEngineer: writes the page as a fenced ```html block
//! - ProductOwner: reviews and signals READY FOR USER APPROVAL

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::transcript::USER_AUTHOR;

pub const BUSINESS_ANALYST: &str = "BusinessAnalyst";
pub const SOFTWARE_ENGINEER: &str = "SoftwareEngineer";
pub const PRODUCT_OWNER: &str = "ProductOwner";

const BUSINESS_ANALYST_INSTRUCTIONS: &str = "You are a Business Analyst which will take the requirements from the user (also known as a 'customer') and create a project plan for creating the requested app. The Business Analyst understands the user requirements and creates detailed documents with requirements and costing. The documents should be usable by the SoftwareEngineer as a reference for implementing the required features, and by the Product Owner for reference to determine if the application delivered by the Software Engineer meets all of the user's requirements.";

const SOFTWARE_ENGINEER_INSTRUCTIONS: &str = "You are a Software Engineer, and your goal is create a web app using HTML and JavaScript by taking into consideration all the requirements given by the Business Analyst. The application should implement all the requested features. Deliver the code to the Product Owner for review when completed. You can also ask questions of the BusinessAnalyst to clarify any requirements that are unclear.";

const PRODUCT_OWNER_INSTRUCTIONS: &str = "You are the Product Owner which will review the software engineer's code to ensure all user requirements are completed. You are the guardian of quality, ensuring the final product meets all specifications. IMPORTANT: Verify that the Software Engineer has shared the HTML code using the format ```html [code] ```. This format is required for the code to be saved and pushed to GitHub. Once all client requirements are completed and the code is properly formatted, reply with 'READY FOR USER APPROVAL'. If there are missing features or formatting issues, you will need to send a request back to the SoftwareEngineer or BusinessAnalyst with details of the defect.";

/// A role in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    pub instructions: String,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read roster file: {0}")]
    Read(#[from] std::io::Error),
    #[error("invalid roster file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("a roster needs at least 2 agents, got {0}")]
    TooFewAgents(usize),
    #[error("agent name must not be empty")]
    EmptyName,
    #[error("agent name {0:?} is reserved for the operator")]
    ReservedName(String),
    #[error("duplicate agent name: {0}")]
    DuplicateName(String),
    #[error("implementer {0:?} is not one of the agents")]
    UnknownImplementer(String),
}

/// Ordered agents plus the name of the one whose HTML gets published.
#[derive(Debug, Clone)]
pub struct AgentRoster {
    agents: Vec<AgentDefinition>,
    implementer: String,
}

#[derive(Deserialize)]
struct RosterFile {
    implementer: String,
    agents: Vec<AgentDefinition>,
}

impl AgentRoster {
    /// Build a roster, checking names are unique and the implementer exists.
    pub fn new(agents: Vec<AgentDefinition>, implementer: impl Into<String>) -> Result<Self, RosterError> {
        let implementer = implementer.into();
        if agents.len() < 2 {
            return Err(RosterError::TooFewAgents(agents.len()));
        }
        let mut seen = HashSet::new();
        for agent in &agents {
            if agent.name.trim().is_empty() {
                return Err(RosterError::EmptyName);
            }
            if agent.name == USER_AUTHOR {
                return Err(RosterError::ReservedName(agent.name.clone()));
            }
            if !seen.insert(agent.name.as_str()) {
                return Err(RosterError::DuplicateName(agent.name.clone()));
            }
        }
        if !seen.contains(implementer.as_str()) {
            return Err(RosterError::UnknownImplementer(implementer));
        }
        Ok(Self { agents, implementer })
    }

    /// Parse a roster from TOML text.
    ///
    /// ```toml
    /// implementer = "SoftwareEngineer"
    ///
    /// [[agents]]
    /// name = "BusinessAnalyst"
    /// instructions = "..."
    /// ```
    pub fn from_toml(text: &str) -> Result<Self, RosterError> {
        let file: RosterFile = toml::from_str(text)?;
        Self::new(file.agents, file.implementer)
    }

    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn agents(&self) -> &[AgentDefinition] {
        &self.agents
    }

    /// Name of the agent whose fenced HTML is extracted.
    pub fn implementer(&self) -> &str {
        &self.implementer
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agent for a zero-based turn number, cycling through the roster.
    pub fn for_turn(&self, turn: usize) -> &AgentDefinition {
        &self.agents[turn % self.agents.len()]
    }
}

impl Default for AgentRoster {
    fn default() -> Self {
        Self {
            agents: vec![
                AgentDefinition::new(BUSINESS_ANALYST, BUSINESS_ANALYST_INSTRUCTIONS),
                AgentDefinition::new(SOFTWARE_ENGINEER, SOFTWARE_ENGINEER_INSTRUCTIONS),
                AgentDefinition::new(PRODUCT_OWNER, PRODUCT_OWNER_INSTRUCTIONS),
            ],
            implementer: SOFTWARE_ENGINEER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roster_order() {
        let roster = AgentRoster::default();
        let names: Vec<&str> = roster.agents().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec![BUSINESS_ANALYST, SOFTWARE_ENGINEER, PRODUCT_OWNER]);
        assert_eq!(roster.implementer(), SOFTWARE_ENGINEER);
        assert!(roster.for_turn(2).instructions.contains("READY FOR USER APPROVAL"));
    }

    #[test]
    fn for_turn_cycles() {
        let roster = AgentRoster::default();
        assert_eq!(roster.for_turn(0).name, BUSINESS_ANALYST);
        assert_eq!(roster.for_turn(3).name, BUSINESS_ANALYST);
        assert_eq!(roster.for_turn(4).name, SOFTWARE_ENGINEER);
        assert_eq!(roster.for_turn(8).name, PRODUCT_OWNER);
    }

    #[test]
    fn rejects_single_agent() {
        let err = AgentRoster::new(vec![AgentDefinition::new("Solo", "x")], "Solo").unwrap_err();
        assert!(matches!(err, RosterError::TooFewAgents(1)));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = AgentRoster::new(
            vec![AgentDefinition::new("A", "x"), AgentDefinition::new("A", "y")],
            "A",
        )
        .unwrap_err();
        assert!(matches!(err, RosterError::DuplicateName(ref n) if n == "A"));
    }

    #[test]
    fn rejects_operator_name() {
        let err = AgentRoster::new(
            vec![
                AgentDefinition::new(USER_AUTHOR, "x"),
                AgentDefinition::new("Dev", "y"),
            ],
            USER_AUTHOR,
        )
        .unwrap_err();
        assert!(matches!(err, RosterError::ReservedName(ref n) if n == USER_AUTHOR));
    }

    #[test]
    fn rejects_operator_name_in_toml() {
        let err = AgentRoster::from_toml(
            r#"
implementer = "Dev"

[[agents]]
name = "User"
instructions = "Pretend to be the customer."

[[agents]]
name = "Dev"
instructions = "Build it."
"#,
        )
        .unwrap_err();
        assert!(matches!(err, RosterError::ReservedName(_)));
    }

    #[test]
    fn rejects_unknown_implementer() {
        let err = AgentRoster::new(
            vec![AgentDefinition::new("A", "x"), AgentDefinition::new("B", "y")],
            "C",
        )
        .unwrap_err();
        assert!(matches!(err, RosterError::UnknownImplementer(ref n) if n == "C"));
    }

    #[test]
    fn parses_toml() {
        let roster = AgentRoster::from_toml(
            r#"
implementer = "Dev"

[[agents]]
name = "Planner"
instructions = "Plan it."

[[agents]]
name = "Dev"
instructions = "Build it."
"#,
        )
        .unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.implementer(), "Dev");
        assert_eq!(roster.for_turn(1).instructions, "Build it.");
    }

    #[test]
    fn bad_toml_is_parse_error() {
        let err = AgentRoster::from_toml("agents = 3").unwrap_err();
        assert!(matches!(err, RosterError::Parse(_)));
    }
}
