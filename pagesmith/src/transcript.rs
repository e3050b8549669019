//! The shared conversation record.
//!
//! A [`Transcript`] is append-only: messages get their sequence index on
//! push and are never edited or removed afterwards.

/// Author name used for the operator's opening request.
pub const USER_AUTHOR: &str = "User";

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Agent,
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    role: Role,
    author: String,
    content: String,
    seq: usize,
}

impl Message {
    pub fn role(&self) -> Role {
        self.role
    }

    /// Agent name, or [`USER_AUTHOR`] for the opening request.
    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Position in the transcript, starting at 0.
    pub fn seq(&self) -> usize {
        self.seq
    }
}

/// Ordered, append-only list of messages.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the operator's message and return it.
    pub fn push_user(&mut self, content: impl Into<String>) -> &Message {
        self.push(Role::User, USER_AUTHOR.to_string(), content.into())
    }

    /// Append an agent's reply and return it.
    pub fn push_agent(&mut self, author: impl Into<String>, content: impl Into<String>) -> &Message {
        self.push(Role::Agent, author.into(), content.into())
    }

    fn push(&mut self, role: Role, author: String, content: String) -> &Message {
        let seq = self.messages.len();
        self.messages.push(Message {
            role,
            author,
            content,
            seq,
        });
        &self.messages[seq]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages written by `author`, in transcript order.
    pub fn by_author<'a>(&'a self, author: &'a str) -> impl Iterator<Item = &'a Message> + 'a {
        self.messages.iter().filter(move |m| m.author == author)
    }

    /// Number of agent turns taken so far.
    pub fn agent_turns(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::Agent).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_follows_insertion_order() {
        let mut t = Transcript::new();
        t.push_user("build a page");
        t.push_agent("BusinessAnalyst", "plan");
        t.push_agent("SoftwareEngineer", "code");

        let seqs: Vec<usize> = t.messages().iter().map(|m| m.seq()).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(t.messages()[0].role(), Role::User);
        assert_eq!(t.messages()[0].author(), USER_AUTHOR);
        assert_eq!(t.last().unwrap().author(), "SoftwareEngineer");
        assert_eq!(t.agent_turns(), 2);
    }

    #[test]
    fn by_author_is_exact_match() {
        let mut t = Transcript::new();
        t.push_agent("SoftwareEngineer", "one");
        t.push_agent("softwareengineer", "two");
        t.push_agent("SoftwareEngineer", "three");

        let found: Vec<&str> = t.by_author("SoftwareEngineer").map(|m| m.content()).collect();
        assert_eq!(found, vec!["one", "three"]);
    }

    #[test]
    fn empty_transcript() {
        let t = Transcript::new();
        assert!(t.is_empty());
        assert!(t.last().is_none());
        assert_eq!(t.len(), 0);
    }
}
