//! Pull the implementer's HTML out of the transcript.
//!
//! Only fenced blocks opened by a line that is exactly ```` ```html ```` and
//! closed by a line that is exactly ```` ``` ```` count. Blocks are matched
//! non-greedily, so one message may carry several.

use std::sync::LazyLock;

use regex::Regex;

use crate::transcript::Transcript;

static HTML_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^```html\r?\n(.*?)\r?\n```[ \t]*\r?$").expect("static regex")
});

/// Why there is nothing to write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoContent {
    #[error("no messages from {0}")]
    NoImplementerMessages(String),
    #[error("{0} did not provide any HTML in a ```html block")]
    NoTaggedBlocks(String),
}

/// Every ```html block body in one message, in order.
pub fn html_blocks(content: &str) -> Vec<&str> {
    HTML_BLOCK
        .captures_iter(content)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Concatenate the implementer's HTML blocks, separated by newlines.
///
/// Messages from other authors are ignored even if they contain HTML.
pub fn extract_html(transcript: &Transcript, implementer: &str) -> Result<String, NoContent> {
    let mut messages = transcript.by_author(implementer).peekable();
    if messages.peek().is_none() {
        return Err(NoContent::NoImplementerMessages(implementer.to_string()));
    }

    let snippets: Vec<&str> = messages.flat_map(|m| html_blocks(m.content())).collect();
    if snippets.is_empty() {
        return Err(NoContent::NoTaggedBlocks(implementer.to_string()));
    }

    tracing::debug!(blocks = snippets.len(), "Extracted HTML blocks");
    Ok(snippets.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEV: &str = "SoftwareEngineer";

    #[test]
    fn two_blocks_joined_by_newline() {
        let mut t = Transcript::new();
        t.push_user("page please");
        t.push_agent(
            DEV,
            "Header:\n```html\n<p>A</p>\n```\nand the footer:\n```html\n<p>B</p>\n```\nDone.",
        );
        assert_eq!(extract_html(&t, DEV).unwrap(), "<p>A</p>\n<p>B</p>");
    }

    #[test]
    fn blocks_across_messages_keep_transcript_order() {
        let mut t = Transcript::new();
        t.push_agent(DEV, "```html\n<h1>one</h1>\n```");
        t.push_agent("ProductOwner", "fix it");
        t.push_agent(DEV, "```html\n<h1>two</h1>\n<p>more</p>\n```");
        assert_eq!(
            extract_html(&t, DEV).unwrap(),
            "<h1>one</h1>\n<h1>two</h1>\n<p>more</p>"
        );
    }

    #[test]
    fn other_authors_are_excluded() {
        let mut t = Transcript::new();
        t.push_agent("ProductOwner", "```html\n<p>reviewer copy</p>\n```");
        t.push_agent(DEV, "```html\n<p>real</p>\n```");
        assert_eq!(extract_html(&t, DEV).unwrap(), "<p>real</p>");
    }

    #[test]
    fn no_implementer_messages() {
        let mut t = Transcript::new();
        t.push_user("page");
        t.push_agent("BusinessAnalyst", "```html\n<p>x</p>\n```");
        assert_eq!(
            extract_html(&t, DEV),
            Err(NoContent::NoImplementerMessages(DEV.to_string()))
        );
    }

    #[test]
    fn wrong_or_missing_language_tag() {
        let mut t = Transcript::new();
        t.push_agent(DEV, "```\n<p>untagged</p>\n```");
        t.push_agent(DEV, "```HTML\n<p>upper</p>\n```");
        t.push_agent(DEV, "```html5\n<p>other</p>\n```");
        t.push_agent(DEV, "```javascript\nalert(1)\n```");
        assert_eq!(
            extract_html(&t, DEV),
            Err(NoContent::NoTaggedBlocks(DEV.to_string()))
        );
    }

    #[test]
    fn unmatched_fence_contributes_nothing() {
        let mut t = Transcript::new();
        t.push_agent(DEV, "```html\n<p>never closed</p>");
        t.push_agent(DEV, "```html\n<p>ok</p>\n```");
        assert_eq!(extract_html(&t, DEV).unwrap(), "<p>ok</p>");
    }

    #[test]
    fn fences_must_sit_on_their_own_lines() {
        assert!(html_blocks("inline ```html\n<p>x</p>\n```").is_empty());
        assert!(html_blocks("```html\n<p>x</p>\n```trailing").is_empty());
        assert_eq!(html_blocks("```html\n<p>x</p>\n```  \n"), vec!["<p>x</p>"]);
    }

    #[test]
    fn crlf_line_endings() {
        assert_eq!(html_blocks("```html\r\n<p>x</p>\r\n```\r\n"), vec!["<p>x</p>"]);
    }

    #[test]
    fn inner_fence_of_another_language_does_not_close() {
        let body = "```html\n<script>\n// ```js\n</script>\n```";
        assert_eq!(html_blocks(body), vec!["<script>\n// ```js\n</script>"]);
    }

    #[test]
    fn extraction_is_repeatable() {
        let mut t = Transcript::new();
        t.push_agent(DEV, "```html\n<p>A</p>\n```");
        let first = extract_html(&t, DEV);
        let second = extract_html(&t, DEV);
        assert_eq!(first, second);
    }
}
