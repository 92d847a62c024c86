pub const HELP_REPLY: &str = "Thanks for your question! We will help you soon.";
pub const ISSUE_REPLY: &str = "Sorry to hear about your issue. We are looking into it.";
pub const DEFAULT_REPLY: &str = "Thank you for your comment!";

/// Picks the automatic reply for a comment. Rules are checked in order and
/// the first substring hit wins, so "help" beats "issue".
pub fn generate(source: &str) -> String {
    let lowered = source.to_lowercase();
    let reply = if lowered.contains("help") {
        HELP_REPLY
    } else if lowered.contains("issue") {
        ISSUE_REPLY
    } else {
        DEFAULT_REPLY
    };
    reply.to_string()
}
