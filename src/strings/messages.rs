//! # Messages
//!
//! Contains constant strings and format functions for user-facing replies.
//! The dispatcher's fallback and error notices deliberately stay generic;
//! fault detail belongs in the logs, never in front of the user.

pub const NOT_IMPLEMENTED: &str = "This command is not implemented.";

pub fn command_error(name: &str) -> String {
    format!("An error occurred while executing the `/{name}` command.")
}

pub const PONG_TITLE: &str = "🏓 Pong!";
pub const PONG_DESCRIPTION: &str = "Bot is online and operational.";
pub const LATENCY_UNKNOWN: &str = "unknown";

pub fn requested_by(user: &str) -> String {
    format!("Requested by {user}")
}

pub fn consent_granted(consent_type: &str) -> String {
    format!("Consent for `{consent_type}` recorded.")
}

pub fn consent_revoked(consent_type: &str) -> String {
    format!("Consent for `{consent_type}` removed.")
}

pub fn consent_status(consent_type: &str, consented: bool) -> String {
    if consented {
        format!("You have consented to `{consent_type}`.")
    } else {
        format!("You have not consented to `{consent_type}`.")
    }
}

pub fn consent_unknown_action(action: &str) -> String {
    format!("Unknown action `{action}`. Use grant, revoke, or status.")
}
