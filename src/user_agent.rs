//! User-Agent strings for fetch traffic.
//!
//! Requests identify the tool, its version and the installer command that
//! issued them, so upstream hosts can tell provisioning runs apart.

/// Command tag used when the caller does not name one.
pub(crate) const DEFAULT_COMMAND: &str = "fetch";

/// Builds the User-Agent for requests issued on behalf of `command`.
#[must_use]
pub(crate) fn user_agent_for_command(command: &str) -> String {
    let version = env!("CARGO_PKG_VERSION");
    let command = command.trim();
    let command = if command.is_empty() {
        DEFAULT_COMMAND
    } else {
        command
    };
    format!("mc-fetch/{version} ({command})")
}
