//! Operator console
//!
//! Reads lines from the server operator's stdin: `/kick <name>`
//! removes a session by display name, any other non-empty line is
//! broadcast verbatim as a server-originated message.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::server::Relay;

/// Process operator input until stdin closes.
pub async fn run(relay: Relay) {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Ok(Some(line)) = lines.next_line().await {
        dispatch(&relay, &line).await;
    }

    info!("operator console closed");
}

/// Handle one operator line.
pub async fn dispatch(relay: &Relay, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    if let Some(target) = line.strip_prefix("/kick ") {
        let target = target.trim();
        if !relay.kick(target).await {
            warn!("no client named '{}' to kick", target);
        }
    } else {
        relay.server_broadcast(line).await;
    }
}
