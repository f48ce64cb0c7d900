//! Per-connection session handler
//!
//! Drives one connection through its lifecycle: register in the
//! registry, exchange the handshake, then relay envelopes through the
//! routing engine until the channel ends. Whatever goes wrong here
//! stays local to this one session.

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::RelayError;
use crate::message::{Envelope, Handshake};
use crate::server::Relay;
use crate::session::Outbound;
use crate::types::SessionId;

/// Outbound queue depth per session
const OUTBOUND_BUFFER: usize = 32;

/// Handle a freshly accepted connection until it closes.
///
/// Registration and final removal both happen here, on every exit
/// path. The leave notice is only sent when this call actually removed
/// a named session, so a concurrent kick (which removes the session
/// itself) never produces a second one.
pub async fn handle_connection(stream: TcpStream, relay: Relay) -> Result<(), RelayError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    debug!("handling connection from {}", peer_addr);

    let (mut reader, writer) = stream.into_split();
    let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);

    // Connecting: register first so the id is assigned at accept time.
    let (id, users_online) = {
        let mut registry = relay.registry().lock().unwrap();
        let id = registry.insert(tx);
        (id, registry.named_count())
    };

    let result = run_session(&mut reader, writer, rx, id, users_online, &relay).await;

    // Closed: idempotent removal; the session may already be gone if
    // the operator kicked it.
    let removed = relay.registry().lock().unwrap().remove(id);
    if let Some(session) = removed {
        if let Some(name) = session.name {
            info!("{} has disconnected", name);
            relay
                .router()
                .broadcast(Envelope::left_notice(&name), Some(id))
                .await;
        }
    }

    result
}

/// Handshake, then the active read loop.
async fn run_session(
    reader: &mut OwnedReadHalf,
    mut writer: OwnedWriteHalf,
    rx: mpsc::Receiver<Outbound>,
    id: SessionId,
    users_online: usize,
    relay: &Relay,
) -> Result<(), RelayError> {
    // Handshaking: greet, then wait for the return leg with the name.
    let greeting = Handshake::greeting(id, users_online, relay.banner());
    codec::write_frame(&mut writer, &greeting).await?;

    let returned: Handshake = codec::read_frame(reader)
        .await?
        .ok_or(RelayError::HandshakeEof)?;

    let name = returned.name.trim().to_string();
    let name_result = if name.is_empty() {
        Err(RelayError::NameTaken(name.clone()))
    } else {
        relay.registry().lock().unwrap().set_name(id, &name)
    };

    if name_result.is_err() {
        warn!("session {} rejected: name '{}' not available", id, name);
        codec::write_frame(&mut writer, &Envelope::name_error(&name)).await?;
        return Ok(());
    }

    info!("{} has connected (session {})", name, id);
    relay
        .router()
        .broadcast(Envelope::joined_notice(&name), Some(id))
        .await;

    // Active: the writer task owns the write half from here on; this
    // task only reads and routes.
    spawn_writer(writer, rx);

    loop {
        match codec::read_frame::<_, Envelope>(reader).await {
            Ok(Some(mut envelope)) => {
                envelope.sender_id = Some(id);
                envelope.sender_name = name.clone();

                match envelope.to_name.as_deref() {
                    Some(to) => debug!("{} whispers to {}", name, to),
                    None => info!("{}: {}", name, envelope.text),
                }

                relay.router().route(envelope).await;
            }
            Ok(None) => break,
            Err(e) => {
                // Undecodable input closes this session only.
                warn!("closing session {} ({}): {}", id, name, e);
                break;
            }
        }
    }

    Ok(())
}

/// Drain the outbound queue onto the socket until it closes or a
/// shutdown is requested, then send FIN.
fn spawn_writer(mut writer: OwnedWriteHalf, mut rx: mpsc::Receiver<Outbound>) {
    tokio::spawn(async move {
        use tokio::io::AsyncWriteExt;

        while let Some(out) = rx.recv().await {
            match out {
                Outbound::Deliver(envelope) => {
                    if codec::write_frame(&mut writer, &envelope).await.is_err() {
                        debug!("socket write failed, ending writer task");
                        break;
                    }
                }
                Outbound::Shutdown => break,
            }
        }

        let _ = writer.shutdown().await;
    });
}
