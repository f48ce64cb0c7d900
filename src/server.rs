//! Relay server
//!
//! Owns the shared registry, the routing engine, and the startup
//! banner, and runs the accept loop that spawns one session handler
//! per connection.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::handler::handle_connection;
use crate::registry::{Registry, SharedRegistry};
use crate::routing::Router;

/// Handle to the running relay
///
/// Cheap to clone; every clone shares the same registry. The operator
/// console and the session handlers all act through this handle.
#[derive(Debug, Clone)]
pub struct Relay {
    registry: SharedRegistry,
    router: Router,
    banner: Arc<str>,
}

impl Relay {
    /// Create a relay with the given startup banner (may be empty).
    pub fn new(banner: &str) -> Self {
        let registry = Registry::shared();
        let router = Router::new(registry.clone());
        Self {
            registry,
            router,
            banner: Arc::from(banner),
        }
    }

    /// The shared connection registry.
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// The routing engine.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Banner embedded as `header` in every greeting handshake.
    pub fn banner(&self) -> &str {
        &self.banner
    }

    /// Broadcast a server-originated message to every session.
    pub async fn server_broadcast(&self, text: &str) {
        self.router.server_broadcast(text).await;
    }

    /// Kick a session by display name; false when no such session.
    pub async fn kick(&self, name: &str) -> bool {
        self.router.kick(name).await
    }

    /// Accept connections forever, one handler task per connection.
    ///
    /// A failed accept is logged and the loop continues; a failure in
    /// one handler never affects the others.
    pub async fn run(self, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!("new connection from {}", addr);
                    let relay = self.clone();

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, relay).await {
                            error!("connection handler error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("failed to accept connection: {}", e);
                }
            }
        }
    }
}
