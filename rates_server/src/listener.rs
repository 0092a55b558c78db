use crate::dispatcher::BroadcastServer;
use crate::session::run_session;
use log::{debug, error, info};
use rates_common::Result;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;

/// TCP listener that accepts client connections and hands each to its own session.
///
/// A failed accept or a failed session is logged and affects only that client; the
/// loop keeps serving everyone else.
pub struct CommandListener {
    /// The underlying TCP listening socket.
    pub(crate) socket: TcpListener,
}

impl CommandListener {
    /// Bind a new listener to the provided `bind_addr` (e.g., `0.0.0.0:8080`).
    pub fn new(bind_addr: &str) -> Result<Self> {
        let socket = TcpListener::bind(bind_addr)?;
        Ok(Self { socket })
    }

    /// Address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Blocking accept loop. Spawns one session thread per connection.
    pub fn accept_loop(self, server: Arc<BroadcastServer>) -> Result<()> {
        info!("Rates server is listening on {}", self.socket.local_addr()?);

        for stream in self.socket.incoming() {
            match stream {
                Ok(stream) => {
                    debug!("Accepted connection from {:?}", stream.peer_addr().ok());
                    let server = Arc::clone(&server);
                    let spawned = thread::Builder::new()
                        .name(String::from("session"))
                        .spawn(move || {
                            if let Err(e) = run_session(stream, server) {
                                debug!("Session ended with error: {}", e);
                            }
                        });
                    if let Err(e) = spawned {
                        error!("Failed to start session thread: {}", e);
                    }
                }
                Err(e) => error!("TCP connection error: {}", e),
            }
        }
        Ok(())
    }
}
