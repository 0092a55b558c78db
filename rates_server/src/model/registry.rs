//! Live set of connected clients and broadcast fan-out.
//!
//! A `Connection` is the server-side delivery handle of one client: a stable
//! `ConnectionId`, a log label, and the sending half of the channel drained by that
//! client's writer loop. The `ConnectionRegistry` owns one handle per registered client
//! and supports three operations:
//!
//! - `register(conn)`: make `conn` a broadcast target (idempotent per id).
//! - `unregister(id)`: drop it again. Sessions call this through a
//!   [`Registration`] guard so it runs on every exit path.
//! - `broadcast(lines)`: deliver every line, in order, to every connection registered
//!   when the call starts.
//!
//! Design notes:
//! - Membership lives behind a `Mutex`; broadcast clones the handles under the lock and
//!   sends after releasing it, so a slow broadcast never blocks register/unregister.
//! - A connection added while a broadcast is running may or may not see it.
//! - Delivery failures are isolated: everyone else still gets the full sequence. The
//!   failing connection is evicted: unregistered and, when it has a socket, shut down.
//!   Outbound queues are bounded, so a client that stops reading fails with a full
//!   queue instead of growing it without limit.
use crossbeam_channel::{Sender, TrySendError};
use log::{debug, info, warn};
use rates_common::{RatesError, Result};
use std::collections::HashMap;
use std::fmt;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lines a client may have queued before it counts as stalled.
pub const OUTBOUND_CAPACITY: usize = 1024;

/// Registry-assigned identity of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Delivery handle for one connected client.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    label: String,
    peer: Option<SocketAddr>,
    outbound: Sender<String>,
    stream: Option<Arc<TcpStream>>,
}

impl Connection {
    /// Identity used for set membership.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Human-readable name, for logs only.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Attach the client's socket so the connection can be cut off on eviction.
    pub fn with_stream(mut self, stream: TcpStream) -> Self {
        self.stream = Some(Arc::new(stream));
        self
    }

    /// Queue one line for this client without blocking.
    pub fn send(&self, line: String) -> Result<()> {
        self.outbound.try_send(line).map_err(|e| match e {
            TrySendError::Full(_) => RatesError::ChannelSend(format!(
                "{} ({}) has a full outbound queue",
                self.label, self.id
            )),
            TrySendError::Disconnected(_) => {
                RatesError::ChannelSend(format!("{} ({}) is gone", self.label, self.id))
            }
        })
    }

    /// Shut the client's socket down, ending its session.
    pub fn disconnect(&self) {
        if let Some(stream) = &self.stream {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                debug!("Shutdown of {} ({}) failed: {}", self.label, self.id, e);
            }
        }
    }
}

/// Thread-safe set of live connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, Connection>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a connection handle with a fresh id. It is not registered yet.
    pub fn connection(
        &self,
        label: impl Into<String>,
        peer: Option<SocketAddr>,
        outbound: Sender<String>,
    ) -> Connection {
        Connection {
            id: ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed)),
            label: label.into(),
            peer,
            outbound,
            stream: None,
        }
    }

    fn members(&self) -> MutexGuard<'_, HashMap<ConnectionId, Connection>> {
        // The map holds no invariants a panicking holder could break.
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add `conn` to the broadcast set. Registering the same id twice is a no-op.
    pub fn register(&self, conn: Connection) {
        let mut members = self.members();
        if members.contains_key(&conn.id) {
            debug!("{} ({}) already registered", conn.label, conn.id);
            return;
        }
        info!(
            "{} ({}) registered from {}, {} online",
            conn.label,
            conn.id,
            conn.peer.map_or_else(|| String::from("memory"), |p| p.to_string()),
            members.len() + 1
        );
        members.insert(conn.id, conn);
    }

    /// Register `conn` and return a guard that unregisters it when dropped.
    pub fn enter(self: &Arc<Self>, conn: Connection) -> Registration {
        let id = conn.id;
        self.register(conn);
        Registration {
            registry: Arc::clone(self),
            id,
        }
    }

    /// Remove the connection with `id`, if present.
    pub fn unregister(&self, id: ConnectionId) {
        let mut members = self.members();
        match members.remove(&id) {
            Some(conn) => info!("{} ({}) unregistered, {} online", conn.label, id, members.len()),
            None => debug!("{} was not registered", id),
        }
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.members().len()
    }

    /// `true` when nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.members().is_empty()
    }

    /// `true` when `id` is currently registered.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.members().contains_key(&id)
    }

    /// Send `lines`, in order, to every connection registered right now.
    ///
    /// Returns how many connections received the full sequence. Connections that did
    /// not are evicted.
    pub fn broadcast<S: AsRef<str>>(&self, lines: &[S]) -> usize {
        let snapshot: Vec<Connection> = self.members().values().cloned().collect();
        if lines.is_empty() || snapshot.is_empty() {
            return 0;
        }

        let mut delivered = 0;
        for conn in &snapshot {
            let result = lines
                .iter()
                .try_for_each(|line| conn.send(line.as_ref().to_owned()));
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Broadcast to {} ({}) failed: {}", conn.label, conn.id, e);
                    self.evict(conn);
                }
            }
        }
        debug!(
            "Broadcast {} line(s) to {}/{} connection(s)",
            lines.len(),
            delivered,
            snapshot.len()
        );
        delivered
    }

    fn evict(&self, conn: &Connection) {
        info!("Evicting {} ({})", conn.label, conn.id);
        self.unregister(conn.id);
        conn.disconnect();
    }
}

/// Keeps a connection registered for as long as it lives.
#[must_use = "dropping the registration unregisters the connection immediately"]
pub struct Registration {
    registry: Arc<ConnectionRegistry>,
    id: ConnectionId,
}

impl Registration {
    /// Id of the guarded connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}
