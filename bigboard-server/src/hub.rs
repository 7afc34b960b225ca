//! Broadcast hub
//!
//! Holds the set of live viewer connections and fans every board snapshot
//! out to all of them.
//!
//! # Concurrency
//!
//! The connection set sits behind one exclusive lock that is only held to
//! register, remove, or copy the set. A broadcast copies the set, releases
//! the lock, then sends, so a slow viewer never blocks new connections.
//! Failed sends are collected and removed after the pass completes.
//!
//! # Connection lifecycle
//!
//! `Connecting` (transport handshake, not yet known to the hub) → `Open`
//! (registered; receives `init`, then every `update`) → `Closed` (send
//! failed or the viewer went away; removed from the set).

use bigboard_common::events::BoardEvent;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// Delivery failure on a single connection. Never leaves the hub.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("viewer channel closed")]
    ChannelClosed,

    #[error("send failed: {0}")]
    Send(String),
}

/// One viewer's outbound side
pub trait SnapshotSink: Send + Sync {
    /// Hand `event` to the viewer without waiting on the viewer
    fn deliver(&self, event: BoardEvent) -> Result<(), TransportError>;
}

/// Sink backed by an unbounded channel drained by the transport task
///
/// Events are delivered in revision order: an event older than one already
/// delivered is dropped, since it carries a board at least as stale.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<BoardEvent>,
    // held across the send so the check and the enqueue are one step
    last_revision: Mutex<u64>,
}

impl ChannelSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BoardEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            tx,
            last_revision: Mutex::new(0),
        };
        (sink, rx)
    }
}

impl SnapshotSink for ChannelSink {
    fn deliver(&self, event: BoardEvent) -> Result<(), TransportError> {
        let mut last = self
            .last_revision
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *last > event.revision {
            debug!(
                "Dropping stale {} revision {} (already at {})",
                event.kind.as_str(),
                event.revision,
                *last
            );
            return Ok(());
        }
        let revision = event.revision;
        self.tx
            .send(event)
            .map_err(|_| TransportError::ChannelClosed)?;
        *last = revision;
        Ok(())
    }
}

/// Registry of open viewer connections
///
/// Created once at process start and shared via `Arc`; [`BroadcastHub::shutdown`]
/// closes every connection at teardown.
pub struct BroadcastHub {
    connections: Mutex<HashMap<ConnectionId, Arc<dyn SnapshotSink>>>,
    revision: AtomicU64,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            revision: AtomicU64::new(0),
        }
    }

    /// Reserve the revision for a snapshot that is about to be computed
    ///
    /// Must be called before reading the state the snapshot is built from.
    pub fn next_revision(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Add a connection to the open set
    pub fn register(&self, sink: Arc<dyn SnapshotSink>) -> ConnectionId {
        let id = Uuid::new_v4();
        let count = {
            let mut connections = self.connections();
            connections.insert(id, sink);
            connections.len()
        };
        info!("Viewer {} connected ({} open)", id, count);
        id
    }

    /// Open a channel-backed connection, returning its receiving end
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (sink, receiver) = ChannelSink::channel();
        let id = self.register(Arc::new(sink));
        Subscription {
            id,
            receiver,
            _guard: ConnectionGuard {
                hub: Arc::clone(self),
                id,
            },
        }
    }

    /// Push the first snapshot to a freshly opened connection
    ///
    /// Returns `false` (and closes the connection) if it could not be delivered.
    pub fn send_init(&self, id: ConnectionId, event: BoardEvent) -> bool {
        let Some(sink) = self.connections().get(&id).cloned() else {
            debug!("Viewer {} closed before init", id);
            return false;
        };

        match sink.deliver(event) {
            Ok(()) => true,
            Err(e) => {
                warn!("Viewer {} failed on init: {}", id, e);
                self.disconnect(id);
                false
            }
        }
    }

    /// Send `event` to every open connection; returns how many accepted it
    ///
    /// Connections whose send fails are removed once the pass is complete.
    pub fn broadcast(&self, event: BoardEvent) -> usize {
        let targets: Vec<(ConnectionId, Arc<dyn SnapshotSink>)> = self
            .connections()
            .iter()
            .map(|(id, sink)| (*id, Arc::clone(sink)))
            .collect();

        let mut failed = Vec::new();
        for (id, sink) in &targets {
            if let Err(e) = sink.deliver(event.clone()) {
                warn!("Viewer {} dropped: {}", id, e);
                failed.push(*id);
            }
        }

        if !failed.is_empty() {
            let mut connections = self.connections();
            for id in &failed {
                connections.remove(id);
            }
        }

        let delivered = targets.len() - failed.len();
        debug!(
            "Broadcast {} revision {} to {} viewer(s)",
            event.kind.as_str(),
            event.revision,
            delivered
        );
        delivered
    }

    /// Remove a connection; removing an unknown or already-removed id is a no-op
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.connections().remove(&id).is_some();
        if removed {
            info!("Viewer {} disconnected", id);
        }
        removed
    }

    pub fn connection_count(&self) -> usize {
        self.connections().len()
    }

    /// Close every connection
    pub fn shutdown(&self) {
        let closed = {
            let mut connections = self.connections();
            let count = connections.len();
            connections.clear();
            count
        };
        info!("Broadcast hub shut down ({} viewer(s) closed)", closed);
    }

    fn connections(&self) -> MutexGuard<'_, HashMap<ConnectionId, Arc<dyn SnapshotSink>>> {
        // the map stays consistent even if a holder panicked
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes its connection from the hub when dropped
pub struct ConnectionGuard {
    hub: Arc<BroadcastHub>,
    id: ConnectionId,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.hub.disconnect(self.id);
    }
}

/// Receiving end of one viewer connection
///
/// Dropping it closes the connection.
pub struct Subscription {
    id: ConnectionId,
    receiver: mpsc::UnboundedReceiver<BoardEvent>,
    _guard: ConnectionGuard,
}

impl Subscription {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Next event; `None` once the hub has closed the connection
    pub async fn recv(&mut self) -> Option<BoardEvent> {
        self.receiver.recv().await
    }

    /// Next already-queued event, without waiting
    pub fn try_recv(&mut self) -> Option<BoardEvent> {
        self.receiver.try_recv().ok()
    }
}
