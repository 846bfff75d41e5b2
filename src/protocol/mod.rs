pub mod approval;
pub mod forwarding;
pub mod lsa;
pub mod lsa_manager;
pub mod lsdb;
pub mod message_handler;
pub mod messages;
pub mod neighbor;
pub mod neighbor_manager;
pub mod port_table;
pub mod types;

pub use approval::{ApprovalHandle, ApprovalQueue, ApprovalRequest};
pub use lsa::{LinkDescription, Lsa};
pub use lsdb::LinkStateDatabase;
pub use messages::{HelloMessage, ProcessAddress, ProtocolMessage};
pub use neighbor::{Link, Neighbor, NeighborState};
pub use port_table::PortTable;
pub use types::{Delivery, Notice};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use log::{debug, info, warn};
use tokio::sync::{broadcast, Mutex, RwLock};
use crate::RouterId;
use crate::algorithms::ShortestPath;
use crate::config::RouterConfig;
use crate::error::{NoPath, Result, RouterError};
use crate::network::{self, ListenerHandle, TransportSettings};

const NOTICE_CAPACITY: usize = 256;

/// One simulated router. Cheap to clone; every clone drives the same state.
///
/// Locks are always taken ports first, then the database, and neither is
/// held while talking to another router.
#[derive(Debug, Clone)]
pub struct Router {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    id: RouterId,
    process_ip: String,
    process_port: AtomicU16,
    default_link_weight: u32,
    handshake_timeout: Duration,
    transport: TransportSettings,
    ports: Mutex<PortTable>,
    lsdb: RwLock<LinkStateDatabase>,
    approvals: ApprovalHandle,
    notices: broadcast::Sender<Notice>,
    listener: Mutex<Option<ListenerHandle>>,
}

impl Router {
    /// Builds a router that is not yet listening. The returned queue carries
    /// inbound neighbor requests and must be drained by whoever answers them.
    pub fn new(config: &RouterConfig) -> (Self, ApprovalQueue) {
        let (approvals, queue) = approval::channel();
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        let shared = Shared {
            id: config.router_id.clone(),
            process_ip: config.process_ip.clone(),
            process_port: AtomicU16::new(config.process_port),
            default_link_weight: config.default_link_weight,
            handshake_timeout: config.handshake_timeout(),
            transport: TransportSettings {
                io_timeout: config.io_timeout(),
                max_frame_bytes: config.max_frame_bytes,
            },
            ports: Mutex::new(PortTable::new()),
            lsdb: RwLock::new(LinkStateDatabase::new(config.router_id.clone())),
            approvals,
            notices,
            listener: Mutex::new(None),
        };

        (Self { shared: Arc::new(shared) }, queue)
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    /// Where other routers reach this one. The port is only meaningful once
    /// [`Router::bind`] has run.
    pub fn process_addr(&self) -> ProcessAddress {
        ProcessAddress::new(
            self.shared.process_ip.clone(),
            self.shared.process_port.load(Ordering::Acquire),
        )
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.shared.notices.subscribe()
    }

    /// Starts accepting connections. Binding twice returns the existing
    /// address.
    pub async fn bind(&self) -> Result<SocketAddr> {
        let mut listener = self.shared.listener.lock().await;
        if let Some(handle) = listener.as_ref() {
            return Ok(handle.local_addr());
        }

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let handle = network::serve(
            &self.shared.process_ip,
            self.shared.process_port.load(Ordering::Acquire),
            self.shared.transport,
            move |connection| {
                let shared = weak.upgrade();
                async move {
                    match shared {
                        Some(shared) => Router { shared }.handle_connection(connection).await,
                        None => debug!("Router gone, dropping connection from {}", connection.peer_addr()),
                    }
                }
            },
        )
        .await?;

        let local_addr = handle.local_addr();
        self.shared.process_port.store(local_addr.port(), Ordering::Release);
        *listener = Some(handle);

        info!("Router {} listening on {}", self.shared.id, local_addr);
        Ok(local_addr)
    }

    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.shared.listener.lock().await.as_ref().map(|h| h.local_addr())
    }

    /// Shortest path from this router to `destination`.
    pub async fn detect(&self, destination: &str) -> std::result::Result<ShortestPath, NoPath> {
        self.shared.lsdb.read().await.shortest_path(destination)
    }

    /// Ids of neighbors whose adjacency reached TWO_WAY.
    pub async fn neighbors(&self) -> Vec<RouterId> {
        self.shared
            .ports
            .lock()
            .await
            .two_way_links()
            .map(|link| link.neighbor.router_id.clone())
            .collect()
    }

    /// Snapshot of every occupied port, in port order.
    pub async fn ports(&self) -> Vec<Link> {
        self.shared.ports.lock().await.links().cloned().collect()
    }

    pub async fn database(&self) -> LinkStateDatabase {
        self.shared.lsdb.read().await.clone()
    }

    /// Tears down every link, telling each neighbor, then closes the
    /// listening socket.
    pub async fn quit(&self) {
        let ports: Vec<usize> = self.ports().await.iter().map(|link| link.port).collect();
        for port in ports {
            if let Err(e) = self.disconnect(port).await {
                warn!("Failed to disconnect port {} while quitting: {}", port, e);
            }
        }

        if let Some(handle) = self.shared.listener.lock().await.take() {
            handle.stop().await;
        }
        info!("Router {} stopped", self.shared.id);
    }

    pub(crate) async fn ensure_listening(&self) -> Result<()> {
        match self.local_addr().await {
            Some(_) => Ok(()),
            None => Err(RouterError::NotListening),
        }
    }

    pub(crate) fn notify(&self, notice: Notice) {
        // No subscribers is fine: nobody is watching.
        let _ = self.shared.notices.send(notice);
    }

    pub(crate) fn hello(&self, dst: Option<&str>) -> HelloMessage {
        HelloMessage {
            router_id: self.shared.id.clone(),
            process_addr: self.process_addr(),
            dst: dst.map(str::to_string),
        }
    }
}
