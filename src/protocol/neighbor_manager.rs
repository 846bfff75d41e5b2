use log::{debug, info, warn};
use crate::error::{Result, RouterError};
use crate::network::Connection;
use super::messages::{DisconnectMessage, HelloMessage, ProcessAddress, ProtocolMessage, RejectMessage};
use super::neighbor::{Link, Neighbor, NeighborState};
use super::types::Notice;
use super::Router;

impl Router {
    /// Claims a port and asks the router at `host:port` to accept a link.
    /// Both ends hold the link in INIT once this returns.
    pub async fn attach(&self, host: &str, port: u16, neighbor_id: &str, weight: u32) -> Result<usize> {
        if neighbor_id == self.id() {
            return Err(RouterError::SelfAttach);
        }
        self.ensure_listening().await?;

        let slot = self.shared.ports.lock().await.reserve(neighbor_id)?;
        let addr = ProcessAddress::new(host, port);

        match self.exchange_hello(&addr, neighbor_id).await {
            Ok(_) => {
                let mut ports = self.shared.ports.lock().await;
                if let Some(link) = ports.find_mut(neighbor_id) {
                    // The peer's own attach reached us first and took the slot.
                    link.weight = weight;
                    debug!("{} already attached on port {} by its own request", neighbor_id, link.port);
                    return Ok(link.port);
                }
                ports.commit(Link {
                    port: slot,
                    owner: self.shared.id.clone(),
                    neighbor: Neighbor::new(neighbor_id.to_string(), addr),
                    weight,
                });
                drop(ports);
                info!("Attached to {} on port {} (weight {})", neighbor_id, slot, weight);
                self.notify(Notice::Attached {
                    neighbor: neighbor_id.to_string(),
                    port: slot,
                });
                Ok(slot)
            }
            Err(e) => {
                let mut ports = self.shared.ports.lock().await;
                if let Some(link) = ports.find_mut(neighbor_id) {
                    link.weight = weight;
                    debug!("Own request to {} failed ({}), its request attached us on port {}", neighbor_id, e, link.port);
                    return Ok(link.port);
                }
                ports.cancel(slot);
                Err(e)
            }
        }
    }

    /// Attaches and immediately brings the new adjacency up.
    pub async fn connect(&self, host: &str, port: u16, neighbor_id: &str, weight: u32) -> Result<usize> {
        let slot = self.attach(host, port, neighbor_id, weight).await?;
        let addr = ProcessAddress::new(host, port);
        self.exchange_hello(&addr, neighbor_id).await?;
        if self.mark_two_way(neighbor_id).await == Some(true) {
            self.adjacency_up(neighbor_id).await;
        }
        Ok(slot)
    }

    /// Sends HELLO over every attached link and promotes the ones that
    /// answer. Returns how many adjacencies came up.
    pub async fn start(&self) -> Result<usize> {
        self.ensure_listening().await?;
        let links = self.ports().await;
        let mut promoted = 0;

        for link in links {
            let neighbor = &link.neighbor;
            match self.exchange_hello(&neighbor.process_addr, &neighbor.router_id).await {
                Ok(_) => {
                    if self.mark_two_way(&neighbor.router_id).await == Some(true) {
                        self.adjacency_up(&neighbor.router_id).await;
                        promoted += 1;
                    }
                }
                Err(e) => warn!("HELLO to {} on port {} failed: {}", neighbor.router_id, link.port, e),
            }
        }

        Ok(promoted)
    }

    /// Removes the link on `port`, tells the neighbor, and advertises the
    /// change.
    pub async fn disconnect(&self, port: usize) -> Result<Link> {
        let link = {
            let mut ports = self.shared.ports.lock().await;
            let link = ports.remove(port)?;
            self.shared.lsdb.write().await.remove_link(&link.neighbor.router_id);
            link
        };

        info!("Disconnected {} from port {}", link.neighbor.router_id, port);
        self.notify(Notice::Disconnected {
            neighbor: link.neighbor.router_id.clone(),
            port,
        });

        let goodbye = ProtocolMessage::Disconnect(DisconnectMessage {
            router_id: self.shared.id.clone(),
        });
        if let Err(e) = self.send_once(&link.neighbor.process_addr, &goodbye).await {
            warn!("Could not tell {} about the disconnect: {}", link.neighbor.router_id, e);
        }

        self.flood_own_lsa(None).await;
        Ok(link)
    }

    /// Changes the weight of the link on `port`. Advertised right away when
    /// the adjacency is up; otherwise it takes effect once it comes up.
    pub async fn update_weight(&self, port: usize, weight: u32) -> Result<()> {
        let changed = {
            let mut ports = self.shared.ports.lock().await;
            let link = ports.get_mut(port)?;
            link.weight = weight;
            if link.neighbor.is_two_way() {
                self.shared.lsdb.write().await.update_link(link.describe())
            } else {
                false
            }
        };

        info!("Port {} weight set to {}", port, weight);
        if changed {
            self.flood_own_lsa(None).await;
        }
        Ok(())
    }

    /// Answers an inbound HELLO with exactly one ACCEPT or REJECT.
    pub(crate) async fn handle_hello(&self, conn: &mut Connection, hello: HelloMessage) -> Result<()> {
        debug!("← HELLO from {} ({})", hello.router_id, hello.process_addr);

        if hello.router_id == self.shared.id {
            warn!("Rejecting HELLO that claims to come from this router");
            return self.reply_reject(conn).await;
        }

        if let Some(dst) = hello.dst.as_deref() {
            if dst != self.shared.id {
                warn!("Rejecting HELLO from {} addressed to {}", hello.router_id, dst);
                return self.reply_reject(conn).await;
            }
        }

        if let Some(promoted) = self.mark_two_way(&hello.router_id).await {
            conn.send(&ProtocolMessage::Accept(self.hello(Some(hello.router_id.as_str())))).await?;
            if promoted {
                self.adjacency_up(&hello.router_id).await;
            }
            return Ok(());
        }

        // Both ends attaching to each other at once: the lower router id keeps
        // its own request and the higher one answers the inbound request.
        let outbound_pending = self.shared.ports.lock().await.reserved_for(&hello.router_id).is_some();
        if outbound_pending && self.shared.id < hello.router_id {
            info!("Crossed attach with {}, keeping our own request", hello.router_id);
            return self.reply_reject(conn).await;
        }

        info!("Received HELLO from unknown router {}, asking for approval", hello.router_id);
        if !self.shared.approvals.request(hello.clone()).await {
            info!("Request from {} rejected by operator", hello.router_id);
            return self.reply_reject(conn).await;
        }

        let reserved = self.shared.ports.lock().await.claim(&hello.router_id);
        let slot = match reserved {
            Ok(slot) => slot,
            Err(e) => {
                warn!("Cannot accept {}: {}", hello.router_id, e);
                return self.reply_reject(conn).await;
            }
        };

        // A follow-up HELLO from the initiator must already find the link.
        self.shared.ports.lock().await.commit(Link {
            port: slot,
            owner: self.shared.id.clone(),
            neighbor: Neighbor::new(hello.router_id.clone(), hello.process_addr.clone()),
            weight: self.shared.default_link_weight,
        });

        if let Err(e) = conn.send(&ProtocolMessage::Accept(self.hello(Some(hello.router_id.as_str())))).await {
            let mut ports = self.shared.ports.lock().await;
            if ports.get(slot).is_ok_and(|link| link.neighbor.router_id == hello.router_id) {
                let _ = ports.remove(slot);
            }
            return Err(e);
        }

        info!("Accepted {} on port {}", hello.router_id, slot);
        self.notify(Notice::Attached {
            neighbor: hello.router_id,
            port: slot,
        });
        Ok(())
    }

    pub(crate) async fn handle_disconnect(&self, message: DisconnectMessage) {
        let removed = {
            let mut ports = self.shared.ports.lock().await;
            let port = match ports.find(&message.router_id) {
                Some(link) => link.port,
                None => {
                    debug!("DISCONNECT from {} which holds no link", message.router_id);
                    return;
                }
            };
            self.shared.lsdb.write().await.remove_link(&message.router_id);
            ports.remove(port).ok()
        };

        if let Some(link) = removed {
            info!("{} disconnected from port {}", link.neighbor.router_id, link.port);
            self.notify(Notice::Disconnected {
                neighbor: link.neighbor.router_id,
                port: link.port,
            });
            self.flood_own_lsa(None).await;
        }
    }

    /// Sends a HELLO and waits for the answer. The peer may be waiting on
    /// its operator, hence the long timeout.
    async fn exchange_hello(&self, addr: &ProcessAddress, neighbor_id: &str) -> Result<HelloMessage> {
        let mut conn = Connection::dial(addr, self.shared.transport).await?;
        debug!("→ HELLO to {} at {}", neighbor_id, addr);
        conn.send(&ProtocolMessage::Hello(self.hello(Some(neighbor_id)))).await?;

        match conn.receive_within(self.shared.handshake_timeout).await? {
            ProtocolMessage::Accept(reply) if reply.router_id == neighbor_id => Ok(reply),
            ProtocolMessage::Accept(reply) => Err(RouterError::IdentityMismatch {
                expected: neighbor_id.to_string(),
                got: reply.router_id,
            }),
            ProtocolMessage::Reject(_) => Err(RouterError::Rejected(neighbor_id.to_string())),
            other => Err(RouterError::UnexpectedMessage {
                expected: "ACCEPT",
                got: other.kind(),
            }),
        }
    }

    /// Promotes the link to `neighbor_id` and records it in the own LSA.
    /// `None` when there is no such link, otherwise whether it changed.
    async fn mark_two_way(&self, neighbor_id: &str) -> Option<bool> {
        let mut ports = self.shared.ports.lock().await;
        let link = ports.find_mut(neighbor_id)?;
        if !link.neighbor.promote() {
            return Some(false);
        }

        self.shared.lsdb.write().await.update_link(link.describe());
        info!("set {} state to {}", neighbor_id, NeighborState::TwoWay);
        self.notify(Notice::StateChanged {
            neighbor: neighbor_id.to_string(),
            state: NeighborState::TwoWay,
        });
        Some(true)
    }

    async fn reply_reject(&self, conn: &mut Connection) -> Result<()> {
        conn.send(&ProtocolMessage::Reject(RejectMessage {
            router_id: self.shared.id.clone(),
        }))
        .await
    }

    pub(crate) async fn send_once(&self, addr: &ProcessAddress, message: &ProtocolMessage) -> Result<()> {
        let mut conn = Connection::dial(addr, self.shared.transport).await?;
        conn.send(message).await
    }
}
