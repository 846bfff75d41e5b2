use log::{debug, info, warn};
use crate::error::{NoPath, Result};
use super::messages::{ApplicationMessage, ProtocolMessage};
use super::neighbor::Neighbor;
use super::types::{Delivery, Notice};
use super::Router;

impl Router {
    /// Sends `payload` towards `destination` along the current shortest path.
    /// A missing path is reported as [`Delivery::NoPath`], not as an error.
    pub async fn send(&self, destination: &str, payload: &str) -> Result<Delivery> {
        self.notify(Notice::Sending {
            destination: destination.to_string(),
        });

        if destination == self.id() {
            self.notify(Notice::Received {
                source: self.shared.id.clone(),
                payload: payload.to_string(),
            });
            return Ok(Delivery::Local);
        }

        self.relay(ApplicationMessage {
            src: self.shared.id.clone(),
            dst: destination.to_string(),
            payload: payload.to_string(),
        })
        .await
    }

    /// First hop on the current shortest path to `destination`.
    pub async fn next_hop(&self, destination: &str) -> std::result::Result<Neighbor, NoPath> {
        let path = self.shared.lsdb.read().await.shortest_path(destination)?;
        let hop = path.next_hop().ok_or(NoPath::Unreachable)?;

        // The database can briefly list a neighbor whose link is already gone.
        self.shared
            .ports
            .lock()
            .await
            .find(hop)
            .map(|link| link.neighbor.clone())
            .ok_or(NoPath::Unreachable)
    }

    pub(crate) async fn handle_application(&self, message: ApplicationMessage) {
        if message.dst == self.shared.id {
            info!("← Message from {} delivered", message.src);
            self.notify(Notice::Received {
                source: message.src,
                payload: message.payload,
            });
            return;
        }

        self.notify(Notice::Forwarding {
            source: message.src.clone(),
            destination: message.dst.clone(),
        });
        let (src, dst) = (message.src.clone(), message.dst.clone());
        if let Err(e) = self.relay(message).await {
            warn!("Failed to forward packet from {} to {}: {}", src, dst, e);
        }
    }

    async fn relay(&self, message: ApplicationMessage) -> Result<Delivery> {
        let next = match self.next_hop(&message.dst).await {
            Ok(next) => next,
            Err(no_path) => {
                debug!("No route to {}: {}", message.dst, no_path);
                self.notify(Notice::NoPath {
                    destination: message.dst,
                });
                return Ok(Delivery::NoPath(no_path));
            }
        };

        debug!("→ Packet for {} via {}", message.dst, next.router_id);
        self.send_once(&next.process_addr, &ProtocolMessage::Application(message))
            .await?;
        Ok(Delivery::Sent {
            next_hop: next.router_id,
        })
    }
}
