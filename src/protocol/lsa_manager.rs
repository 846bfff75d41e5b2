//! Flooding of link state advertisements.
//!
//! Updates go out on fresh connections to every TWO_WAY neighbor at once.
//! A neighbor that cannot be reached is logged and skipped; the next change
//! or database exchange will catch it up.

use futures::future::join_all;
use log::{debug, info, warn};
use crate::RouterId;
use super::lsa::Lsa;
use super::messages::{LsaUpdateMessage, ProcessAddress, ProtocolMessage};
use super::Router;

impl Router {
    /// Called once per adjacency when it reaches TWO_WAY: the new neighbor
    /// gets the whole database, everyone else gets the changed own LSA.
    pub(crate) async fn adjacency_up(&self, neighbor_id: &str) {
        let (lsas, own) = {
            let lsdb = self.shared.lsdb.read().await;
            (lsdb.lsas(), lsdb.own_lsa().clone())
        };

        let target = self
            .shared
            .ports
            .lock()
            .await
            .find(neighbor_id)
            .map(|link| link.neighbor.process_addr.clone());

        if let Some(addr) = target {
            debug!("→ Database sync to {} ({} LSAs)", neighbor_id, lsas.len());
            if let Err(e) = self.send_lsas(&addr, lsas).await {
                warn!("Database sync to {} failed: {}", neighbor_id, e);
            }
        }

        self.flood(vec![own], Some(neighbor_id)).await;
    }

    pub(crate) async fn flood_own_lsa(&self, except: Option<&str>) {
        let own = self.shared.lsdb.read().await.own_lsa().clone();
        self.flood(vec![own], except).await;
    }

    /// Sends `lsas` to every TWO_WAY neighbor other than `except`.
    pub(crate) async fn flood(&self, lsas: Vec<Lsa>, except: Option<&str>) {
        if lsas.is_empty() {
            return;
        }

        let targets: Vec<(RouterId, ProcessAddress)> = self
            .shared
            .ports
            .lock()
            .await
            .two_way_links()
            .filter(|link| Some(link.neighbor.router_id.as_str()) != except)
            .map(|link| (link.neighbor.router_id.clone(), link.neighbor.process_addr.clone()))
            .collect();

        if targets.is_empty() {
            return;
        }

        debug!("→ Flooding {} LSA(s) to {} neighbor(s)", lsas.len(), targets.len());
        let sends = targets.iter().map(|(id, addr)| {
            let lsas = lsas.clone();
            async move { (id, self.send_lsas(addr, lsas).await) }
        });

        for (id, result) in join_all(sends).await {
            if let Err(e) = result {
                warn!("Failed to flood to {}: {}", id, e);
            }
        }
    }

    /// Installs whatever is fresher than what we hold and passes exactly
    /// those LSAs on, never back to the sender.
    pub(crate) async fn handle_lsa_update(&self, update: LsaUpdateMessage) {
        let fresh: Vec<Lsa> = {
            let mut lsdb = self.shared.lsdb.write().await;
            update
                .lsas
                .into_iter()
                .filter(|lsa| lsdb.install(lsa.clone()))
                .collect()
        };

        if fresh.is_empty() {
            debug!("← LSA_UPDATE from {} carried nothing new", update.sender);
            return;
        }

        info!(
            "Installed {} LSA(s) from {}: {}",
            fresh.len(),
            update.sender,
            fresh.iter().map(|lsa| lsa.link_state_id.as_str()).collect::<Vec<_>>().join(", ")
        );
        self.flood(fresh, Some(update.sender.as_str())).await;
    }

    async fn send_lsas(&self, addr: &ProcessAddress, lsas: Vec<Lsa>) -> crate::error::Result<()> {
        let update = ProtocolMessage::LsaUpdate(LsaUpdateMessage {
            sender: self.shared.id.clone(),
            lsas,
        });
        self.send_once(addr, &update).await
    }
}
