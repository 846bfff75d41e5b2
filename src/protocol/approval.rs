//! Hands inbound neighbor requests to the single task allowed to talk to the
//! operator.
//!
//! Connection handlers never read the console. A handler that needs a yes/no
//! submits an [`ApprovalRequest`] and awaits its decision; the console task
//! drains the [`ApprovalQueue`] in submission order and resolves each one.

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;
use super::messages::HelloMessage;

#[derive(Debug)]
pub struct ApprovalRequest {
    pub id: Uuid,
    pub hello: HelloMessage,
    pub received_at: DateTime<Utc>,
    responder: oneshot::Sender<bool>,
}

impl ApprovalRequest {
    /// How long the request has been waiting on the operator.
    pub fn waited(&self) -> TimeDelta {
        Utc::now().signed_duration_since(self.received_at)
    }

    /// Wakes the waiting handler with the operator's answer.
    pub fn resolve(self, accept: bool) {
        info!(
            "{} request from {} after {} ms",
            if accept { "Accepted" } else { "Rejected" },
            self.hello.router_id,
            self.waited().num_milliseconds()
        );
        if self.responder.send(accept).is_err() {
            debug!("Approval {} for {} resolved after its handler gave up", self.id, self.hello.router_id);
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApprovalHandle {
    tx: mpsc::UnboundedSender<ApprovalRequest>,
}

/// Decision side of a submitted request.
#[derive(Debug)]
pub struct PendingApproval {
    pub id: Uuid,
    rx: oneshot::Receiver<bool>,
}

impl PendingApproval {
    /// Waits for the operator. A request nobody can answer counts as rejected.
    pub async fn decision(self) -> bool {
        match self.rx.await {
            Ok(accept) => accept,
            Err(_) => {
                warn!("Approval {} dropped without an answer, rejecting", self.id);
                false
            }
        }
    }
}

impl ApprovalHandle {
    /// Enqueues a request. Enqueueing is synchronous, so requests submitted
    /// one after the other are prompted in that order.
    pub fn submit(&self, hello: HelloMessage) -> PendingApproval {
        let (responder, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        let request = ApprovalRequest {
            id,
            hello,
            received_at: Utc::now(),
            responder,
        };

        if let Err(e) = self.tx.send(request) {
            warn!("No console to approve request from {}", e.0.hello.router_id);
        }

        PendingApproval { id, rx }
    }

    pub async fn request(&self, hello: HelloMessage) -> bool {
        self.submit(hello).decision().await
    }
}

#[derive(Debug)]
pub struct ApprovalQueue {
    rx: mpsc::UnboundedReceiver<ApprovalRequest>,
}

impl ApprovalQueue {
    pub async fn next(&mut self) -> Option<ApprovalRequest> {
        self.rx.recv().await
    }

    pub fn try_next(&mut self) -> Option<ApprovalRequest> {
        self.rx.try_recv().ok()
    }
}

pub fn channel() -> (ApprovalHandle, ApprovalQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ApprovalHandle { tx }, ApprovalQueue { rx })
}
