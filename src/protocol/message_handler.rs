use log::{debug, warn};
use crate::network::Connection;
use super::messages::ProtocolMessage;
use super::Router;

impl Router {
    /// Serves one accepted connection: reads its first message and acts on
    /// it. Whatever happens, the connection is closed afterwards.
    pub(crate) async fn handle_connection(&self, mut conn: Connection) {
        let peer = conn.peer_addr();
        let message = match conn.receive().await {
            Ok(message) => message,
            Err(e) => {
                debug!("Dropping connection from {}: {}", peer, e);
                return;
            }
        };

        let kind = message.kind();
        let result = match message {
            ProtocolMessage::Hello(hello) => self.handle_hello(&mut conn, hello).await,
            ProtocolMessage::LsaUpdate(update) => {
                self.handle_lsa_update(update).await;
                Ok(())
            }
            ProtocolMessage::Application(packet) => {
                self.handle_application(packet).await;
                Ok(())
            }
            ProtocolMessage::Disconnect(goodbye) => {
                self.handle_disconnect(goodbye).await;
                Ok(())
            }
            ProtocolMessage::Accept(_) | ProtocolMessage::Reject(_) => {
                debug!("Ignoring unsolicited {} from {}", kind, peer);
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("Error handling {} from {}: {}", kind, peer, e);
        }
    }
}
