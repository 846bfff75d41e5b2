use serde::{Deserialize, Serialize};
use std::fmt;
use crate::RouterId;
use super::lsa::Lsa;

/// Real transport endpoint of a router process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessAddress {
    pub host: String,
    pub port: u16,
}

impl ProcessAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ProcessAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolMessage {
    Hello(HelloMessage),
    /// Positive answer to a HELLO, carrying the responder's own identity.
    Accept(HelloMessage),
    Reject(RejectMessage),
    LsaUpdate(LsaUpdateMessage),
    Application(ApplicationMessage),
    Disconnect(DisconnectMessage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloMessage {
    pub router_id: RouterId,
    pub process_addr: ProcessAddress,
    pub dst: Option<RouterId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectMessage {
    pub router_id: RouterId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LsaUpdateMessage {
    pub sender: RouterId,
    pub lsas: Vec<Lsa>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationMessage {
    pub src: RouterId,
    pub dst: RouterId,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectMessage {
    pub router_id: RouterId,
}

impl ProtocolMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolMessage::Hello(_) => "HELLO",
            ProtocolMessage::Accept(_) => "ACCEPT",
            ProtocolMessage::Reject(_) => "REJECT",
            ProtocolMessage::LsaUpdate(_) => "LSA_UPDATE",
            ProtocolMessage::Application(_) => "APPLICATION",
            ProtocolMessage::Disconnect(_) => "DISCONNECT",
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}
