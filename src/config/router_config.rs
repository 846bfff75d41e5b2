use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::RouterId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Simulated IP of this router.
    pub router_id: RouterId,
    pub process_ip: String,
    /// 0 lets the OS pick a port when the listener binds.
    pub process_port: u16,
    /// Weight given to links accepted from inbound requests.
    pub default_link_weight: u32,
    pub io_timeout_secs: u64,
    /// How long an initiator waits for a HELLO reply. The peer may be waiting
    /// on its operator, so this is much longer than `io_timeout_secs`.
    pub handshake_timeout_secs: u64,
    pub max_frame_bytes: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            router_id: String::new(),
            process_ip: "127.0.0.1".to_string(),
            process_port: 0,
            default_link_weight: 1,
            io_timeout_secs: 5,
            handshake_timeout_secs: 120,
            max_frame_bytes: 1024 * 1024,
        }
    }
}

impl RouterConfig {
    pub fn new(router_id: impl Into<RouterId>) -> Self {
        Self {
            router_id: router_id.into(),
            ..Self::default()
        }
    }

    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RouterConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.router_id.trim().is_empty() {
            anyhow::bail!("router_id (simulated IP) must be set");
        }
        if self.router_id.contains(char::is_whitespace) {
            anyhow::bail!("router_id {:?} must not contain whitespace", self.router_id);
        }
        if self.process_ip.trim().is_empty() {
            anyhow::bail!("process_ip must not be empty");
        }
        if self.io_timeout_secs == 0 || self.handshake_timeout_secs == 0 {
            anyhow::bail!("timeouts must be at least one second");
        }
        if self.max_frame_bytes == 0 {
            anyhow::bail!("max_frame_bytes must be positive");
        }
        Ok(())
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }
}
