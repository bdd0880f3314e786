use shared::{Framing, DEFAULT_PORT};
use std::time::Duration;

/// Runtime settings for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Physics tick period.
    pub tick: Duration,
    /// Minimum interval between two applied actions, server-wide.
    pub cooldown: Duration,
    /// Pause between scheduler checks in the simulation loop.
    pub idle_sleep: Duration,
    pub max_players: usize,
    pub framing: Framing,
    /// Seed for spawn placement; entropy when absent.
    pub seed: Option<u64>,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            tick: Duration::from_millis(50),
            cooldown: Duration::from_millis(100),
            idle_sleep: Duration::from_millis(5),
            max_players: 32,
            framing: Framing::LengthPrefixed,
            seed: None,
        }
    }
}
