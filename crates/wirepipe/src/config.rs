//! Relay configuration.
//!
//! The target endpoint is fixed by design (no CLI flags, no config file).
//! The struct exists so the engine takes its parameters as data instead of
//! scattered constants, and so tests can point the relay at an ephemeral
//! port.

/// Default target hostname.
pub const DEFAULT_HOST: &str = "localhost";

/// Default target port.
pub const DEFAULT_PORT: u16 = 12345;

/// Default capacity of each per-direction read buffer, in bytes.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;

/// Parameters for a single relay run.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Hostname (or IP literal) of the target endpoint.
    pub host: String,
    /// Port of the target endpoint.
    pub port: u16,
    /// Capacity of each forwarding path's reusable read buffer.
    pub read_buffer_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}
