//! `wirepipe` -- a minimal bidirectional byte relay between process stdio
//! and a fixed TCP endpoint.
//!
//! The engine resolves the configured target, opens one TCP connection, and
//! forwards bytes in both directions (stdin -> socket, socket -> stdout)
//! byte-exact and in order, until either stream ends or a termination signal
//! arrives. Teardown then closes every handle and confirms each closure
//! before the process exits with status 0.
//!
//! The forwarded streams are protocol-agnostic: no framing, no TLS, no
//! reconnection, exactly one connection per run.

pub mod buffer;
pub mod config;
pub mod error;
pub mod net;
pub mod relay;
pub mod shutdown;
pub mod tracing_init;

pub use config::RelayConfig;
pub use error::{Error, Result};

use tokio::io::{AsyncRead, AsyncWrite};

use crate::shutdown::ShutdownCoordinator;

/// Run the relay to completion: resolve, connect, forward, tear down.
///
/// Generic over the local streams so tests can substitute in-memory pipes
/// for real stdin/stdout. Returns once every handle has confirmed closure;
/// a clean return means the process may exit with status 0 no matter which
/// trigger ended the run.
pub async fn run<I, O>(config: &RelayConfig, input: I, output: O) -> Result<()>
where
    I: AsyncRead + Unpin + Send + 'static,
    O: AsyncWrite + Unpin + Send + 'static,
{
    // Signal watchers go in first so a signal during resolve/connect is
    // still observed by the coordinator.
    let coordinator = ShutdownCoordinator::install()?;

    let addr = net::resolve_target(config).await?;
    let stream = net::connect(addr).await?;

    let paths = relay::spawn_paths(stream, input, output, config.read_buffer_size);
    coordinator.run_until_terminated(paths).await
}
